use dioxus::prelude::*;

/// Link to the current view, with a copy button.
#[component]
pub fn SharePanel(url: String) -> Element {
    rsx! {
        div { class: "odi-vis-share panel",
            h3 { "Share" }
            div { class: "share-url",
                input {
                    r#type: "text",
                    readonly: true,
                    value: "{url}",
                }
                button {
                    class: "secondary",
                    onclick: {
                        let url = url.clone();
                        move |_| {
                            let url = url.clone();
                            wasm_bindgen_futures::spawn_local(async move {
                                if let Some(window) = web_sys::window() {
                                    let clipboard = window.navigator().clipboard();
                                    let _ = wasm_bindgen_futures::JsFuture::from(
                                        clipboard.write_text(&url)
                                    ).await;
                                }
                            });
                        }
                    },
                    "Copy"
                }
            }
        }
    }
}
