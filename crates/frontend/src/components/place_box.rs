use dioxus::prelude::*;

#[component]
pub fn PlaceBox(markup: Option<String>) -> Element {
    let Some(markup) = markup else {
        return rsx! {};
    };
    rsx! {
        div { class: "odi-vis-place panel", dangerous_inner_html: "{markup}" }
    }
}
