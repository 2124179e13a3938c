use dioxus::prelude::*;
use odi_shared::config::InfoTrigger;

/// Info triggers as an accordion: at most one is active, and its rendered
/// box sits under the trigger list.
#[component]
pub fn InfoPanel(
    class: String,
    triggers: Vec<(usize, InfoTrigger)>,
    active: Option<usize>,
    info: Option<String>,
    on_toggle: EventHandler<usize>,
    on_close: EventHandler<()>,
) -> Element {
    let shows_info = active.is_some_and(|a| triggers.iter().any(|(i, _)| *i == a));

    rsx! {
        div { class: "{class} panel",
            for (index, trigger) in triggers {
                button {
                    key: "{index}",
                    class: if active == Some(index) { "odi-vis-info-trigger active" } else { "odi-vis-info-trigger" },
                    onclick: move |_| on_toggle.call(index),
                    "{trigger.title}"
                }
            }
            if shows_info {
                if let Some(markup) = info {
                    div { class: "odi-vis-info",
                        button {
                            class: "secondary odi-vis-info-close",
                            onclick: move |_| on_close.call(()),
                            "Close"
                        }
                        div { dangerous_inner_html: "{markup}" }
                    }
                }
            }
        }
    }
}
