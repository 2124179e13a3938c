use dioxus::prelude::*;

#[component]
pub fn Legend(swatches: Vec<(i64, String)>) -> Element {
    rsx! {
        ul { class: "odi-vis-legend",
            for (score, color) in swatches {
                li { "data-score": "{score}",
                    span { class: "swatch", style: "background-color: {color};" }
                    "{score}"
                }
            }
        }
    }
}
