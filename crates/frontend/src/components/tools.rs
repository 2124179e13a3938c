use dioxus::prelude::*;
use odi_shared::state::ALL_DATASETS;

#[component]
pub fn ToolsPanel(
    year_options: Vec<String>,
    dataset_options: Vec<String>,
    year: Option<String>,
    dataset: Option<String>,
    on_change: EventHandler<(Option<String>, Option<String>)>,
) -> Element {
    let years = year_options.join("");
    let datasets = format!(
        r#"<option value="{ALL_DATASETS}">All datasets</option>{}"#,
        dataset_options.join("")
    );

    rsx! {
        div { class: "odi-vis-tools panel",
            h3 { "Filter" }
            select {
                "aria-label": "Year",
                dangerous_inner_html: "{years}",
                onchange: {
                    let dataset = dataset.clone();
                    move |evt: Event<FormData>| {
                        on_change.call((Some(evt.value()), dataset.clone()));
                    }
                },
            }
            select {
                "aria-label": "Dataset",
                dangerous_inner_html: "{datasets}",
                onchange: move |evt: Event<FormData>| {
                    on_change.call((year.clone(), Some(evt.value())));
                },
            }
        }
    }
}
