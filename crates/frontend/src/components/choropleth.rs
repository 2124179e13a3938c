use dioxus::prelude::*;
use odi_shared::dashboard::{PlaceStyle, Style};

use crate::projection::{MAP_HEIGHT, MAP_WIDTH};

/// Style to draw a feature with: focused when hovered or selected.
fn effective_style(place: &PlaceStyle, hovered: Option<usize>, focused: Option<&str>) -> Style {
    let is_focused = hovered == Some(place.feature)
        || (focused.is_some() && place.code.as_deref() == focused);
    if is_focused {
        place.style.focused()
    } else {
        place.style.clone()
    }
}

#[component]
pub fn ChoroplethMap(
    paths: Vec<String>,
    layer: Vec<PlaceStyle>,
    focused: Option<String>,
    on_select: EventHandler<String>,
) -> Element {
    let mut hovered = use_signal(|| None::<usize>);
    let current = *hovered.read();

    rsx! {
        div { class: "odi-vis-map",
            svg {
                view_box: "0 0 {MAP_WIDTH} {MAP_HEIGHT}",
                preserve_aspect_ratio: "xMidYMid meet",
                for place in layer.iter().filter(|p| paths.get(p.feature).is_some_and(|d| !d.is_empty())) {
                    {
                        let style = effective_style(place, current, focused.as_deref());
                        let feature = place.feature;
                        let code = place.code.clone();
                        rsx! {
                            path {
                                key: "{feature}",
                                d: "{paths[feature]}",
                                fill: "{style.fill_color}",
                                fill_opacity: "{style.fill_opacity}",
                                stroke: "{style.color}",
                                stroke_width: "{style.weight}",
                                stroke_opacity: "{style.opacity}",
                                stroke_dasharray: "{style.dash_array}",
                                onmouseenter: move |_| hovered.set(Some(feature)),
                                onmouseleave: move |_| hovered.set(None),
                                onclick: move |_| {
                                    if let Some(code) = &code {
                                        on_select.call(code.clone());
                                    }
                                },
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(feature: usize, code: Option<&str>) -> PlaceStyle {
        PlaceStyle {
            feature,
            code: code.map(str::to_string),
            style: Style {
                weight: 1.0,
                opacity: 1.0,
                color: "#2d2d2d".into(),
                dash_array: "2".into(),
                fill_opacity: 1.0,
                fill_color: "#7ab800".into(),
            },
        }
    }

    #[test]
    fn test_hovered_feature_is_focused() {
        let style = effective_style(&place(3, Some("gb")), Some(3), None);
        assert_eq!(style.weight, 1.5);
        assert!(style.dash_array.is_empty());
        assert_eq!(style.fill_color, "#7ab800");
    }

    #[test]
    fn test_selected_place_is_focused() {
        let style = effective_style(&place(0, Some("gb")), None, Some("gb"));
        assert_eq!(style.weight, 1.5);
    }

    #[test]
    fn test_other_features_keep_base_style() {
        let style = effective_style(&place(0, Some("fr")), Some(1), Some("gb"));
        assert_eq!(style.weight, 1.0);
        assert_eq!(style.dash_array, "2");

        // features without a code never match a selection
        let style = effective_style(&place(2, None), None, Some("gb"));
        assert_eq!(style.weight, 1.0);
    }
}
