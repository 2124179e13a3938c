use std::collections::BTreeSet;

use dioxus::prelude::*;
use odi_shared::dashboard::{Panel, PlaceStyle, View};
use wasm_bindgen::JsValue;

/// Everything the dashboard has drawn so far, as plain data for rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Screen {
    pub year_options: Vec<String>,
    pub dataset_options: Vec<String>,
    pub layer: Vec<PlaceStyle>,
    pub hidden: BTreeSet<Panel>,
    pub legend: Vec<(i64, String)>,
    pub info: Option<String>,
    pub active_trigger: Option<usize>,
    pub focused: Option<String>,
    pub place: Option<String>,
    pub query: String,
}

impl Screen {
    pub fn is_visible(&self, panel: Panel) -> bool {
        !self.hidden.contains(&panel)
    }
}

impl View for Screen {
    fn add_year_option(&mut self, markup: String) {
        self.year_options.push(markup);
    }

    fn add_dataset_option(&mut self, markup: String) {
        self.dataset_options.push(markup);
    }

    fn draw_layer(&mut self, layer: Vec<PlaceStyle>) {
        self.layer = layer;
    }

    fn hide_panel(&mut self, panel: Panel) {
        self.hidden.insert(panel);
    }

    fn paint_legend(&mut self, swatches: Vec<(i64, String)>) {
        self.legend = swatches;
    }

    fn show_info(&mut self, markup: String) {
        self.info = Some(markup);
    }

    fn clear_info(&mut self) {
        self.info = None;
    }

    fn mark_info_trigger(&mut self, active: Option<usize>) {
        self.active_trigger = active;
    }

    fn focus_place(&mut self, code: &str) {
        self.focused = Some(code.to_lowercase());
    }

    fn show_place(&mut self, markup: String) {
        self.place = Some(markup);
    }

    fn replace_url(&mut self, query: &str) {
        self.query = query.to_string();
    }
}

/// [`View`] over a signal, so every dashboard update re-renders the page.
pub struct SignalView {
    screen: Signal<Screen>,
}

impl SignalView {
    pub fn new(screen: Signal<Screen>) -> Self {
        Self { screen }
    }
}

/// `path` with `query` appended; an empty query leaves the bare path.
pub fn url_for(path: &str, query: &str) -> String {
    format!("{path}{query}")
}

fn replace_history(query: &str) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let url = url_for(&window.location().pathname()?, query);
    window
        .history()?
        .replace_state_with_url(&JsValue::NULL, "", Some(&url))
}

impl View for SignalView {
    fn add_year_option(&mut self, markup: String) {
        self.screen.write().add_year_option(markup);
    }

    fn add_dataset_option(&mut self, markup: String) {
        self.screen.write().add_dataset_option(markup);
    }

    fn draw_layer(&mut self, layer: Vec<PlaceStyle>) {
        self.screen.write().draw_layer(layer);
    }

    fn hide_panel(&mut self, panel: Panel) {
        self.screen.write().hide_panel(panel);
    }

    fn paint_legend(&mut self, swatches: Vec<(i64, String)>) {
        self.screen.write().paint_legend(swatches);
    }

    fn show_info(&mut self, markup: String) {
        self.screen.write().show_info(markup);
    }

    fn clear_info(&mut self) {
        self.screen.write().clear_info();
    }

    fn mark_info_trigger(&mut self, active: Option<usize>) {
        self.screen.write().mark_info_trigger(active);
    }

    fn focus_place(&mut self, code: &str) {
        self.screen.write().focus_place(code);
    }

    fn show_place(&mut self, markup: String) {
        self.screen.write().show_place(markup);
    }

    fn replace_url(&mut self, query: &str) {
        self.screen.write().replace_url(query);
        if let Err(e) = replace_history(query) {
            tracing::warn!(?e, "could not replace history entry");
        }
    }
}
