//! The dashboard controller.
//!
//! [`Dashboard`] owns the UI state and the data store, reacts to bus
//! messages, and drives an injected [`View`]. It never touches a DOM or a map
//! library itself.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use crate::bus::{Bus, Message, Outbox, Payload, Publish, Topic};
use crate::color::{parse_score, ColorScale, Rgb, NEUTRAL, OUTLINE};
use crate::config::{DashboardConfig, InfoTrigger};
use crate::models::{feature_code, Dataset, Meta};
use crate::state::{StateStore, UiState};
use crate::store::DataStore;
use crate::template::{self, DatasetOption, EmbedCode, InfoBox, PlaceBox, Templates, YearOption};

/// Panels that can be hidden through state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Panel {
    Tools,
    Share,
    Embed,
    Help,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Style {
    pub weight: f32,
    pub opacity: f32,
    pub color: String,
    pub dash_array: String,
    pub fill_opacity: f32,
    pub fill_color: String,
}

impl Style {
    fn base(fill: Rgb) -> Self {
        Self {
            weight: 1.0,
            opacity: 1.0,
            color: OUTLINE.hex(),
            dash_array: "2".to_string(),
            fill_opacity: 1.0,
            fill_color: fill.hex(),
        }
    }

    /// Hover highlight laid over a place's base style.
    pub fn focused(&self) -> Self {
        Self {
            weight: 1.5,
            color: OUTLINE.hex(),
            dash_array: String::new(),
            ..self.clone()
        }
    }
}

/// Style for one geography feature, by its position in the collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceStyle {
    pub feature: usize,
    pub code: Option<String>,
    pub style: Style,
}

/// Everything the dashboard asks of the page it runs in.
pub trait View {
    fn add_year_option(&mut self, markup: String);
    fn add_dataset_option(&mut self, markup: String);
    /// Replace the whole choropleth layer.
    fn draw_layer(&mut self, layer: Vec<PlaceStyle>);
    fn hide_panel(&mut self, panel: Panel);
    fn paint_legend(&mut self, swatches: Vec<(i64, String)>);
    fn show_info(&mut self, markup: String);
    fn clear_info(&mut self);
    /// Mark which info trigger is active, if any.
    fn mark_info_trigger(&mut self, active: Option<usize>);
    fn focus_place(&mut self, code: &str);
    fn show_place(&mut self, markup: String);
    /// Replace the current history entry's query string.
    fn replace_url(&mut self, query: &str);
}

pub struct Dashboard<V, T> {
    config: DashboardConfig,
    state: StateStore,
    data: DataStore,
    scale: ColorScale,
    active_info: Option<usize>,
    view: V,
    templates: T,
}

impl<V: View, T: Templates> Dashboard<V, T> {
    /// Seed state from `initial_query`, the query string the page loaded with.
    pub fn new(config: DashboardConfig, initial_query: &str, view: V, templates: T) -> Self {
        let state = StateStore::new(config.defaults(), initial_query);
        Self {
            config,
            state,
            data: DataStore::new(),
            scale: ColorScale::default(),
            active_info: None,
            view,
            templates,
        }
    }

    pub fn state(&self) -> &UiState {
        self.state.current()
    }

    pub fn data(&self) -> &DataStore {
        &self.data
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn info_triggers(&self) -> &[InfoTrigger] {
        &self.config.info_triggers
    }

    /// Subscribe a shared dashboard to every topic it handles.
    pub fn attach(dashboard: &Rc<RefCell<Self>>, bus: &mut impl Bus)
    where
        V: 'static,
        T: 'static,
    {
        let topics = [
            Topic::Meta,
            Topic::Summary,
            Topic::Places,
            Topic::Datasets,
            Topic::Entries,
            Topic::Init,
            Topic::ToolChange,
            Topic::StateChange,
        ];
        for topic in topics {
            let dashboard = Rc::clone(dashboard);
            bus.subscribe(
                topic,
                Box::new(move |message: &Message, out: &mut Outbox| {
                    dashboard.borrow_mut().handle(message, out)
                }),
            );
        }
    }

    /// Paint the legend, record the initial URL state and announce it.
    pub fn init(&mut self, out: &mut dyn Publish) {
        self.paint_legend();
        let query = self.state().as_query_string().to_string();
        self.view.replace_url(&query);
        out.publish(Topic::Init, Payload::State(self.state().clone()));
    }

    pub fn handle(&mut self, message: &Message, out: &mut dyn Publish) {
        match (&message.topic, &message.payload) {
            (Topic::Meta, Payload::Meta(meta)) => self.on_meta(meta.clone()),
            (Topic::Summary, Payload::Summary(rows)) => self.data.summary = Some(rows.clone()),
            (Topic::Places, Payload::Places(payload)) => {
                self.data.set_places(payload.clone());
                self.redraw();
                if let Some(code) = self.state().map.place.clone() {
                    self.show_place_box(&code);
                }
            }
            (Topic::Datasets, Payload::Datasets(datasets)) => self.on_datasets(datasets.clone()),
            (Topic::Entries, Payload::Entries(entries)) => {
                self.data.entries = Some(entries.clone())
            }
            (Topic::Init, Payload::State(state)) => self.apply_panel_visibility(state),
            (Topic::ToolChange, Payload::State(state)) => {
                let next = self.state.apply_tool_change(Some(state.to_partial())).clone();
                out.publish(Topic::StateChange, Payload::State(next));
            }
            (Topic::StateChange, Payload::State(state)) => {
                self.redraw();
                self.view.replace_url(state.as_query_string());
                self.apply_panel_visibility(state);
            }
            (topic, _) => {
                tracing::warn!(topic = topic.name(), "payload does not match topic");
            }
        }
    }

    fn on_meta(&mut self, meta: Meta) {
        let selected = self.state().filter.year.clone();
        for year in &meta.years {
            let markup = self.templates.year_option(&YearOption {
                year: year.clone(),
                selected: selected.as_deref() == Some(year.as_str()),
            });
            self.view.add_year_option(markup);
        }
        self.data.meta = Some(meta);
    }

    fn on_datasets(&mut self, datasets: Vec<Dataset>) {
        let selected = self.state().filter.dataset.clone();
        for dataset in &datasets {
            let markup = self.templates.dataset_option(&DatasetOption {
                dataset_id: dataset.id.clone(),
                dataset: dataset.title.clone(),
                selected: selected.as_deref() == Some(dataset.id.as_str()),
            });
            self.view.add_dataset_option(markup);
        }
        self.data.datasets = Some(datasets);
    }

    /// Fill color for the place with region code `code` under the current
    /// filters.
    pub fn color_for(&self, code: &str) -> Rgb {
        color_for(code, self.state(), &self.data, &self.scale)
    }

    /// One style per geography feature. Empty until geography has arrived.
    pub fn layer(&self) -> Vec<PlaceStyle> {
        let Some(geo) = &self.data.geo else {
            return Vec::new();
        };
        geo.features
            .iter()
            .enumerate()
            .map(|(index, feature)| {
                let code = feature_code(feature);
                let fill = code.as_deref().map_or(NEUTRAL, |c| self.color_for(c));
                PlaceStyle {
                    feature: index,
                    code,
                    style: Style::base(fill),
                }
            })
            .collect()
    }

    fn redraw(&mut self) {
        let layer = self.layer();
        self.view.draw_layer(layer);
    }

    /// Hide tools, share, embed and help panels whose flag is off. Nothing is
    /// ever shown again here.
    pub fn apply_panel_visibility(&mut self, state: &UiState) {
        let flags = [
            (Panel::Tools, state.panel.tools),
            (Panel::Share, state.panel.share),
            (Panel::Embed, state.panel.embed),
            (Panel::Help, state.panel.help),
        ];
        for (panel, visible) in flags {
            if !visible {
                self.view.hide_panel(panel);
            }
        }
    }

    pub fn paint_legend(&mut self) {
        let swatches = self
            .config
            .legend_scores
            .iter()
            .map(|score| (*score, self.scale.color_at(*score as f64).hex()))
            .collect();
        self.view.paint_legend(swatches);
    }

    /// Publish a filter change made through the tool controls.
    pub fn select_filters(
        &mut self,
        year: Option<String>,
        dataset: Option<String>,
        out: &mut dyn Publish,
    ) {
        let mut next = self.state().clone();
        next.filter.year = year;
        next.filter.dataset = dataset;
        out.publish(Topic::ToolChange, Payload::State(next));
    }

    /// Accordion toggle: activating one trigger deactivates the others, and
    /// clicking the active one closes the info box.
    pub fn toggle_info(&mut self, index: usize) {
        if self.active_info == Some(index) {
            self.close_info();
            return;
        }
        let Some(trigger) = self.config.info_triggers.get(index) else {
            return;
        };

        let embed_code = if trigger.embed {
            let embed = self.state().embed_snapshot(self.state.defaults());
            self.templates.embed_code(&EmbedCode {
                base_url: self.config.embed_base_url.clone(),
                state_params: embed.as_query_string().to_string(),
            })
        } else {
            String::new()
        };
        let markup = self.templates.info_box(&InfoBox {
            title: trigger.title.clone(),
            text: template::markdown(&trigger.text),
            embed_code,
        });

        self.active_info = Some(index);
        self.view.mark_info_trigger(self.active_info);
        self.view.show_info(markup);
    }

    pub fn close_info(&mut self) {
        self.active_info = None;
        self.view.mark_info_trigger(None);
        self.view.clear_info();
    }

    pub fn active_info(&self) -> Option<usize> {
        self.active_info
    }

    /// Focus a clicked place, show its score box, and record it as
    /// `map.place`.
    pub fn select_place(&mut self, code: &str, out: &mut dyn Publish) {
        if !self.show_place_box(code) {
            return;
        }
        let code = code.to_lowercase();
        if self.state().map.place.as_deref() != Some(code.as_str()) {
            let mut next = self.state().clone();
            next.map.place = Some(code);
            out.publish(Topic::ToolChange, Payload::State(next));
        }
    }

    /// Returns false when there is no data for `code`.
    fn show_place_box(&mut self, code: &str) -> bool {
        let Some(place) = self.data.place(code) else {
            tracing::debug!(code, "no place data for selected feature");
            return false;
        };
        let score = place.score.as_deref().and_then(parse_score);
        let previous_score = place.previous_score.as_deref().and_then(parse_score);
        let ctx = PlaceBox {
            year: self
                .state()
                .filter
                .year
                .clone()
                .unwrap_or_else(|| self.config.current_year.clone()),
            name: place.name.clone(),
            slug: place.id.clone(),
            score,
            rank: place.rank.as_deref().and_then(parse_score),
            improvement_phrase: improvement_phrase(score, previous_score).to_string(),
            previous_score,
        };
        let markup = self.templates.place_box(&ctx);
        self.view.focus_place(code);
        self.view.show_place(markup);
        true
    }
}

/// Aggregate place score when no dataset is selected, otherwise the entry for
/// the selected dataset and year. Anything missing is neutral.
pub fn color_for(code: &str, state: &UiState, data: &DataStore, scale: &ColorScale) -> Rgb {
    let score = if state.shows_all_datasets() {
        data.place(code).and_then(|p| p.score.as_deref())
    } else {
        match (state.filter.year.as_deref(), state.filter.dataset.as_deref()) {
            (Some(year), Some(dataset)) => data
                .entry(code, year, dataset)
                .and_then(|e| e.score.as_deref()),
            _ => None,
        }
    };
    scale.color_for_score(score)
}

fn improvement_phrase(score: Option<i64>, previous: Option<i64>) -> &'static str {
    match (score, previous) {
        (Some(now), Some(before)) if now > before => "an improvement on",
        (Some(now), Some(before)) if now < before => "a decline from",
        _ => "unchanged from",
    }
}
