//! Dashboard UI state and the store that derives it.
//!
//! A [`UiState`] is never edited in place by the store: every change merges a
//! [`PartialState`] over the defaults and produces a fresh snapshot whose
//! query string is recomputed from its fields.

use serde::Serialize;

use crate::query::{self, FieldValue, Namespace, ParamKey, PartialState, ALLOWED_PARAMS};

/// Dataset filter value meaning "aggregate place scores".
pub const ALL_DATASETS: &str = "all";
pub const DEFAULT_YEAR: &str = "2014";
pub const DEFAULT_LAT: &str = "20.0";
pub const DEFAULT_LONG: &str = "5.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterState {
    pub year: Option<String>,
    pub dataset: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelState {
    pub logo: bool,
    pub name: bool,
    pub tools: bool,
    pub share: bool,
    pub embed: bool,
    pub help: bool,
    pub legend: bool,
}

impl FilterState {
    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("year", self.year.clone().into()),
            ("dataset", self.dataset.clone().into()),
        ]
    }
}

impl PanelState {
    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("logo", self.logo.into()),
            ("name", self.name.into()),
            ("tools", self.tools.into()),
            ("share", self.share.into()),
            ("embed", self.embed.into()),
            ("help", self.help.into()),
            ("legend", self.legend.into()),
        ]
    }
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            logo: true,
            name: true,
            tools: true,
            share: true,
            embed: true,
            help: true,
            legend: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapState {
    pub lat: String,
    pub long: String,
    pub place: Option<String>,
}

impl MapState {
    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("lat", FieldValue::Text(self.lat.clone())),
            ("long", FieldValue::Text(self.long.clone())),
            ("place", self.place.clone().into()),
        ]
    }
}

/// Only serialized: `as_query_string` is always derived from the fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub filter: FilterState,
    pub panel: PanelState,
    pub map: MapState,
    as_query_string: String,
}

impl Default for UiState {
    fn default() -> Self {
        Self::defaults_for_year(DEFAULT_YEAR)
    }
}

impl UiState {
    /// The default state template with `year` as the selected year.
    pub fn defaults_for_year(year: &str) -> Self {
        Self {
            filter: FilterState {
                year: Some(year.to_string()),
                dataset: Some(ALL_DATASETS.to_string()),
            },
            panel: PanelState::default(),
            map: MapState {
                lat: DEFAULT_LAT.to_string(),
                long: DEFAULT_LONG.to_string(),
                place: None,
            },
            as_query_string: String::new(),
        }
    }

    /// Query string of the non-default fields, with a leading `?`, or empty.
    pub fn as_query_string(&self) -> &str {
        &self.as_query_string
    }

    /// True when the dataset filter selects aggregate place scores.
    pub fn shows_all_datasets(&self) -> bool {
        match self.filter.dataset.as_deref() {
            None => true,
            Some(d) => d == ALL_DATASETS,
        }
    }

    /// Every leaf field in namespace order, read off the state structs
    /// themselves. Drives `query::encode`, independently of the allow-list
    /// `query::decode` reads.
    pub fn fields(&self) -> Vec<(ParamKey, FieldValue)> {
        let namespaces = [
            (Namespace::Filter, self.filter.fields()),
            (Namespace::Panel, self.panel.fields()),
            (Namespace::Map, self.map.fields()),
        ];
        namespaces
            .into_iter()
            .flat_map(|(namespace, fields)| {
                fields
                    .into_iter()
                    .map(move |(field, value)| (ParamKey::new(namespace, field), value))
            })
            .collect()
    }

    pub fn field(&self, key: ParamKey) -> Option<FieldValue> {
        self.fields()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, value)| value)
    }

    /// Assign one field. Returns false when the field is unknown or the value
    /// does not fit its type, in which case the state is left as it was.
    fn assign(&mut self, namespace: Namespace, field: &str, value: &FieldValue) -> bool {
        let flag = |slot: &mut bool| match value {
            FieldValue::Flag(b) => {
                *slot = *b;
                true
            }
            _ => false,
        };
        let optional_text = |slot: &mut Option<String>| {
            *slot = match value {
                FieldValue::Flag(b) => Some(b.to_string()),
                FieldValue::Text(s) => Some(s.clone()),
                FieldValue::Unset => None,
            };
            true
        };
        let text = |slot: &mut String| match value {
            FieldValue::Flag(b) => {
                *slot = b.to_string();
                true
            }
            FieldValue::Text(s) => {
                *slot = s.clone();
                true
            }
            FieldValue::Unset => false,
        };

        match (namespace, field) {
            (Namespace::Filter, "year") => optional_text(&mut self.filter.year),
            (Namespace::Filter, "dataset") => optional_text(&mut self.filter.dataset),
            (Namespace::Panel, "logo") => flag(&mut self.panel.logo),
            (Namespace::Panel, "name") => flag(&mut self.panel.name),
            (Namespace::Panel, "tools") => flag(&mut self.panel.tools),
            (Namespace::Panel, "share") => flag(&mut self.panel.share),
            (Namespace::Panel, "embed") => flag(&mut self.panel.embed),
            (Namespace::Panel, "help") => flag(&mut self.panel.help),
            (Namespace::Panel, "legend") => flag(&mut self.panel.legend),
            (Namespace::Map, "lat") => text(&mut self.map.lat),
            (Namespace::Map, "long") => text(&mut self.map.long),
            (Namespace::Map, "place") => optional_text(&mut self.map.place),
            _ => false,
        }
    }

    /// Every field as an override, so a full state can be fed back through
    /// [`StateStore::apply_tool_change`].
    pub fn to_partial(&self) -> PartialState {
        let mut partial = PartialState::new();
        for (key, value) in self.fields() {
            partial.set(key, value);
        }
        partial
    }

    /// The state an embedded view is rendered with: no tools, sharing or
    /// embedding controls of its own.
    pub fn embed_snapshot(&self, defaults: &UiState) -> UiState {
        let mut embed = self.clone();
        embed.panel.share = false;
        embed.panel.embed = false;
        embed.panel.tools = false;
        embed.as_query_string = query::encode(&embed, defaults);
        embed
    }
}

/// Clone `defaults` and shallow-assign the fields of each namespace present
/// in `partial`.
pub fn merge(defaults: &UiState, partial: &PartialState) -> UiState {
    let mut state = defaults.clone();
    for (namespace, fields) in partial.namespaces() {
        for (field, value) in fields {
            if !state.assign(namespace, field, value) {
                tracing::debug!(%namespace, field, ?value, "ignoring state field");
            }
        }
    }
    state.as_query_string = query::encode(&state, defaults);
    state
}

/// Holds the defaults, the query string the page was loaded with, and the
/// current state snapshot.
#[derive(Debug, Clone)]
pub struct StateStore {
    defaults: UiState,
    initial_query: String,
    current: UiState,
}

impl StateStore {
    pub fn new(defaults: UiState, initial_query: impl Into<String>) -> Self {
        let mut store = Self {
            current: defaults.clone(),
            defaults,
            initial_query: initial_query.into(),
        };
        store.apply_tool_change(None);
        store
    }

    pub fn defaults(&self) -> &UiState {
        &self.defaults
    }

    pub fn current(&self) -> &UiState {
        &self.current
    }

    /// An explicit override bypasses the URL entirely.
    pub fn bootstrap_args(&self, explicit: Option<PartialState>) -> PartialState {
        match explicit {
            Some(partial) => partial,
            None => query::decode(&self.initial_query, &ALLOWED_PARAMS),
        }
    }

    pub fn apply_tool_change(&mut self, explicit: Option<PartialState>) -> &UiState {
        let args = self.bootstrap_args(explicit);
        self.current = merge(&self.defaults, &args);
        tracing::debug!(query = %self.current.as_query_string, "ui state updated");
        &self.current
    }
}
