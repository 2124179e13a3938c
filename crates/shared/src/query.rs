//! Query-string codec for the dashboard UI state.
//!
//! Parameters are namespaced as `<namespace>_<field>`, e.g. `panel_tools=false`.
//! Only non-default fields are written, and only the keys in
//! [`ALLOWED_PARAMS`] are read back.

use std::collections::BTreeMap;
use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::state::UiState;

/// Characters `encodeURIComponent` leaves untouched.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const TRUE_TOKENS: [&str; 2] = ["true", "yes"];
const FALSE_TOKENS: [&str; 2] = ["false", "no"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Namespace {
    Filter,
    Panel,
    Map,
}

impl Namespace {
    pub const ALL: [Namespace; 3] = [Namespace::Filter, Namespace::Panel, Namespace::Map];

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Filter => "filter",
            Namespace::Panel => "panel",
            Namespace::Map => "map",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Namespace::ALL.into_iter().find(|ns| ns.as_str() == s)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A namespaced state field, e.g. `(Panel, "tools")`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParamKey {
    pub namespace: Namespace,
    pub field: &'static str,
}

impl ParamKey {
    pub const fn new(namespace: Namespace, field: &'static str) -> Self {
        Self { namespace, field }
    }

    /// Split a raw parameter name on its first `_` and resolve it against
    /// the allow-list.
    pub fn parse(raw: &str, allowed: &[ParamKey]) -> Option<Self> {
        let (ns, field) = raw.split_once('_')?;
        let namespace = Namespace::parse(ns)?;
        allowed
            .iter()
            .copied()
            .find(|k| k.namespace == namespace && k.field == field)
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.namespace, self.field)
    }
}

/// Every parameter `decode` will read.
///
/// This list is maintained by hand, apart from [`UiState::fields`], which
/// walks the state structs and drives `encode`. A state field missing here
/// is still written to URLs but never read back from them.
pub const ALLOWED_PARAMS: [ParamKey; 12] = [
    ParamKey::new(Namespace::Filter, "year"),
    ParamKey::new(Namespace::Filter, "dataset"),
    ParamKey::new(Namespace::Panel, "logo"),
    ParamKey::new(Namespace::Panel, "name"),
    ParamKey::new(Namespace::Panel, "tools"),
    ParamKey::new(Namespace::Panel, "share"),
    ParamKey::new(Namespace::Panel, "embed"),
    ParamKey::new(Namespace::Panel, "help"),
    ParamKey::new(Namespace::Panel, "legend"),
    ParamKey::new(Namespace::Map, "lat"),
    ParamKey::new(Namespace::Map, "long"),
    ParamKey::new(Namespace::Map, "place"),
];

/// A leaf value of the UI state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
    Unset,
}

impl FieldValue {
    /// Coerce a raw parameter value: boolean tokens become flags,
    /// everything else stays opaque text.
    pub fn from_param(raw: &str) -> Self {
        let lower = raw.to_lowercase();
        if TRUE_TOKENS.contains(&lower.as_str()) {
            FieldValue::Flag(true)
        } else if FALSE_TOKENS.contains(&lower.as_str()) {
            FieldValue::Flag(false)
        } else {
            FieldValue::Text(raw.to_string())
        }
    }

    fn as_param(&self) -> Option<String> {
        match self {
            FieldValue::Flag(b) => Some(b.to_string()),
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Unset => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Flag(b)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<Option<String>> for FieldValue {
    fn from(v: Option<String>) -> Self {
        v.map(FieldValue::Text).unwrap_or(FieldValue::Unset)
    }
}

/// `{namespace: {field: value}}` as produced by `decode` or by callers
/// overriding state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialState {
    namespaces: BTreeMap<Namespace, BTreeMap<&'static str, FieldValue>>,
}

impl PartialState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: ParamKey, value: impl Into<FieldValue>) {
        self.namespaces
            .entry(key.namespace)
            .or_default()
            .insert(key.field, value.into());
    }

    pub fn with(mut self, key: ParamKey, value: impl Into<FieldValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: ParamKey) -> Option<&FieldValue> {
        self.namespaces.get(&key.namespace)?.get(key.field)
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.values().all(BTreeMap::is_empty)
    }

    /// Fields grouped per namespace, in namespace order.
    pub fn namespaces(
        &self,
    ) -> impl Iterator<Item = (Namespace, &BTreeMap<&'static str, FieldValue>)> {
        self.namespaces.iter().map(|(ns, fields)| (*ns, fields))
    }

    pub fn len(&self) -> usize {
        self.namespaces.values().map(BTreeMap::len).sum()
    }
}

/// Parse a raw query string into a partial state, keeping only allowed keys.
pub fn decode(query: &str, allowed: &[ParamKey]) -> PartialState {
    let cleaned: String = query.chars().filter(|c| *c != '?' && *c != '/').collect();
    let mut state = PartialState::new();

    for pair in cleaned.split('&').filter(|p| !p.is_empty()) {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = percent_decode_str(raw_key).decode_utf8_lossy();
        let Some(param) = ParamKey::parse(&key, allowed) else {
            tracing::debug!(param = %key, "dropping unrecognized query parameter");
            continue;
        };
        let value = percent_decode_str(raw_value).decode_utf8_lossy();
        state.set(param, FieldValue::from_param(&value));
    }

    state
}

/// Serialize every field that differs from `defaults`.
///
/// Returns `""` rather than `"?"` when nothing differs.
pub fn encode(state: &UiState, defaults: &UiState) -> String {
    let pairs: Vec<String> = state
        .fields()
        .into_iter()
        .filter(|(key, value)| defaults.field(*key).as_ref() != Some(value))
        .filter_map(|(key, value)| {
            let value = value.as_param()?;
            Some(format!(
                "{}={}",
                utf8_percent_encode(&key.to_string(), COMPONENT),
                utf8_percent_encode(&value, COMPONENT)
            ))
        })
        .collect();

    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::merge;

    const PANEL_TOOLS: ParamKey = ParamKey::new(Namespace::Panel, "tools");

    #[test]
    fn test_encode_defaults_is_empty() {
        let defaults = UiState::default();
        assert_eq!(encode(&defaults, &defaults), "");
    }

    #[test]
    fn test_decode_boolean_tokens_case_insensitive() {
        let no = decode("panel_tools=No", &ALLOWED_PARAMS);
        assert_eq!(no.get(PANEL_TOOLS), Some(&FieldValue::Flag(false)));

        let yes = decode("panel_tools=YES", &ALLOWED_PARAMS);
        assert_eq!(yes.get(PANEL_TOOLS), Some(&FieldValue::Flag(true)));

        let t = decode("?panel_tools=True", &ALLOWED_PARAMS);
        assert_eq!(t.get(PANEL_TOOLS), Some(&FieldValue::Flag(true)));
    }

    #[test]
    fn test_decode_drops_unknown_keys() {
        let state = decode("?foo=bar&panel_nope=true&filter_dataset=gdp", &ALLOWED_PARAMS);
        assert_eq!(state.len(), 1);
        assert_eq!(
            state.get(ParamKey::new(Namespace::Filter, "dataset")),
            Some(&FieldValue::Text("gdp".to_string()))
        );
    }

    #[test]
    fn test_decode_other_values_stay_text() {
        let state = decode("map_lat=51.5&filter_year=2013", &ALLOWED_PARAMS);
        assert_eq!(
            state.get(ParamKey::new(Namespace::Map, "lat")),
            Some(&FieldValue::Text("51.5".to_string()))
        );
        assert_eq!(
            state.get(ParamKey::new(Namespace::Filter, "year")),
            Some(&FieldValue::Text("2013".to_string()))
        );
    }

    #[test]
    fn test_decode_strips_slashes_and_question_marks() {
        let state = decode("/?panel_help=no/", &ALLOWED_PARAMS);
        assert_eq!(
            state.get(ParamKey::new(Namespace::Panel, "help")),
            Some(&FieldValue::Flag(false))
        );
    }

    #[test]
    fn test_decode_key_without_value_is_empty_text() {
        let state = decode("map_place", &ALLOWED_PARAMS);
        assert_eq!(
            state.get(ParamKey::new(Namespace::Map, "place")),
            Some(&FieldValue::Text(String::new()))
        );
    }

    #[test]
    fn test_decode_respects_custom_allow_list() {
        let state = decode("panel_tools=no&panel_help=no", &[PANEL_TOOLS]);
        assert_eq!(state.len(), 1);
        assert!(state.get(PANEL_TOOLS).is_some());
    }

    #[test]
    fn test_encode_only_non_default_fields() {
        let defaults = UiState::default();
        let partial = PartialState::new()
            .with(PANEL_TOOLS, false)
            .with(ParamKey::new(Namespace::Filter, "dataset"), "gdp");
        let state = merge(&defaults, &partial);
        assert_eq!(
            state.as_query_string(),
            "?filter_dataset=gdp&panel_tools=false"
        );
    }

    #[test]
    fn test_encode_percent_encodes_values() {
        let defaults = UiState::default();
        let partial =
            PartialState::new().with(ParamKey::new(Namespace::Map, "place"), "côte d'ivoire");
        let state = merge(&defaults, &partial);
        assert_eq!(state.as_query_string(), "?map_place=c%C3%B4te%20d'ivoire");
    }

    #[test]
    fn test_round_trip_reproduces_non_default_fields() {
        let defaults = UiState::default();
        let partial = PartialState::new()
            .with(ParamKey::new(Namespace::Filter, "year"), "2013")
            .with(ParamKey::new(Namespace::Panel, "share"), false)
            .with(ParamKey::new(Namespace::Map, "place"), "a&b=c");
        let state = merge(&defaults, &partial);

        let decoded = decode(state.as_query_string(), &ALLOWED_PARAMS);
        assert_eq!(decoded, partial);
    }

    #[test]
    fn test_param_key_display() {
        assert_eq!(PANEL_TOOLS.to_string(), "panel_tools");
        assert_eq!(ParamKey::parse("map_long", &ALLOWED_PARAMS).unwrap().field, "long");
        assert!(ParamKey::parse("maplong", &ALLOWED_PARAMS).is_none());
    }
}
