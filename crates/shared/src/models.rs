use serde::{Deserialize, Deserializer, Serialize};

/// Index metadata: the survey years the data covers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(deserialize_with = "lenient::text_list")]
    pub years: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub current_year: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub previous_value: Option<String>,
}

/// A scored place. `id` is the lowercase ISO 3166-1 alpha-2 code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub score: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub rank: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub previous_score: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub previous_rank: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub score: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub rank: Option<String>,
}

/// A score observation for one place, dataset and year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub place: String,
    #[serde(deserialize_with = "lenient::required_text")]
    pub year: String,
    pub dataset: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub score: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub rank: Option<String>,
    #[serde(default)]
    pub is_open: Option<bool>,
}

/// Places arrive together with the geography they are drawn on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacesPayload {
    pub places: Vec<Place>,
    pub geo: geojson::FeatureCollection,
}

/// Property carrying the region code on geography features.
pub const REGION_CODE_PROPERTY: &str = "iso_a2";

/// Lowercased region code of a geography feature, if it has one.
pub fn feature_code(feature: &geojson::Feature) -> Option<String> {
    feature
        .property(REGION_CODE_PROPERTY)
        .and_then(|v| v.as_str())
        .map(str::to_lowercase)
}

/// Scores and years show up as numbers in some payloads and strings in
/// others; both are kept as text.
mod lenient {
    use super::*;
    use serde_json::Value;

    fn as_text(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(as_text(Value::deserialize(d)?))
    }

    pub fn required_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        as_text(Value::deserialize(d)?).ok_or_else(|| serde::de::Error::custom("missing value"))
    }

    pub fn text_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        let values = Vec::<Value>::deserialize(d)?;
        Ok(values.into_iter().filter_map(as_text).collect())
    }
}
