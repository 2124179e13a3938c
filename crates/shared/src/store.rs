use crate::models::{Dataset, Entry, Meta, Place, PlacesPayload, SummaryRow};

/// Latest payload received per data topic. Each publication replaces the
/// previous one wholesale.
#[derive(Debug, Clone, Default)]
pub struct DataStore {
    pub meta: Option<Meta>,
    pub summary: Option<Vec<SummaryRow>>,
    pub places: Option<Vec<Place>>,
    pub datasets: Option<Vec<Dataset>>,
    pub entries: Option<Vec<Entry>>,
    pub geo: Option<geojson::FeatureCollection>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_places(&mut self, payload: PlacesPayload) {
        self.places = Some(payload.places);
        self.geo = Some(payload.geo);
    }

    /// Place whose id matches `code`, ignoring case.
    pub fn place(&self, code: &str) -> Option<&Place> {
        self.places
            .as_deref()?
            .iter()
            .find(|p| p.id.eq_ignore_ascii_case(code))
    }

    pub fn entry(&self, place: &str, year: &str, dataset: &str) -> Option<&Entry> {
        self.entries.as_deref()?.iter().find(|e| {
            e.place.eq_ignore_ascii_case(place) && e.year == year && e.dataset == dataset
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(id: &str, score: &str) -> Place {
        Place {
            id: id.to_string(),
            name: id.to_uppercase(),
            score: Some(score.to_string()),
            rank: None,
            previous_score: None,
            previous_rank: None,
        }
    }

    #[test]
    fn test_place_lookup_ignores_case() {
        let mut store = DataStore::new();
        store.places = Some(vec![place("us", "72")]);
        assert_eq!(store.place("US").map(|p| p.id.as_str()), Some("us"));
        assert!(store.place("gb").is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let mut store = DataStore::new();
        store.places = Some(vec![place("us", "72")]);
        store.set_places(PlacesPayload {
            places: vec![place("gb", "94")],
            geo: geojson::FeatureCollection {
                bbox: None,
                features: vec![],
                foreign_members: None,
            },
        });
        assert!(store.place("us").is_none());
        assert!(store.place("gb").is_some());
        assert!(store.geo.is_some());
    }

    #[test]
    fn test_entry_lookup_matches_all_three_keys() {
        let mut store = DataStore::new();
        store.entries = Some(vec![Entry {
            place: "us".to_string(),
            year: "2019".to_string(),
            dataset: "gdp".to_string(),
            score: Some("40".to_string()),
            rank: None,
            is_open: None,
        }]);
        assert!(store.entry("us", "2019", "gdp").is_some());
        assert!(store.entry("us", "2018", "gdp").is_none());
        assert!(store.entry("us", "2019", "budget").is_none());
        assert!(store.entries.is_some());
        assert!(DataStore::new().entry("us", "2019", "gdp").is_none());
    }
}
