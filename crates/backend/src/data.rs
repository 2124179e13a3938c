use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use odi_shared::models::{Dataset, Entry, Meta, Place, SummaryRow};

type Row = BTreeMap<String, String>;

/// Processed index data, loaded once at startup.
pub struct IndexData {
    pub meta: Meta,
    pub summary: Vec<SummaryRow>,
    pub places: Vec<Place>,
    pub datasets: Vec<Dataset>,
    pub entries: Vec<Entry>,
    pub geo: geojson::FeatureCollection,
}

impl IndexData {
    pub fn load(data_dir: &Path) -> Result<Self, String> {
        let entry_rows = read_csv(&data_dir.join("entries.csv"))?;
        let entries: Vec<Entry> = entry_rows.iter().filter_map(to_entry).collect();
        let meta = meta_from(&entries);
        let previous = meta.years.get(1).map(String::as_str);

        let summary = read_csv(&data_dir.join("summary.csv"))?
            .iter()
            .filter_map(|row| {
                Some(SummaryRow {
                    id: row.get("id")?.clone(),
                    title: text(row, "title").unwrap_or_default(),
                    value: text(row, "value"),
                    previous_value: previous.and_then(|y| text(row, &format!("value_{y}"))),
                })
            })
            .collect();

        let places: Vec<Place> = read_csv(&data_dir.join("places.csv"))?
            .iter()
            .filter_map(|row| {
                Some(Place {
                    id: row.get("id")?.to_lowercase(),
                    name: text(row, "name").unwrap_or_default(),
                    score: text(row, "score"),
                    rank: text(row, "rank"),
                    previous_score: previous.and_then(|y| text(row, &format!("score_{y}"))),
                    previous_rank: previous.and_then(|y| text(row, &format!("rank_{y}"))),
                })
            })
            .collect();

        let datasets: Vec<Dataset> = read_csv(&data_dir.join("datasets.csv"))?
            .iter()
            .filter_map(|row| {
                Some(Dataset {
                    id: row.get("id")?.clone(),
                    title: text(row, "title").unwrap_or_default(),
                    score: text(row, "score"),
                    rank: text(row, "rank"),
                })
            })
            .collect();

        let geo_path = data_dir.join("geo.json");
        let geo_data = std::fs::read_to_string(&geo_path)
            .map_err(|e| format!("Failed to read {}: {}", geo_path.display(), e))?;
        let geo: geojson::FeatureCollection = geo_data
            .parse::<geojson::GeoJson>()
            .map_err(|e| format!("Failed to parse geo.json: {}", e))?
            .try_into()
            .map_err(|e: geojson::Error| format!("geo.json is not a FeatureCollection: {}", e))?;

        tracing::info!(
            places = places.len(),
            datasets = datasets.len(),
            entries = entries.len(),
            features = geo.features.len(),
            years = ?meta.years,
            "Loaded index data"
        );

        Ok(IndexData {
            meta,
            summary,
            places,
            datasets,
            entries,
            geo,
        })
    }

    pub fn find_place(&self, id: &str) -> Option<&Place> {
        self.places.iter().find(|p| p.id.eq_ignore_ascii_case(id))
    }
}

fn read_csv(path: &Path) -> Result<Vec<Row>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    reader
        .deserialize::<Row>()
        .map(|row| row.map_err(|e| format!("Failed to parse {}: {}", path.display(), e)))
        .collect()
}

/// Non-empty value of `key`.
fn text(row: &Row, key: &str) -> Option<String> {
    row.get(key).filter(|v| !v.is_empty()).cloned()
}

fn to_entry(row: &Row) -> Option<Entry> {
    Some(Entry {
        place: row.get("place")?.to_lowercase(),
        year: text(row, "year")?,
        dataset: row.get("dataset")?.clone(),
        score: text(row, "score"),
        rank: text(row, "rank"),
        is_open: row.get("isopen").and_then(|v| match v.to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }),
    })
}

/// Survey years present in the entries, newest first.
fn meta_from(entries: &[Entry]) -> Meta {
    let years: BTreeSet<&str> = entries.iter().map(|e| e.year.as_str()).collect();
    let years: Vec<String> = years.into_iter().rev().map(str::to_string).collect();
    Meta {
        current_year: years.first().cloned(),
        years,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn write_fixture(dir: &Path) {
        let files = [
            (
                "entries.csv",
                "place,dataset,year,score,rank,isopen,exists,timestamp\n\
                 gb,budget,2014,100,1,True,Y,2014-05-01\n\
                 au,budget,2014,30,2,False,Y,2014-05-02\n\
                 gb,budget,2013,70,1,False,Y,2013-04-01\n",
            ),
            (
                "places.csv",
                "id,name,score,rank,score_2013,rank_2013,submitters,reviewers\n\
                 GB,United Kingdom,94,1,90,1,alice,bob\n\
                 au,Australia,66,10,,,,\n",
            ),
            (
                "datasets.csv",
                "id,title,score,rank,score_2013,rank_2013\nbudget,Budget,65,1,70,1\n",
            ),
            (
                "summary.csv",
                "id,title,value,value_2013\nplaces_count,Number of Places,2,1\n",
            ),
            (
                "geo.json",
                r#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":{"iso_a2":"GB","name":"United Kingdom"},"geometry":{"type":"Polygon","coordinates":[[[-5.0,50.0],[1.0,50.0],[1.0,58.0],[-5.0,50.0]]]}}]}"#,
            ),
        ];
        for (name, body) in files {
            std::fs::write(dir.join(name), body).unwrap();
        }
    }

    #[test]
    fn test_load_index_data() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let data = IndexData::load(dir.path()).unwrap();

        assert_eq!(data.meta.years, vec!["2014", "2013"]);
        assert_eq!(data.meta.current_year.as_deref(), Some("2014"));
        assert_eq!(data.entries.len(), 3);
        assert_eq!(data.entries[0].is_open, Some(true));
        assert_eq!(data.geo.features.len(), 1);
        assert_eq!(data.summary[0].previous_value.as_deref(), Some("1"));
    }

    #[test]
    fn test_place_previous_year_columns() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let data = IndexData::load(dir.path()).unwrap();

        let gb = data.find_place("gb").unwrap();
        assert_eq!(gb.id, "gb");
        assert_eq!(gb.score.as_deref(), Some("94"));
        assert_eq!(gb.previous_score.as_deref(), Some("90"));

        let au = data.find_place("AU").unwrap();
        assert_eq!(au.previous_score, None);
        assert_eq!(au.rank.as_deref(), Some("10"));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        std::fs::remove_file(dir.path().join("geo.json")).unwrap();
        let err = IndexData::load(dir.path()).err().unwrap();
        assert!(err.contains("geo.json"), "{err}");
    }

    #[test]
    fn test_meta_without_entries() {
        let meta = meta_from(&[]);
        assert!(meta.years.is_empty());
        assert_eq!(meta.current_year, None);
    }
}
