//! Consistency checks over the extracted data directory.

use std::collections::BTreeMap;
use std::path::Path;

use crate::table::{Record, Table};

/// Check `entries.csv`, `datasets.csv`, `places.csv` and `summary.csv` in
/// `dir`. Every problem found is reported, not just the first.
pub fn validate(dir: &Path) -> Result<(), String> {
    let load = |name: &str| Table::load(&dir.join(name));
    let entries = load("entries.csv")?;
    let datasets = load("datasets.csv")?;
    let places = load("places.csv")?;
    let summary = load("summary.csv")?;

    let mut problems = Vec::new();
    check_entries(&entries, &mut problems);
    check_ranked("datasets.csv", &datasets, &mut problems);
    check_ranked("places.csv", &places, &mut problems);
    check_summary(&summary, &mut problems);

    if problems.is_empty() {
        tracing::info!(
            entries = entries.records.len(),
            datasets = datasets.records.len(),
            places = places.records.len(),
            "data is consistent"
        );
        Ok(())
    } else {
        for problem in &problems {
            tracing::warn!("{problem}");
        }
        Err(format!(
            "{} problem(s) in {}: {}",
            problems.len(),
            dir.display(),
            problems.join("; ")
        ))
    }
}

fn cell<'a>(record: &'a Record, column: &str) -> &'a str {
    record.get(column).map(String::as_str).unwrap_or("")
}

/// A ranked row: `(id, score, rank)`.
type Scored<'a> = (&'a str, i64, i64);

fn check_entries(entries: &Table, problems: &mut Vec<String>) {
    let mut groups: BTreeMap<(&str, &str), Vec<Scored>> = BTreeMap::new();
    for record in &entries.records {
        let id = cell(record, "place");
        let (dataset, year) = (cell(record, "dataset"), cell(record, "year"));
        let label = format!("entries.csv {id}/{dataset}/{year}");
        if let Some(isopen) = record.get("isopen") {
            if isopen != "True" && isopen != "False" {
                problems.push(format!("{label}: isopen is {isopen:?}"));
            }
        }
        if let Some((score, rank)) = score_and_rank(&label, record, "score", "rank", problems) {
            groups.entry((year, dataset)).or_default().push((id, score, rank));
        }
    }
    for ((year, dataset), rows) in groups {
        check_dense(&format!("entries.csv {year}/{dataset}"), &rows, problems);
    }
}

/// Tables with `score`/`rank` for the current year and `score_<year>` /
/// `rank_<year>` for the others.
fn check_ranked(name: &str, table: &Table, problems: &mut Vec<String>) {
    let suffixes = table
        .columns
        .iter()
        .filter_map(|c| c.strip_prefix("score"))
        .filter(|suffix| table.columns.contains(&format!("rank{suffix}")));
    for suffix in suffixes {
        let (score_col, rank_col) = (format!("score{suffix}"), format!("rank{suffix}"));
        let mut rows = Vec::new();
        for record in &table.records {
            let id = cell(record, "id");
            let label = format!("{name} {id}");
            if let Some((score, rank)) =
                score_and_rank(&label, record, &score_col, &rank_col, problems)
            {
                rows.push((id, score, rank));
            }
        }
        check_dense(&format!("{name} {score_col}"), &rows, problems);
    }
}

/// Parsed score and rank, or `None` when the row has no score. Out-of-range
/// values are reported.
fn score_and_rank(
    label: &str,
    record: &Record,
    score_col: &str,
    rank_col: &str,
    problems: &mut Vec<String>,
) -> Option<(i64, i64)> {
    let raw_score = cell(record, score_col);
    let raw_rank = cell(record, rank_col);
    if raw_score.is_empty() {
        if !raw_rank.is_empty() {
            problems.push(format!("{label}: {rank_col} {raw_rank} without a score"));
        }
        return None;
    }
    let Ok(score) = raw_score.parse::<i64>() else {
        problems.push(format!("{label}: {score_col} {raw_score:?} is not a number"));
        return None;
    };
    if !(0..=100).contains(&score) {
        problems.push(format!("{label}: {score_col} {score} outside 0..=100"));
    }
    match raw_rank.parse::<i64>() {
        Ok(rank) if rank >= 1 => Some((score, rank)),
        _ => {
            problems.push(format!("{label}: {rank_col} {raw_rank:?} is not a rank"));
            None
        }
    }
}

/// Ranks must be dense over descending scores: the best score ranks 1, ties
/// share a rank and the next lower score takes the next rank.
fn check_dense(label: &str, rows: &[Scored], problems: &mut Vec<String>) {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    let mut expected = 0;
    let mut previous = None;
    for (id, score, rank) in sorted {
        if previous != Some(score) {
            expected += 1;
            previous = Some(score);
        }
        if rank != expected {
            problems.push(format!("{label}: {id} has rank {rank}, expected {expected}"));
        }
    }
}

fn check_summary(summary: &Table, problems: &mut Vec<String>) {
    let rows: BTreeMap<&str, &Record> = summary
        .records
        .iter()
        .filter_map(|r| Some((r.get("id")?.as_str(), r)))
        .collect();
    let value_columns = summary.columns.iter().filter(|c| c.starts_with("value"));
    for column in value_columns {
        let mut value = |id: &str| -> Option<i64> {
            let raw = rows.get(id)?.get(column)?;
            match raw.parse() {
                Ok(n) => Some(n),
                Err(_) => {
                    problems.push(format!("summary.csv {id}: {column} {raw:?} is not a number"));
                    None
                }
            }
        };
        let (Some(places), Some(entries), Some(open), Some(percent)) = (
            value("places_count"),
            value("entries_count"),
            value("open_count"),
            value("open_percent"),
        ) else {
            problems.push(format!("summary.csv {column}: missing counts"));
            continue;
        };
        if places > entries {
            problems.push(format!("summary.csv {column}: {places} places but {entries} entries"));
        }
        if open > entries {
            problems.push(format!("summary.csv {column}: {open} open of {entries} entries"));
        }
        let expected = if entries == 0 {
            0
        } else {
            (100.0 * open as f64 / entries as f64).round() as i64
        };
        if percent != expected {
            problems.push(format!(
                "summary.csv {column}: open_percent {percent}, expected {expected}"
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, files: &[(&str, &str)]) {
        for (name, body) in files {
            std::fs::write(dir.join(name), body).unwrap();
        }
    }

    const ENTRIES: &str = "\
place,dataset,year,score,rank,isopen,timestamp
gb,budget,2014,100,1,True,t
au,budget,2014,30,2,False,t
nz,budget,2014,30,2,False,t
";
    const DATASETS: &str = "\
id,title,score,rank,score_2013,rank_2013
budget,Budget,53,1,,
";
    const PLACES: &str = "\
id,name,score,rank,score_2013,rank_2013
gb,United Kingdom,100,1,35,1
au,Australia,30,2,20,2
nz,New Zealand,30,2,,
";
    const SUMMARY: &str = "\
id,title,value,value_2013
places_count,Number of Places,3,2
entries_count,Number of Entries,3,2
open_count,Number of Open Datasets,1,0
open_percent,Percent Open,33,0
";

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            &[
                ("entries.csv", ENTRIES),
                ("datasets.csv", DATASETS),
                ("places.csv", PLACES),
                ("summary.csv", SUMMARY),
            ],
        );
        dir
    }

    #[test]
    fn test_consistent_data_passes() {
        let dir = fixture();
        validate(dir.path()).unwrap();
    }

    #[test]
    fn test_gap_in_dense_ranks_is_reported() {
        let dir = fixture();
        write(
            dir.path(),
            &[(
                "entries.csv",
                ENTRIES.replace("nz,budget,2014,30,2", "nz,budget,2014,20,4").as_str(),
            )],
        );
        let err = validate(dir.path()).unwrap_err();
        assert!(err.contains("nz has rank 4, expected 3"), "{err}");
    }

    #[test]
    fn test_score_out_of_range_is_reported() {
        let dir = fixture();
        write(
            dir.path(),
            &[(
                "places.csv",
                PLACES.replace("gb,United Kingdom,100", "gb,United Kingdom,140").as_str(),
            )],
        );
        let err = validate(dir.path()).unwrap_err();
        assert!(err.contains("places.csv gb: score 140 outside 0..=100"), "{err}");
    }

    #[test]
    fn test_summary_percent_must_match_counts() {
        let dir = fixture();
        write(
            dir.path(),
            &[("summary.csv", SUMMARY.replace("Percent Open,33", "Percent Open,50").as_str())],
        );
        let err = validate(dir.path()).unwrap_err();
        assert!(err.contains("open_percent 50, expected 33"), "{err}");
        assert!(err.starts_with("1 problem(s)"), "{err}");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = fixture();
        std::fs::remove_file(dir.path().join("summary.csv")).unwrap();
        assert!(validate(dir.path()).unwrap_err().contains("summary.csv"));
    }
}
