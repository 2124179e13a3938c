//! Turns the raw survey export into the tables the map reads.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::table::{Record, Table};

/// Answers that must all be `Y` for an entry to count as open data.
const OPEN_CRITERIA: [&str; 5] = ["exists", "openlicense", "public", "bulk", "machinereadable"];

/// Columns kept from the questions sheet; later ones are translations.
const QUESTION_COLUMNS: usize = 8;
const ICON_COLUMN: usize = 6;

const LEADING_ENTRY_COLUMNS: [&str; 6] = ["place", "dataset", "year", "score", "rank", "isopen"];

type Key = (String, String, String);

pub struct Sources {
    pub places: Table,
    pub entries: Table,
    pub datasets: Table,
    pub questions: Table,
    pub submissions: Table,
}

impl Sources {
    pub fn load(dir: &Path) -> Result<Self, String> {
        Ok(Self {
            places: Table::load(&dir.join("places.csv"))?,
            entries: Table::load(&dir.join("entries.csv"))?,
            datasets: Table::load(&dir.join("datasets.csv"))?,
            questions: Table::load(&dir.join("questions.csv"))?,
            submissions: Table::load(&dir.join("submissions.csv"))?,
        })
    }
}

#[derive(Debug)]
pub struct Extracted {
    pub entries: Table,
    pub datasets: Table,
    pub questions: Table,
    pub places: Table,
    pub summary: Table,
}

impl Extracted {
    pub fn save(&self, dir: &Path) -> Result<(), String> {
        std::fs::create_dir_all(dir)
            .map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;
        self.entries.save(&dir.join("entries.csv"))?;
        self.datasets.save(&dir.join("datasets.csv"))?;
        self.questions.save(&dir.join("questions.csv"))?;
        self.places.save(&dir.join("places.csv"))?;
        self.summary.save(&dir.join("summary.csv"))
    }
}

#[derive(Debug, Clone)]
struct ScoredEntry {
    place: String,
    dataset: String,
    year: String,
    score: i64,
    rank: usize,
    is_open: bool,
    record: Record,
}

impl ScoredEntry {
    fn key(&self) -> Key {
        (self.place.clone(), self.dataset.clone(), self.year.clone())
    }

    fn into_record(mut self) -> Record {
        self.record.insert("year".into(), self.year);
        self.record.insert("score".into(), self.score.to_string());
        self.record.insert("rank".into(), self.rank.to_string());
        let open = if self.is_open { "True" } else { "False" };
        self.record.insert("isopen".into(), open.into());
        self.record
    }
}

pub struct Extractor {
    sources: Sources,
    current_year: String,
    years: Vec<String>,
}

impl Extractor {
    pub fn new(sources: Sources, current_year: impl Into<String>, years: Vec<String>) -> Self {
        Self {
            sources,
            current_year: current_year.into(),
            years,
        }
    }

    pub fn run(&self) -> Extracted {
        let entries = self.scored_entries();
        tracing::info!(entries = entries.len(), "scored entries");
        Extracted {
            datasets: self.datasets(&entries),
            questions: self.questions(),
            places: self.places(&entries),
            summary: self.summary(&entries),
            entries: self.entries_table(entries),
        }
    }

    /// Questions with a positive weight, which are the yes/no ones.
    fn weights(&self) -> Vec<(&str, i64)> {
        self.sources
            .questions
            .records
            .iter()
            .filter_map(|q| {
                let weight = q.get("score")?.trim().parse::<i64>().ok()?;
                let id = q.get("id")?;
                (weight > 0).then_some((id.as_str(), weight))
            })
            .collect()
    }

    fn tidy(&self, mut record: Record, weights: &[(&str, i64)]) -> ScoredEntry {
        record.remove("censusid");
        for (id, _) in weights {
            if let Some(answer) = record.get_mut(*id) {
                if let Some(fixed) = normalize_answer(answer) {
                    *answer = fixed.to_string();
                }
            }
        }
        let answered_yes = |id: &str| record.get(id).map(String::as_str) == Some("Y");
        let score = weights
            .iter()
            .filter(|(id, _)| answered_yes(*id))
            .map(|(_, weight)| weight)
            .sum();
        let is_open = OPEN_CRITERIA.iter().all(|id| answered_yes(*id));
        let field = |name: &str| record.get(name).cloned().unwrap_or_default();

        ScoredEntry {
            place: field("place"),
            dataset: field("dataset"),
            year: field("year"),
            score,
            rank: 0,
            is_open,
            record,
        }
    }

    /// Tidied survey entries, with gaps filled from the latest earlier year
    /// and ranked within each year and dataset.
    fn scored_entries(&self) -> Vec<ScoredEntry> {
        let weights = self.weights();
        let mut populated: BTreeMap<Key, ScoredEntry> = BTreeMap::new();
        for record in &self.sources.entries.records {
            let entry = self.tidy(record.clone(), &weights);
            if entry.record.get("timestamp").map_or(true, |t| t.is_empty()) {
                continue;
            }
            populated.insert(entry.key(), entry);
        }

        let mut writable = populated.clone();
        for place in self.sources.places.column("id") {
            for dataset in self.sources.datasets.column("id") {
                for year in &self.years {
                    let key = (place.to_string(), dataset.to_string(), year.clone());
                    if populated.contains_key(&key) {
                        continue;
                    }
                    let Some(copy) = latest_before(&populated, place, dataset, year) else {
                        continue;
                    };
                    tracing::debug!(place, dataset, from = %copy.year, to = %year, "copying entry forward");
                    let mut copy = copy.clone();
                    copy.year = year.clone();
                    writable.insert(key, copy);
                }
            }
        }

        self.rank(&writable)
    }

    /// Entries outside the configured years and datasets are dropped here.
    fn rank(&self, entries: &BTreeMap<Key, ScoredEntry>) -> Vec<ScoredEntry> {
        let mut ranked = Vec::with_capacity(entries.len());
        for year in &self.years {
            for dataset in self.sources.datasets.column("id") {
                let mut group: Vec<ScoredEntry> = entries
                    .values()
                    .filter(|e| &e.year == year && e.dataset == dataset)
                    .cloned()
                    .collect();
                group.sort_by(|a, b| b.score.cmp(&a.score));
                let ranks = dense_ranks(group.iter().map(|e| e.score));
                for entry in &mut group {
                    entry.rank = ranks[&entry.score];
                }
                ranked.extend(group);
            }
        }
        ranked
    }

    fn entries_table(&self, entries: Vec<ScoredEntry>) -> Table {
        let mut columns: Vec<String> = LEADING_ENTRY_COLUMNS.iter().map(|c| c.to_string()).collect();
        columns.extend(
            self.sources
                .entries
                .columns
                .iter()
                .filter(|c| {
                    !LEADING_ENTRY_COLUMNS.contains(&c.as_str())
                        && c.as_str() != "censusid"
                        && c.as_str() != "timestamp"
                })
                .cloned(),
        );
        columns.push("timestamp".into());

        let records = entries.into_iter().map(ScoredEntry::into_record).collect();
        Table::new(columns, records)
    }

    /// `score`, `rank` etc. for the current year, `score_2013` for others.
    fn year_column(&self, base: &str, year: &str) -> String {
        if year == self.current_year {
            base.to_string()
        } else {
            format!("{base}_{year}")
        }
    }

    /// Current year first, then the others in configured order.
    fn ordered_years(&self) -> impl Iterator<Item = &String> {
        std::iter::once(&self.current_year)
            .chain(self.years.iter().filter(move |y| **y != self.current_year))
    }

    /// Append per-year score and rank columns to `table`. A row's score is
    /// the percentage of `max_points` its entries earned that year.
    fn with_scores(
        &self,
        table: &Table,
        entries: &[ScoredEntry],
        owner: fn(&ScoredEntry) -> &str,
        max_points: impl Fn(&[&ScoredEntry]) -> usize,
    ) -> Table {
        let mut columns = table.columns.clone();
        for year in self.ordered_years() {
            columns.push(self.year_column("score", year));
            columns.push(self.year_column("rank", year));
        }

        let mut records = table.records.clone();
        for year in &self.years {
            let scores: Vec<Option<i64>> = records
                .iter()
                .map(|record| {
                    let id = record.get("id")?;
                    let owned: Vec<&ScoredEntry> = entries
                        .iter()
                        .filter(|e| &e.year == year && owner(*e) == id.as_str())
                        .collect();
                    let possible = max_points(&owned[..]) * 100;
                    if owned.is_empty() || possible == 0 {
                        return None;
                    }
                    let earned: i64 = owned.iter().map(|e| e.score).sum();
                    Some((100.0 * earned as f64 / possible as f64).round() as i64)
                })
                .collect();

            let ranks = dense_ranks(scores.iter().flatten().copied());
            let score_column = self.year_column("score", year);
            let rank_column = self.year_column("rank", year);
            for (record, score) in records.iter_mut().zip(scores) {
                let (score, rank) = match score {
                    Some(score) => (score.to_string(), ranks[&score].to_string()),
                    None => (String::new(), String::new()),
                };
                record.insert(score_column.clone(), score);
                record.insert(rank_column.clone(), rank);
            }
        }
        Table::new(columns, records)
    }

    fn datasets(&self, entries: &[ScoredEntry]) -> Table {
        self.with_scores(
            &self.sources.datasets,
            entries,
            |e| e.dataset.as_str(),
            |owned| {
                owned
                    .iter()
                    .map(|e| e.place.as_str())
                    .collect::<BTreeSet<_>>()
                    .len()
            },
        )
    }

    fn places(&self, entries: &[ScoredEntry]) -> Table {
        let dataset_count = self.sources.datasets.records.len();
        let mut table = self.with_scores(
            &self.sources.places,
            entries,
            |e| e.place.as_str(),
            |_| dataset_count,
        );

        let mut people: BTreeMap<&str, (Vec<&str>, Vec<&str>)> = BTreeMap::new();
        for submission in &self.sources.submissions.records {
            let Some(place) = submission.get("place") else {
                continue;
            };
            let (submitters, reviewers) = people.entry(place.as_str()).or_default();
            submitters.push(submission.get("submitter").map_or("", String::as_str));
            reviewers.push(submission.get("reviewer").map_or("", String::as_str));
        }

        table.columns.push("submitters".into());
        table.columns.push("reviewers".into());
        for record in &mut table.records {
            let Some((submitters, reviewers)) =
                record.get("id").and_then(|id| people.get(id.as_str()))
            else {
                continue;
            };
            let (submitters, reviewers) = (submitters.join(";"), reviewers.join(";"));
            record.insert("submitters".into(), submitters);
            record.insert("reviewers".into(), reviewers);
        }
        table
    }

    fn questions(&self) -> Table {
        let source = &self.sources.questions;
        let columns: Vec<String> = source.columns.iter().take(QUESTION_COLUMNS).cloned().collect();
        let icon = columns.get(ICON_COLUMN).cloned();

        let records = source
            .records
            .iter()
            .map(|q| {
                let mut record: Record = q
                    .iter()
                    .filter(|(k, _)| columns.contains(k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                if let Some(value) = icon.as_ref().and_then(|c| record.get_mut(c)) {
                    if let Some(renamed) = translate_icon(value) {
                        *value = renamed.to_string();
                    }
                }
                record
            })
            .collect();
        Table::new(columns, records)
    }

    fn summary(&self, entries: &[ScoredEntry]) -> Table {
        let mut columns: Vec<String> = vec!["id".into(), "title".into()];
        columns.extend(self.ordered_years().map(|y| self.year_column("value", y)));

        let mut rows: Vec<Record> = [
            ("places_count", "Number of Places"),
            ("entries_count", "Number of Entries"),
            ("open_count", "Number of Open Datasets"),
            ("open_percent", "Percent Open"),
        ]
        .iter()
        .map(|(id, title)| {
            Record::from([
                ("id".to_string(), id.to_string()),
                ("title".to_string(), title.to_string()),
            ])
        })
        .collect();

        for year in &self.years {
            let of_year: Vec<&ScoredEntry> = entries.iter().filter(|e| &e.year == year).collect();
            let places = of_year.iter().map(|e| e.place.as_str()).collect::<BTreeSet<_>>().len();
            let open = of_year.iter().filter(|e| e.is_open).count();
            let percent = if of_year.is_empty() {
                0
            } else {
                (100.0 * open as f64 / of_year.len() as f64).round() as i64
            };

            let column = self.year_column("value", year);
            let values = [places as i64, of_year.len() as i64, open as i64, percent];
            for (row, value) in rows.iter_mut().zip(values) {
                row.insert(column.clone(), value.to_string());
            }
        }
        Table::new(columns, rows)
    }
}

fn latest_before<'a>(
    populated: &'a BTreeMap<Key, ScoredEntry>,
    place: &str,
    dataset: &str,
    year: &str,
) -> Option<&'a ScoredEntry> {
    let year: i64 = year.parse().ok()?;
    populated
        .values()
        .filter(|e| e.place == place && e.dataset == dataset)
        .filter_map(|e| Some((e.year.parse::<i64>().ok()?, e)))
        .filter(|(y, _)| *y < year)
        .max_by_key(|(y, _)| *y)
        .map(|(_, e)| e)
}

/// Distinct scores ranked highest first; ties share a rank and the next
/// score takes the following one.
fn dense_ranks(scores: impl IntoIterator<Item = i64>) -> BTreeMap<i64, usize> {
    let distinct: BTreeSet<i64> = scores.into_iter().collect();
    distinct
        .into_iter()
        .rev()
        .enumerate()
        .map(|(i, score)| (score, i + 1))
        .collect()
}

fn normalize_answer(answer: &str) -> Option<&'static str> {
    match answer.trim().to_lowercase().as_str() {
        "yes" | "y" => Some("Y"),
        "no" | "n" => Some("N"),
        "unsure" | "?" => Some("?"),
        _ => None,
    }
}

fn translate_icon(icon: &str) -> Option<&'static str> {
    match icon {
        "file-alt" => Some("file-o"),
        "eye-open" => Some("eye"),
        "keyboard" => Some("keyboard-o"),
        "time" => Some("clock-o"),
        _ => None,
    }
}
