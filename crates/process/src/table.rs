//! CSV tables keyed by lowercased column name.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

pub type Record = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Table {
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self { columns, records }
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let file = std::fs::File::open(path)
            .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
        Self::from_reader(file).map_err(|e| format!("Failed to read {}: {}", path.display(), e))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, String> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);
        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| e.to_string())?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|e| e.to_string())?;
            let record = columns
                .iter()
                .cloned()
                .zip(row.iter().map(str::to_string))
                .collect();
            records.push(record);
        }
        Ok(Self { columns, records })
    }

    /// Values of `column` in row order, skipping rows without it.
    pub fn column(&self, column: &str) -> Vec<&str> {
        self.records
            .iter()
            .filter_map(|r| r.get(column).map(String::as_str))
            .collect()
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), String> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer);
        writer.write_record(&self.columns).map_err(|e| e.to_string())?;
        for record in &self.records {
            let row = self
                .columns
                .iter()
                .map(|c| record.get(c).map(String::as_str).unwrap_or(""));
            writer.write_record(row).map_err(|e| e.to_string())?;
        }
        writer.flush().map_err(|e| e.to_string())
    }

    pub fn save(&self, path: &Path) -> Result<(), String> {
        let file = std::fs::File::create(path)
            .map_err(|e| format!("Failed to create {}: {}", path.display(), e))?;
        self.write_to(file)
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
        tracing::info!(path = %path.display(), rows = self.records.len(), "wrote table");
        Ok(())
    }
}
