use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Survey spreadsheets, exported as CSV.
#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub submissions: String,
    pub entries: String,
    pub questions: String,
    pub datasets: String,
    pub places: String,
}

impl Database {
    /// `(file name, url)` for every source, in download order.
    pub fn sources(&self) -> [(&'static str, &str); 5] {
        [
            ("submissions.csv", &self.submissions),
            ("entries.csv", &self.entries),
            ("questions.csv", &self.questions),
            ("datasets.csv", &self.datasets),
            ("places.csv", &self.places),
        ]
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: Database,
    #[serde(default = "default_tmp_path")]
    pub tmp_path: PathBuf,
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
    #[serde(default = "default_current_year")]
    pub current_year: String,
    #[serde(default = "default_years")]
    pub years: Vec<String>,
}

fn default_tmp_path() -> PathBuf {
    PathBuf::from("tmp")
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data")
}

fn default_current_year() -> String {
    "2014".to_string()
}

fn default_years() -> Vec<String> {
    vec!["2014".to_string(), "2013".to_string()]
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
        let config: Config = serde_json::from_str(&raw)
            .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?;
        if !config.years.contains(&config.current_year) {
            return Err(format!(
                "current_year {} is not one of the configured years",
                config.current_year
            ));
        }
        Ok(config)
    }
}
