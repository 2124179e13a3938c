use serde::{Deserialize, Serialize};

use crate::state::{UiState, DEFAULT_YEAR};

/// An info trigger in the meta section: a title, markdown text, and whether
/// clicking it should also produce embed code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoTrigger {
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub embed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Year selected when the URL does not name one.
    pub current_year: String,
    /// Scores painted as legend swatches.
    pub legend_scores: Vec<i64>,
    /// Origin embed iframes point at.
    pub embed_base_url: String,
    pub info_triggers: Vec<InfoTrigger>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            current_year: DEFAULT_YEAR.to_string(),
            legend_scores: vec![0, 20, 40, 60, 80, 100],
            embed_base_url: String::new(),
            info_triggers: vec![
                InfoTrigger {
                    title: "About".to_string(),
                    text: "The **Open Data Index** scores how open key government datasets are in each place.".to_string(),
                    embed: false,
                },
                InfoTrigger {
                    title: "Embed".to_string(),
                    text: "Copy the code below to embed this map.".to_string(),
                    embed: true,
                },
            ],
        }
    }
}

impl DashboardConfig {
    pub fn defaults(&self) -> UiState {
        UiState::defaults_for_year(&self.current_year)
    }
}
