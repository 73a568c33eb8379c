use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::scoring::{DetectionConfig, ScoringConfig};

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Path to the JSON record store (defaults to ~/.config/site-risk/store.json)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scoring: Option<ScoringConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection: Option<DetectionConfig>,
}

impl Config {
    /// Scoring tables in effect: the configured ones, or the built-in defaults.
    pub fn effective_scoring(&self) -> ScoringConfig {
        self.scoring.clone().unwrap_or_default()
    }

    pub fn effective_detection(&self) -> DetectionConfig {
        self.detection.clone().unwrap_or_default()
    }

    pub fn store_path(&self) -> PathBuf {
        self.store.clone().unwrap_or_else(super::get_store_path)
    }
}
