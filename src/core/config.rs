use serde::{Serialize, Deserialize};
use crate::core::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bulk_threshold: usize,             // put_many above this size sorts ordered indexes once
    pub exclude_snapshot_from_eviction: bool, // records reloaded from a snapshot are never evicted
    pub parallel_full_text: bool,          // run structured and full-text halves on rayon
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bulk_threshold: 50,
            exclude_snapshot_from_eviction: false,
            parallel_full_text: true,
        }
    }
}

impl Config {
    /// Read a config from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FullTextConfig {
    pub enabled: bool,
    pub analyzer: String,     // name in the analyzer registry
    pub max_results: usize,   // hits kept per full-text search
}

impl Default for FullTextConfig {
    fn default() -> Self {
        FullTextConfig {
            enabled: false,
            analyzer: "standard".to_string(),
            max_results: 1000,
        }
    }
}

impl FullTextConfig {
    pub fn disabled() -> Self {
        FullTextConfig::default()
    }

    pub fn enabled() -> Self {
        FullTextConfig {
            enabled: true,
            ..FullTextConfig::default()
        }
    }

    pub fn with_analyzer(mut self, analyzer: &str) -> Self {
        self.analyzer = analyzer.to_string();
        self
    }
}
