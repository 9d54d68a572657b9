//! Search indexer configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Full-text indexer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Whether mutations trigger reindexing.
    #[serde(default)]
    pub enabled: bool,
    /// Directory holding one indexer config directory per owner.
    #[serde(default = "default_index_root")]
    pub index_root: PathBuf,
    /// Cron expression (with seconds) for the full reindex.
    #[serde(default = "default_schedule")]
    pub reindex_schedule: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            index_root: default_index_root(),
            reindex_schedule: default_schedule(),
        }
    }
}

fn default_index_root() -> PathBuf {
    PathBuf::from("./data/search")
}

fn default_schedule() -> String {
    "0 30 3 * * *".to_string()
}
