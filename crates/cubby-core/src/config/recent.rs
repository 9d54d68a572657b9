//! Recent-files query configuration.

use serde::{Deserialize, Serialize};

/// Defaults for the recent-files listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentConfig {
    /// Modification window in days.
    #[serde(default = "default_days")]
    pub days: u32,
    /// Maximum entries returned.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for RecentConfig {
    fn default() -> Self {
        Self {
            days: default_days(),
            max_results: default_max_results(),
        }
    }
}

fn default_days() -> u32 {
    3
}

fn default_max_results() -> usize {
    100
}
