//! Disk usage cache configuration.

use serde::{Deserialize, Serialize};

/// When full disk usage recomputes run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskUsageConfig {
    /// Cron expression (with seconds) for the full recompute of every owner.
    #[serde(default = "default_schedule")]
    pub recompute_schedule: String,
    /// Run one full pass when the server starts.
    #[serde(default = "default_true")]
    pub recompute_on_startup: bool,
}

impl Default for DiskUsageConfig {
    fn default() -> Self {
        Self {
            recompute_schedule: default_schedule(),
            recompute_on_startup: true,
        }
    }
}

fn default_schedule() -> String {
    "0 0 * * * *".to_string()
}

fn default_true() -> bool {
    true
}
