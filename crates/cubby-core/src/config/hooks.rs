//! Change hook configuration.

use serde::{Deserialize, Serialize};

/// Bounds for the background reindex queue fed by mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookConfig {
    /// Pending owners held before new requests are dropped.
    #[serde(default = "default_capacity")]
    pub queue_capacity: usize,
    /// Reindex runs allowed at the same time.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_capacity(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_capacity() -> usize {
    256
}

fn default_concurrency() -> usize {
    2
}
