//! External tool configuration.

use serde::{Deserialize, Serialize};

/// Binaries invoked as child processes, and the shared timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// GNU `find`, used for size scans and recent-file queries.
    #[serde(default = "default_find")]
    pub find: String,
    /// `df`, used for volume capacity.
    #[serde(default = "default_df")]
    pub df: String,
    /// `tar`, used for the tar archive family.
    #[serde(default = "default_tar")]
    pub tar: String,
    /// `unzip`.
    #[serde(default = "default_unzip")]
    pub unzip: String,
    /// `7z`.
    #[serde(default = "default_seven_zip")]
    pub seven_zip: String,
    /// `recollindex`.
    #[serde(default = "default_recollindex")]
    pub recollindex: String,
    /// Seconds before a tool invocation is killed.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            find: default_find(),
            df: default_df(),
            tar: default_tar(),
            unzip: default_unzip(),
            seven_zip: default_seven_zip(),
            recollindex: default_recollindex(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_find() -> String {
    "find".to_string()
}

fn default_df() -> String {
    "df".to_string()
}

fn default_tar() -> String {
    "tar".to_string()
}

fn default_unzip() -> String {
    "unzip".to_string()
}

fn default_seven_zip() -> String {
    "7z".to_string()
}

fn default_recollindex() -> String {
    "recollindex".to_string()
}

fn default_timeout() -> u64 {
    300
}
