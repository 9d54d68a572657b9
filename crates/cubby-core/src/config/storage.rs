//! Owner root directory configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where owner trees live on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Parent directory of every user's home tree.
    #[serde(default = "default_users_root")]
    pub users_root: PathBuf,
    /// Parent directory of group folders without a custom path.
    #[serde(default = "default_groups_root")]
    pub groups_root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            users_root: default_users_root(),
            groups_root: default_groups_root(),
        }
    }
}

fn default_users_root() -> PathBuf {
    PathBuf::from("./data/users")
}

fn default_groups_root() -> PathBuf {
    PathBuf::from("./data/groupfolders")
}
