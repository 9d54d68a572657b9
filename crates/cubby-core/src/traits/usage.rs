//! Size measurement and owner root lookup.

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::types::Owner;

/// Kind of node reported by a size scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// A directory.
    Directory,
    /// A regular file.
    File,
    /// Anything else (symlink, socket, ...); never counted.
    Other,
}

/// One node reported by a size scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedNode {
    /// Absolute path of the node.
    pub path: PathBuf,
    /// Apparent size in bytes.
    pub bytes: u64,
    /// Node kind.
    pub kind: NodeKind,
}

/// Capacity of the volume holding a path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeStats {
    /// Total bytes on the volume.
    pub capacity: u64,
    /// Bytes available to unprivileged users.
    pub available: u64,
}

/// Recursive size measurement, usually backed by an external tool.
#[async_trait]
pub trait SizeScanner: Send + Sync + Debug + 'static {
    /// Every file and directory under `dir`, including `dir` itself.
    async fn scan(&self, dir: &Path) -> AppResult<Vec<ScannedNode>>;

    /// Capacity and availability of the volume holding `path`.
    async fn volume(&self, path: &Path) -> AppResult<VolumeStats>;
}

/// Maps an owner to its root directory without touching the filesystem.
pub trait OwnerRoots: Send + Sync + Debug + 'static {
    /// Absolute root directory of `owner`.
    fn root_of(&self, owner: &Owner) -> AppResult<PathBuf>;
}
