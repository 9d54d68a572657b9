//! Fixtures shared by the unit tests of this crate.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use cubby_core::config::AppConfig;
use cubby_core::traits::{NodeKind, ScannedNode, SizeScanner, VolumeStats};
use cubby_core::{AppError, AppResult};
use cubby_database::{MemoryStore, MetadataStores};
use cubby_storage::PathResolver;

use crate::notification::LogMailer;
use crate::search::NoopIndexer;
use crate::state::{Collaborators, CoreState};

/// Size scanner walking the tree in process, so tests do not depend on
/// the host's `find` and `df`.
#[derive(Debug, Default)]
pub struct WalkScanner;

#[async_trait]
impl SizeScanner for WalkScanner {
    async fn scan(&self, dir: &Path) -> AppResult<Vec<ScannedNode>> {
        let mut nodes = Vec::new();
        let mut pending = vec![dir.to_path_buf()];
        while let Some(current) = pending.pop() {
            let meta = std::fs::symlink_metadata(&current)
                .map_err(|e| AppError::external(format!("scan failed: {e}")))?;
            let kind = if meta.is_dir() {
                for child in std::fs::read_dir(&current)? {
                    pending.push(child?.path());
                }
                NodeKind::Directory
            } else if meta.is_file() {
                NodeKind::File
            } else {
                NodeKind::Other
            };
            nodes.push(ScannedNode {
                path: current,
                bytes: meta.len(),
                kind,
            });
        }
        Ok(nodes)
    }

    async fn volume(&self, _path: &Path) -> AppResult<VolumeStats> {
        Ok(VolumeStats {
            capacity: 10 << 30,
            available: 4 << 30,
        })
    }
}

/// A fully wired state over a temporary directory and an in-memory store.
pub struct Fixture {
    pub dir: tempfile::TempDir,
    pub store: Arc<MemoryStore>,
    pub state: CoreState,
}

impl Fixture {
    pub fn users_root(&self) -> PathBuf {
        self.dir.path().join("users")
    }
}

pub fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.storage.users_root = dir.path().join("users");
    config.storage.groups_root = dir.path().join("groups");
    config.search.index_root = dir.path().join("search");

    let store = Arc::new(MemoryStore::new());
    let resolver = Arc::new(PathResolver::from_config(&config.storage));
    let state = CoreState::assemble(
        config,
        MetadataStores::in_memory(store.clone()),
        resolver,
        Collaborators {
            scanner: Arc::new(WalkScanner),
            indexer: Arc::new(NoopIndexer),
            mailer: Arc::new(LogMailer::new()),
        },
    );
    Fixture { dir, store, state }
}
