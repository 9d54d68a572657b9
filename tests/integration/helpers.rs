//! Shared test helpers for integration tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;

use cubby_core::config::AppConfig;
use cubby_core::traits::{NodeKind, ScannedNode, SearchIndexer, SizeScanner, VolumeStats};
use cubby_core::{AppError, AppResult, Owner};
use cubby_database::{MemoryStore, MetadataStores};
use cubby_entity::user::User;
use cubby_service::search::NoopIndexer;
use cubby_service::notification::LogMailer;
use cubby_service::state::Collaborators;
use cubby_service::CoreState;
use cubby_storage::PathResolver;

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

/// Test application context
pub struct TestApp {
    /// Holds every owner root
    pub dir: tempfile::TempDir,
    /// In-memory metadata store behind `state`
    pub store: Arc<MemoryStore>,
    /// The wired services
    pub state: CoreState,
}

impl TestApp {
    /// Create a new test application with search disabled
    pub fn new() -> Self {
        Self::build(Arc::new(NoopIndexer), false)
    }

    /// Create a test application that reindexes through `indexer`
    pub fn with_indexer(indexer: Arc<dyn SearchIndexer>) -> Self {
        Self::build(indexer, true)
    }

    fn build(indexer: Arc<dyn SearchIndexer>, search: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.storage.users_root = dir.path().join("users");
        config.storage.groups_root = dir.path().join("groups");
        config.search.enabled = search;
        config.search.index_root = dir.path().join("search");

        let store = Arc::new(MemoryStore::new());
        let resolver = Arc::new(PathResolver::from_config(&config.storage));
        let state = CoreState::assemble(
            config,
            MetadataStores::in_memory(store.clone()),
            resolver,
            Collaborators {
                scanner: Arc::new(WalkScanner),
                indexer,
                mailer: Arc::new(LogMailer::new()),
            },
        );
        Self { dir, store, state }
    }

    /// Register an account
    pub async fn create_user(&self, username: &str) {
        self.store
            .insert_user(User {
                username: username.to_string(),
                email: Some(format!("{username}@example.com")),
                display_name: None,
            })
            .await;
    }

    /// Directory holding every user root
    pub fn users_root(&self) -> PathBuf {
        self.dir.path().join("users")
    }

    /// Write a small file through the mutation engine
    pub async fn write(&self, owner: &Owner, path: &str, content: &str) {
        self.state
            .files
            .add_or_overwrite_file_contents(owner, path, content.to_string(), None, false)
            .await
            .unwrap();
    }

    /// Read a whole file through the mutation engine
    pub async fn read(&self, owner: &Owner, path: &str) -> String {
        let mut stream = self.state.files.read(owner, path).await.unwrap();
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        String::from_utf8(out).unwrap()
    }
}
