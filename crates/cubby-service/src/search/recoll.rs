//! Recoll-backed full-text indexing.
//!
//! Each owner gets its own configuration directory under the index root
//! holding a `recoll.conf` whose `topdirs` lists the trees to index, plus
//! the index database `recollindex` maintains next to it.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};

use cubby_core::config::search::SearchConfig;
use cubby_core::config::tools::ToolsConfig;
use cubby_core::traits::SearchIndexer;
use cubby_core::{AppError, AppResult, Owner};
use cubby_database::store::GroupFolderStore;
use cubby_storage::PathResolver;
use cubby_storage::tools::ToolRunner;

/// Runs `recollindex` per owner.
#[derive(Debug, Clone)]
pub struct RecollIndexer {
    runner: ToolRunner,
    recollindex: String,
    index_root: PathBuf,
    resolver: Arc<PathResolver>,
    group_folders: Arc<dyn GroupFolderStore>,
}

impl RecollIndexer {
    /// Create an indexer writing configuration under `search.index_root`.
    pub fn new(
        runner: ToolRunner,
        tools: &ToolsConfig,
        search: &SearchConfig,
        resolver: Arc<PathResolver>,
        group_folders: Arc<dyn GroupFolderStore>,
    ) -> Self {
        Self {
            runner,
            recollindex: tools.recollindex.clone(),
            index_root: search.index_root.clone(),
            resolver,
            group_folders,
        }
    }

    /// Configuration directory of an owner's index.
    pub fn config_dir(&self, owner: &Owner) -> PathBuf {
        match owner {
            Owner::User(name) => self.index_root.join("users").join(name),
            Owner::GroupFolder(id) => self.index_root.join("groupfolders").join(id),
        }
    }

    async fn run(&self, owner: &Owner, topdirs: Vec<PathBuf>) -> AppResult<()> {
        let config_dir = self.config_dir(owner);
        fs::create_dir_all(&config_dir)
            .await
            .map_err(|e| AppError::from_io(e, &config_dir.display().to_string()))?;

        let mut existing = Vec::with_capacity(topdirs.len());
        for dir in topdirs {
            if fs::try_exists(&dir).await.unwrap_or(false) {
                existing.push(dir);
            }
        }
        if existing.is_empty() {
            debug!(owner = %owner, "Nothing to index yet");
            return Ok(());
        }

        let config_file = config_dir.join("recoll.conf");
        fs::write(&config_file, render_config(&existing))
            .await
            .map_err(|e| AppError::from_io(e, &config_file.display().to_string()))?;

        self.runner
            .run(&self.recollindex, [OsStr::new("-c"), config_dir.as_os_str()])
            .await?;
        info!(owner = %owner, topdirs = existing.len(), "Search index refreshed");
        Ok(())
    }
}

#[async_trait]
impl SearchIndexer for RecollIndexer {
    async fn index_user(&self, username: &str) -> AppResult<()> {
        let owner = Owner::user(username);
        let mut topdirs = vec![self.resolver.root(&owner)?];
        for group in self.group_folders.list_for_member(username).await? {
            topdirs.push(self.resolver.root(&group.owner())?);
        }
        self.run(&owner, topdirs).await
    }

    async fn index_group_folder(&self, id: &str) -> AppResult<()> {
        let owner = Owner::group_folder(id);
        let root = self.resolver.root(&owner)?;
        self.run(&owner, vec![root]).await
    }
}

/// `recoll.conf` content listing `topdirs`, quoting paths with spaces.
fn render_config(topdirs: &[PathBuf]) -> String {
    let dirs: Vec<String> = topdirs
        .iter()
        .map(|dir| {
            let dir = dir.display().to_string();
            if dir.contains(char::is_whitespace) {
                format!("\"{dir}\"")
            } else {
                dir
            }
        })
        .collect();
    format!("topdirs = {}\n", dirs.join(" "))
}
