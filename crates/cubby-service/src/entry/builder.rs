//! Builds [`Entry`] views from stat data and metadata overlays.

use std::fs::Metadata;
use std::sync::Arc;

use tracing::{debug, warn};

use cubby_cache::DiskUsageCache;
use cubby_core::types::path;
use cubby_core::{AppResult, Owner};
use cubby_database::store::{FavoriteStore, GroupFolderStore, ShareStore};
use cubby_entity::entry::{DIRECTORY_MIME, Entry, EntryHead};
use cubby_entity::group_folder::GroupFolder;
use cubby_storage::local::{mime_for, mtime_of};
use cubby_storage::{LocalFs, PathResolver, PhysicalPath};

/// Produces entries for `get` and `head`.
#[derive(Debug, Clone)]
pub struct EntryBuilder {
    resolver: Arc<PathResolver>,
    fs: LocalFs,
    usage: Arc<DiskUsageCache>,
    shares: Arc<dyn ShareStore>,
    favorites: Arc<dyn FavoriteStore>,
    group_folders: Arc<dyn GroupFolderStore>,
}

impl EntryBuilder {
    /// Create a builder.
    pub fn new(
        resolver: Arc<PathResolver>,
        usage: Arc<DiskUsageCache>,
        shares: Arc<dyn ShareStore>,
        favorites: Arc<dyn FavoriteStore>,
        group_folders: Arc<dyn GroupFolderStore>,
    ) -> Self {
        Self {
            resolver,
            fs: LocalFs::new(),
            usage,
            shares,
            favorites,
            group_folders,
        }
    }

    /// Full entry for a node, with overlays and, for directories, children.
    ///
    /// Children that vanish or fail to stat while the listing is built are
    /// skipped.
    pub async fn get(&self, owner: &Owner, relative: &str) -> AppResult<Entry> {
        let target = self.resolver.resolve(owner, relative).await?;
        let metadata = self.fs.stat(&target).await?;
        let group = self.group_of(owner).await?;

        let mut entry = self.with_overlays(&target, &metadata, group.clone()).await?;
        if !metadata.is_dir() {
            return Ok(entry);
        }

        self.usage.ensure_populated(owner).await;
        entry.size = self.usage.get_directory(owner, target.relative());

        for child in self.fs.list_dir(&target).await? {
            let Some(child_relative) = path::join(target.relative(), &child.name) else {
                continue;
            };
            let built = match self.resolver.resolve(owner, &child_relative).await {
                Ok(child_path) => {
                    self.with_overlays(&child_path, &child.metadata, group.clone())
                        .await
                }
                Err(e) => Err(e),
            };
            match built {
                Ok(child_entry) => entry.files.push(child_entry),
                Err(e) => {
                    warn!(owner = %owner, path = %child_relative, error = %e, "Skipping child entry");
                }
            }
        }
        Ok(entry)
    }

    /// Metadata only: no overlays, no children, no cache population.
    pub async fn head(&self, owner: &Owner, relative: &str) -> AppResult<EntryHead> {
        let target = self.resolver.resolve(owner, relative).await?;
        let metadata = self.fs.stat(&target).await?;
        let is_directory = metadata.is_dir();
        Ok(EntryHead {
            file_name: target.file_name().to_string(),
            file_path: target.relative().to_string(),
            owner: owner.clone(),
            size: if is_directory {
                self.usage.get_directory(owner, target.relative())
            } else {
                metadata.len()
            },
            mtime: mtime_of(&metadata),
            is_directory,
            is_file: metadata.is_file(),
            mime_type: mime_of(&target, is_directory),
        })
    }

    async fn with_overlays(
        &self,
        target: &PhysicalPath,
        metadata: &Metadata,
        group: Option<GroupFolder>,
    ) -> AppResult<Entry> {
        let owner = target.owner();
        let is_directory = metadata.is_dir();

        let is_binary = if metadata.is_file() {
            self.fs.looks_binary(target).await.unwrap_or_else(|e| {
                debug!(path = target.relative(), error = %e, "Could not sample file content");
                false
            })
        } else {
            false
        };

        let size = if is_directory {
            self.usage.get_directory(owner, target.relative())
        } else {
            metadata.len()
        };

        Ok(Entry {
            file_name: target.file_name().to_string(),
            file_path: target.relative().to_string(),
            owner: owner.clone(),
            size,
            mtime: mtime_of(metadata),
            is_directory,
            is_file: metadata.is_file(),
            is_binary,
            mime_type: mime_of(target, is_directory),
            files: Vec::new(),
            shared_with: self.shares.find_at_or_under(owner, target.relative()).await?,
            favorites: self
                .favorites
                .find_by_owner_and_path(owner, target.relative())
                .await?,
            group,
        })
    }

    async fn group_of(&self, owner: &Owner) -> AppResult<Option<GroupFolder>> {
        match owner.group_folder_id() {
            Some(id) => self.group_folders.find_by_id(id).await,
            None => Ok(None),
        }
    }
}

fn mime_of(target: &PhysicalPath, is_directory: bool) -> String {
    if is_directory {
        DIRECTORY_MIME.to_string()
    } else {
        mime_for(target.file_name())
    }
}
