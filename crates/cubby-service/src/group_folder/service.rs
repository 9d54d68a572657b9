//! Group folder lifecycle and membership.

use std::sync::Arc;

use tracing::info;

use cubby_cache::DiskUsageCache;
use cubby_core::{AppError, AppResult, Owner};
use cubby_database::store::GroupFolderStore;
use cubby_entity::group_folder::{CreateGroupFolder, GroupFolder};
use cubby_storage::{LocalFs, PathResolver};

/// Creates and removes group folders and manages their members.
#[derive(Debug, Clone)]
pub struct GroupFolderService {
    store: Arc<dyn GroupFolderStore>,
    resolver: Arc<PathResolver>,
    usage: Arc<DiskUsageCache>,
    fs: LocalFs,
}

impl GroupFolderService {
    /// Create the service.
    pub fn new(
        store: Arc<dyn GroupFolderStore>,
        resolver: Arc<PathResolver>,
        usage: Arc<DiskUsageCache>,
    ) -> Self {
        Self {
            store,
            resolver,
            usage,
            fs: LocalFs::new(),
        }
    }

    /// Register every custom folder path with the resolver.
    ///
    /// Run once at startup, before any request touches a group folder.
    pub async fn load_roots(&self) -> AppResult<usize> {
        let mut registered = 0;
        for group in self.store.list_all().await? {
            if let Some(folder_path) = custom_path(&group) {
                self.resolver.register_group_root(&group.id, folder_path);
                registered += 1;
            }
        }
        info!(registered, "Loaded custom group folder roots");
        Ok(registered)
    }

    /// Create a group folder. Its root is created when it has members.
    pub async fn add(&self, data: CreateGroupFolder) -> AppResult<GroupFolder> {
        let owner = Owner::group_folder(&data.id);
        if !owner.has_valid_id() {
            return Err(AppError::invalid_path(format!(
                "Invalid group folder id: {:?}",
                data.id
            )));
        }
        if self.store.find_by_id(&data.id).await?.is_some() {
            return Err(AppError::already_exists(format!(
                "Group folder {} already exists",
                data.id
            )));
        }

        let group = self.store.create(&data).await?;
        if let Some(folder_path) = custom_path(&group) {
            self.resolver.register_group_root(&group.id, folder_path);
        }
        if !group.members.is_empty() {
            self.resolver.resolve(&owner, "/").await?;
        }

        info!(group_folder = %group.id, members = group.members.len(), "Group folder created");
        Ok(group)
    }

    /// Find a group folder.
    pub async fn get(&self, id: &str) -> AppResult<GroupFolder> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Group folder {id} not found")))
    }

    /// Every group folder.
    pub async fn list(&self) -> AppResult<Vec<GroupFolder>> {
        self.store.list_all().await
    }

    /// Group folders `username` belongs to.
    pub async fn list_for_member(&self, username: &str) -> AppResult<Vec<GroupFolder>> {
        self.store.list_for_member(username).await
    }

    /// Whether `username` belongs to the group folder.
    pub async fn is_member(&self, id: &str, username: &str) -> AppResult<bool> {
        Ok(self.get(id).await?.has_member(username))
    }

    /// Add a member, creating the root on first touch.
    pub async fn add_member(&self, id: &str, username: &str) -> AppResult<()> {
        let group = self.get(id).await?;
        if !self.store.add_member(id, username).await? {
            return Err(AppError::already_exists(format!(
                "{username} is already a member of {id}"
            )));
        }
        self.resolver.resolve(&group.owner(), "/").await?;
        info!(group_folder = id, username, "Member added");
        Ok(())
    }

    /// Remove a member. The tree is left untouched.
    pub async fn remove_member(&self, id: &str, username: &str) -> AppResult<()> {
        if !self.store.remove_member(id, username).await? {
            return Err(AppError::not_found(format!(
                "{username} is not a member of {id}"
            )));
        }
        info!(group_folder = id, username, "Member removed");
        Ok(())
    }

    /// Delete a group folder together with its whole tree. Irreversible.
    pub async fn remove(&self, id: &str) -> AppResult<()> {
        let group = self.get(id).await?;
        let owner = group.owner();

        let root = self.resolver.resolve(&owner, "/").await?;
        self.fs.remove_all(&root).await?;
        self.store.delete(id).await?;

        self.usage.forget(&owner);
        self.resolver.forget_group_root(id);
        info!(group_folder = id, root = %root.absolute().display(), "Group folder removed");
        Ok(())
    }
}

fn custom_path(group: &GroupFolder) -> Option<&str> {
    group
        .folder_path
        .as_deref()
        .filter(|p| !p.trim().is_empty())
}
