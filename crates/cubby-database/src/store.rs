//! Metadata store traits consumed by the service layer.
//!
//! Every failure of an underlying backend surfaces as
//! [`ErrorKind::Database`](cubby_core::ErrorKind::Database).

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use cubby_core::{AppResult, Owner};
use cubby_entity::favorite::Favorite;
use cubby_entity::group_folder::{CreateGroupFolder, GroupFolder};
use cubby_entity::share::{Share, ShareReceiver};
use cubby_entity::user::User;

/// Persistence for [`Share`] records.
#[async_trait]
pub trait ShareStore: Send + Sync + Debug + 'static {
    /// Insert a new share.
    async fn insert(&self, share: &Share) -> AppResult<()>;

    /// Find a share by id.
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Share>>;

    /// Find a share with the same owner, receiver, and root path.
    /// Public links never match.
    async fn find_existing(
        &self,
        owner: &Owner,
        receiver: &ShareReceiver,
        file_path: &str,
    ) -> AppResult<Option<Share>>;

    /// Shares of `owner` rooted at or under `file_path`.
    async fn find_at_or_under(&self, owner: &Owner, file_path: &str) -> AppResult<Vec<Share>>;

    /// Shares addressed to a registered user.
    async fn find_by_receiver(&self, username: &str) -> AppResult<Vec<Share>>;

    /// Shares created on an owner's tree.
    async fn find_by_owner(&self, owner: &Owner) -> AppResult<Vec<Share>>;

    /// Delete a share; returns whether it existed.
    async fn delete(&self, id: &str) -> AppResult<bool>;
}

/// Persistence for [`GroupFolder`] records and their memberships.
#[async_trait]
pub trait GroupFolderStore: Send + Sync + Debug + 'static {
    /// Create a folder with its initial members in one transaction.
    async fn create(&self, data: &CreateGroupFolder) -> AppResult<GroupFolder>;

    /// Find a folder, members included.
    async fn find_by_id(&self, id: &str) -> AppResult<Option<GroupFolder>>;

    /// All folders, members included.
    async fn list_all(&self) -> AppResult<Vec<GroupFolder>>;

    /// Folders `username` belongs to, members included.
    async fn list_for_member(&self, username: &str) -> AppResult<Vec<GroupFolder>>;

    /// Add a member; returns `false` if already a member.
    async fn add_member(&self, id: &str, username: &str) -> AppResult<bool>;

    /// Remove a member; returns whether they were a member.
    async fn remove_member(&self, id: &str, username: &str) -> AppResult<bool>;

    /// Delete a folder, its memberships, and the shares into it, in one
    /// transaction. Returns whether the folder existed.
    async fn delete(&self, id: &str) -> AppResult<bool>;
}

/// Persistence for [`Favorite`] records.
#[async_trait]
pub trait FavoriteStore: Send + Sync + Debug + 'static {
    /// Insert a new favorite.
    async fn insert(&self, favorite: &Favorite) -> AppResult<()>;

    /// Find the favorite of `username` for a path.
    async fn find(&self, username: &str, owner: &Owner, file_path: &str)
    -> AppResult<Option<Favorite>>;

    /// Every favorite pointing at a path.
    async fn find_by_owner_and_path(&self, owner: &Owner, file_path: &str)
    -> AppResult<Vec<Favorite>>;

    /// Favorites created by a user.
    async fn find_by_username(&self, username: &str) -> AppResult<Vec<Favorite>>;

    /// Delete a user's favorite; returns whether it existed.
    async fn delete(&self, id: &str, username: &str) -> AppResult<bool>;
}

/// Read access to registered accounts.
#[async_trait]
pub trait UserStore: Send + Sync + Debug + 'static {
    /// Every registered username.
    async fn list_usernames(&self) -> AppResult<Vec<String>>;

    /// Find an account.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;
}

/// The full set of stores a deployment runs against.
#[derive(Debug, Clone)]
pub struct MetadataStores {
    /// Share records.
    pub shares: Arc<dyn ShareStore>,
    /// Group folder records.
    pub group_folders: Arc<dyn GroupFolderStore>,
    /// Favorite records.
    pub favorites: Arc<dyn FavoriteStore>,
    /// Accounts.
    pub users: Arc<dyn UserStore>,
}

impl MetadataStores {
    /// PostgreSQL-backed stores sharing one pool.
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        use crate::repositories::{
            FavoriteRepository, GroupFolderRepository, ShareRepository, UserRepository,
        };

        Self {
            shares: Arc::new(ShareRepository::new(pool.clone())),
            group_folders: Arc::new(GroupFolderRepository::new(pool.clone())),
            favorites: Arc::new(FavoriteRepository::new(pool.clone())),
            users: Arc::new(UserRepository::new(pool)),
        }
    }

    /// Stores backed by a single in-memory [`MemoryStore`](crate::MemoryStore).
    pub fn in_memory(store: Arc<crate::MemoryStore>) -> Self {
        Self {
            shares: store.clone(),
            group_folders: store.clone(),
            favorites: store.clone(),
            users: store,
        }
    }
}
