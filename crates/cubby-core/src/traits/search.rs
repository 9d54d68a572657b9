//! Full-text search indexer trigger.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::Owner;

/// Refreshes the search index for an owner.
///
/// Callers treat failures as best-effort: they are logged, never surfaced
/// to the mutation that triggered them.
#[async_trait]
pub trait SearchIndexer: Send + Sync + Debug + 'static {
    /// Reindex a user's home plus the group folders they belong to.
    async fn index_user(&self, username: &str) -> AppResult<()>;

    /// Reindex a group folder.
    async fn index_group_folder(&self, id: &str) -> AppResult<()>;

    /// Reindex whichever tree `owner` names.
    async fn index_owner(&self, owner: &Owner) -> AppResult<()> {
        match owner {
            Owner::User(name) => self.index_user(name).await,
            Owner::GroupFolder(id) => self.index_group_folder(id).await,
        }
    }
}
