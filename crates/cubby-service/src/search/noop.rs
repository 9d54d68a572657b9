//! Indexer used when search is disabled.

use async_trait::async_trait;
use tracing::trace;

use cubby_core::AppResult;
use cubby_core::traits::SearchIndexer;

/// Accepts every request and does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopIndexer;

#[async_trait]
impl SearchIndexer for NoopIndexer {
    async fn index_user(&self, username: &str) -> AppResult<()> {
        trace!(username, "Search disabled; skipping index");
        Ok(())
    }

    async fn index_group_folder(&self, id: &str) -> AppResult<()> {
        trace!(group_folder = id, "Search disabled; skipping index");
        Ok(())
    }
}
