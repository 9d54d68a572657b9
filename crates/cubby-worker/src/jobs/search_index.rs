//! Full search reindex of every owner.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use cubby_core::traits::SearchIndexer;
use cubby_database::{GroupFolderStore, UserStore};

use crate::executor::{TaskError, TaskHandler, TaskSummary};

/// Task name used by the scheduler.
pub const TASK_NAME: &str = "search_reindex";

/// Reindexes every user and group folder, one after another.
#[derive(Debug)]
pub struct SearchIndexTask {
    indexer: Arc<dyn SearchIndexer>,
    users: Arc<dyn UserStore>,
    group_folders: Arc<dyn GroupFolderStore>,
}

impl SearchIndexTask {
    /// Create the task.
    pub fn new(
        indexer: Arc<dyn SearchIndexer>,
        users: Arc<dyn UserStore>,
        group_folders: Arc<dyn GroupFolderStore>,
    ) -> Self {
        Self {
            indexer,
            users,
            group_folders,
        }
    }
}

#[async_trait]
impl TaskHandler for SearchIndexTask {
    fn name(&self) -> &str {
        TASK_NAME
    }

    async fn run(&self) -> Result<TaskSummary, TaskError> {
        let owners = super::all_owners(self.users.as_ref(), self.group_folders.as_ref()).await?;

        let mut summary = TaskSummary::default();
        for owner in &owners {
            match self.indexer.index_owner(owner).await {
                Ok(()) => summary.processed += 1,
                Err(e) => {
                    warn!(owner = %owner, error = %e, "Reindex failed");
                    summary.failed += 1;
                }
            }
        }
        Ok(summary)
    }
}
