//! Change hook run at the end of every mutation.

use std::sync::Arc;

use tracing::debug;

use cubby_cache::DiskUsageCache;
use cubby_core::Owner;
use cubby_core::events::FileEvent;

use super::reindex::ReindexQueue;

/// Refreshes derived state after a mutation.
///
/// Disk usage of every affected directory is recomputed before
/// [`dispatch`](Self::dispatch) returns, unless a full scan of the owner is
/// running; that scan then rescans the directory when it finishes.
/// Reindexing is handed to the background [`ReindexQueue`] when search is
/// enabled.
#[derive(Debug, Clone)]
pub struct ChangeHook {
    usage: Arc<DiskUsageCache>,
    reindex: Option<ReindexQueue>,
}

impl ChangeHook {
    /// Create a hook; `reindex` is `None` when search is disabled.
    pub fn new(usage: Arc<DiskUsageCache>, reindex: Option<ReindexQueue>) -> Self {
        Self { usage, reindex }
    }

    /// Apply `event`. Never fails; collaborators log their own errors.
    pub async fn dispatch(&self, event: &FileEvent) {
        debug!(?event, "Dispatching change hook");
        for (owner, dir) in event.affected_directories() {
            self.usage.recompute_directory(&owner, &dir).await;
        }
        if let Some(queue) = &self.reindex {
            for owner in event.affected_owners() {
                queue.request(&owner);
            }
        }
    }

    /// Queue a reindex of `owner` outside of any mutation.
    pub fn request_reindex(&self, owner: &Owner) -> bool {
        self.reindex
            .as_ref()
            .is_some_and(|queue| queue.request(owner))
    }

    /// Owners waiting for a reindex; `None` when search is disabled.
    pub fn pending_reindexes(&self) -> Option<usize> {
        self.reindex.as_ref().map(ReindexQueue::pending)
    }

    /// The disk usage cache this hook refreshes.
    pub fn usage(&self) -> &Arc<DiskUsageCache> {
        &self.usage
    }
}
