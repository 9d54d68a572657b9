//! Bounded background queue of owners waiting for a search reindex.

use std::sync::Arc;

use dashmap::DashSet;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use cubby_core::Owner;
use cubby_core::config::hooks::HookConfig;
use cubby_core::traits::SearchIndexer;

/// Handle for requesting reindex runs.
///
/// An owner already waiting in the queue is not queued twice. When the
/// queue is full the request is dropped and logged; the next mutation or
/// the scheduled full reindex picks the owner up again.
#[derive(Debug, Clone)]
pub struct ReindexQueue {
    tx: mpsc::Sender<Owner>,
    pending: Arc<DashSet<String>>,
}

impl ReindexQueue {
    /// Start the queue worker on the current runtime.
    pub fn spawn(indexer: Arc<dyn SearchIndexer>, config: &HookConfig) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let pending = Arc::new(DashSet::new());
        let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
        let handle = tokio::spawn(run(rx, indexer, Arc::clone(&pending), semaphore));
        (Self { tx, pending }, handle)
    }

    /// Ask for `owner` to be reindexed; returns whether it is now queued.
    pub fn request(&self, owner: &Owner) -> bool {
        let key = owner.key();
        if !self.pending.insert(key.clone()) {
            debug!(owner = %owner, "Reindex already pending");
            return true;
        }
        match self.tx.try_send(owner.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.pending.remove(&key);
                warn!(owner = %owner, "Reindex queue full; dropping request");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.pending.remove(&key);
                warn!(owner = %owner, "Reindex queue closed; dropping request");
                false
            }
        }
    }

    /// Owners waiting to be picked up.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

async fn run(
    mut rx: mpsc::Receiver<Owner>,
    indexer: Arc<dyn SearchIndexer>,
    pending: Arc<DashSet<String>>,
    semaphore: Arc<Semaphore>,
) {
    while let Some(owner) = rx.recv().await {
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            break;
        };
        // Cleared before the run starts so a mutation during indexing queues
        // another pass.
        pending.remove(&owner.key());

        let indexer = Arc::clone(&indexer);
        tokio::spawn(async move {
            let _permit = permit;
            match indexer.index_owner(&owner).await {
                Ok(()) => debug!(owner = %owner, "Reindex finished"),
                Err(e) => warn!(owner = %owner, error = %e, "Reindex failed"),
            }
        });
    }
    debug!("Reindex queue closed");
}
