//! Mutations queue a background reindex of the owners they touch.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use cubby_core::{AppResult, Owner};
use cubby_core::traits::SearchIndexer;

use crate::helpers::TestApp;

#[derive(Debug, Default)]
struct RecordingIndexer {
    seen: Mutex<Vec<String>>,
}

impl RecordingIndexer {
    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchIndexer for RecordingIndexer {
    async fn index_user(&self, username: &str) -> AppResult<()> {
        self.seen.lock().unwrap().push(format!("user:{username}"));
        Ok(())
    }

    async fn index_group_folder(&self, id: &str) -> AppResult<()> {
        self.seen.lock().unwrap().push(format!("groupfolder:{id}"));
        Ok(())
    }
}

async fn wait_for(indexer: &RecordingIndexer, key: &str) -> bool {
    for _ in 0..100 {
        if indexer.seen().iter().any(|k| k == key) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn test_cross_owner_copy_reindexes_destination() {
    let indexer = Arc::new(RecordingIndexer::default());
    let app = TestApp::with_indexer(indexer.clone());
    let alice = Owner::user("alice");
    let bob = Owner::user("bob");

    app.write(&alice, "/paper.txt", "abstract").await;
    assert!(wait_for(&indexer, "user:alice").await);

    app.state
        .files
        .copy_to(&alice, "/paper.txt", &bob, "/paper.txt")
        .await
        .unwrap();
    assert!(wait_for(&indexer, "user:bob").await);
    assert_eq!(app.read(&bob, "/paper.txt").await, "abstract");
}

#[tokio::test]
async fn test_search_disabled_never_queues() {
    let app = TestApp::new();
    app.write(&Owner::user("alice"), "/a.txt", "a").await;
    assert_eq!(app.state.hook.pending_reindexes(), None);
    assert!(!app.state.hook.request_reindex(&Owner::user("alice")));
}
