//! Full disk usage recompute of every owner.

use std::sync::Arc;

use async_trait::async_trait;

use cubby_cache::DiskUsageCache;
use cubby_database::{GroupFolderStore, UserStore};

use crate::executor::{TaskError, TaskHandler, TaskSummary};

/// Task name used by the scheduler.
pub const TASK_NAME: &str = "disk_usage_recompute";

/// Rebuilds the cached tree of every user and group folder.
///
/// Owners are processed one at a time so a full pass never runs more than
/// one scan concurrently. A failed scan keeps that owner's previous values.
#[derive(Debug)]
pub struct DiskUsageTask {
    usage: Arc<DiskUsageCache>,
    users: Arc<dyn UserStore>,
    group_folders: Arc<dyn GroupFolderStore>,
}

impl DiskUsageTask {
    /// Create the task.
    pub fn new(
        usage: Arc<DiskUsageCache>,
        users: Arc<dyn UserStore>,
        group_folders: Arc<dyn GroupFolderStore>,
    ) -> Self {
        Self {
            usage,
            users,
            group_folders,
        }
    }
}

#[async_trait]
impl TaskHandler for DiskUsageTask {
    fn name(&self) -> &str {
        TASK_NAME
    }

    async fn run(&self) -> Result<TaskSummary, TaskError> {
        let owners = super::all_owners(self.users.as_ref(), self.group_folders.as_ref()).await?;

        let mut summary = TaskSummary::default();
        for owner in &owners {
            self.usage.recompute(owner).await;
            summary.processed += 1;
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use cubby_core::traits::{NodeKind, OwnerRoots, ScannedNode, SizeScanner, VolumeStats};
    use cubby_core::{AppResult, Owner};
    use cubby_database::MemoryStore;
    use cubby_entity::group_folder::CreateGroupFolder;
    use cubby_entity::user::User;

    use super::*;

    /// Reports one 10-byte file in every scanned directory.
    #[derive(Debug, Default)]
    struct OneFileScanner {
        scans: AtomicUsize,
    }

    #[async_trait]
    impl SizeScanner for OneFileScanner {
        async fn scan(&self, dir: &Path) -> AppResult<Vec<ScannedNode>> {
            self.scans.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                ScannedNode {
                    path: dir.to_path_buf(),
                    bytes: 4096,
                    kind: NodeKind::Directory,
                },
                ScannedNode {
                    path: dir.join("a.bin"),
                    bytes: 10,
                    kind: NodeKind::File,
                },
            ])
        }

        async fn volume(&self, _path: &Path) -> AppResult<VolumeStats> {
            Ok(VolumeStats {
                capacity: 1000,
                available: 500,
            })
        }
    }

    #[derive(Debug)]
    struct Roots(PathBuf);

    impl OwnerRoots for Roots {
        fn root_of(&self, owner: &Owner) -> AppResult<PathBuf> {
            Ok(self.0.join(owner.id()))
        }
    }

    #[tokio::test]
    async fn test_recomputes_users_and_group_folders() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        for name in ["alice", "bob"] {
            store
                .insert_user(User {
                    username: name.to_string(),
                    email: None,
                    display_name: None,
                })
                .await;
            std::fs::create_dir_all(dir.path().join(name)).unwrap();
        }
        store
            .create(&CreateGroupFolder {
                id: "eng".to_string(),
                name: "Engineering".to_string(),
                folder_path: None,
                members: vec!["alice".to_string()],
            })
            .await
            .unwrap();
        std::fs::create_dir_all(dir.path().join("eng")).unwrap();

        let scanner = Arc::new(OneFileScanner::default());
        let usage = Arc::new(DiskUsageCache::new(
            scanner.clone(),
            Arc::new(Roots(dir.path().to_path_buf())),
        ));
        let task = DiskUsageTask::new(usage.clone(), store.clone(), store);

        let summary = task.run().await.unwrap();
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.failed, 0);
        assert_eq!(scanner.scans.load(Ordering::SeqCst), 3);
        assert!(usage.is_populated(&Owner::user("bob")));
        assert_eq!(usage.get(&Owner::group_folder("eng")).await.used, 10);
    }
}
