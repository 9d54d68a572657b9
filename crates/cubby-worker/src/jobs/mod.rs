//! Built-in periodic tasks.

pub mod disk_usage;
pub mod search_index;

use cubby_core::Owner;
use cubby_database::{GroupFolderStore, UserStore};

use crate::executor::TaskError;

pub use disk_usage::DiskUsageTask;
pub use search_index::SearchIndexTask;

/// Every registered user followed by every group folder.
pub(crate) async fn all_owners(
    users: &dyn UserStore,
    group_folders: &dyn GroupFolderStore,
) -> Result<Vec<Owner>, TaskError> {
    let mut owners: Vec<Owner> = users
        .list_usernames()
        .await
        .map_err(TaskError::Owners)?
        .into_iter()
        .map(Owner::user)
        .collect();
    owners.extend(
        group_folders
            .list_all()
            .await
            .map_err(TaskError::Owners)?
            .iter()
            .map(|folder| folder.owner()),
    );
    Ok(owners)
}

/// Executor holding every built-in task wired against `state`.
///
/// The reindex task is only registered when search is enabled.
pub fn default_executor(state: &cubby_service::CoreState) -> crate::executor::TaskExecutor {
    use std::sync::Arc;

    let mut executor = crate::executor::TaskExecutor::new();
    executor.register(Arc::new(DiskUsageTask::new(
        Arc::clone(&state.usage),
        Arc::clone(&state.stores.users),
        Arc::clone(&state.stores.group_folders),
    )));
    if state.config.search.enabled {
        executor.register(Arc::new(SearchIndexTask::new(
            Arc::clone(&state.indexer),
            Arc::clone(&state.stores.users),
            Arc::clone(&state.stores.group_folders),
        )));
    }
    executor
}
