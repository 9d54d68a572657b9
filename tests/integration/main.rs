//! End-to-end scenarios over a fully wired service graph.

mod helpers;

mod files_test;
mod group_folder_test;
mod reindex_test;
mod share_test;
mod usage_test;
