//! Post-mutation triggers.

pub mod dispatcher;
pub mod reindex;

pub use dispatcher::ChangeHook;
pub use reindex::ReindexQueue;
