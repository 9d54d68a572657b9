//! Search indexer implementations.

pub mod noop;
pub mod recoll;

pub use noop::NoopIndexer;
pub use recoll::RecollIndexer;
