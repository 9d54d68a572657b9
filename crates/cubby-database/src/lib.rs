//! # cubby-database
//!
//! Metadata persistence for shares, group folders, favorites, and users.
//! Services depend on the traits in [`store`]; [`repositories`] implements
//! them over PostgreSQL and [`memory`] implements them in process.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use store::{FavoriteStore, GroupFolderStore, MetadataStores, ShareStore, UserStore};
