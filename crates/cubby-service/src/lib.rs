//! # cubby-service
//!
//! The layer callers talk to. Each service holds its collaborators behind
//! `Arc`s handed in at construction time; [`CoreState`] builds the whole
//! graph from configuration and a set of metadata stores.
//!
//! - [`resource`]: virtual resource paths to `(owner, path)`.
//! - [`entry`]: listing and metadata views.
//! - [`file`]: the mutation engine and the recent-files query.
//! - [`hooks`]: post-mutation disk usage and reindex triggers.
//! - [`share`], [`group_folder`], [`favorite`]: metadata services.
//! - [`search`], [`notification`]: collaborator implementations.

pub mod entry;
pub mod favorite;
pub mod file;
pub mod group_folder;
pub mod hooks;
pub mod notification;
pub mod resource;
pub mod search;
pub mod share;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use entry::EntryBuilder;
pub use favorite::FavoriteService;
pub use file::FileService;
pub use group_folder::GroupFolderService;
pub use hooks::ChangeHook;
pub use resource::{Namespace, ResolvedResource, ResourceTranslator};
pub use share::ShareService;
pub use state::CoreState;
