//! Group folder management.

pub mod service;

pub use service::GroupFolderService;
