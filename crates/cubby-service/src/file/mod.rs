//! Mutation engine and recent-files query.

pub mod recent;
pub mod service;

pub use service::FileService;
