//! Share management.

pub mod link;
pub mod service;

pub use service::ShareService;
