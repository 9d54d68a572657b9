//! # cubby-core
//!
//! Core crate for cubby. Contains the owner model, configuration schemas,
//! change events, collaborator traits, and the unified error system.
//!
//! This crate has **no** internal dependencies on other cubby crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
pub use types::Owner;
