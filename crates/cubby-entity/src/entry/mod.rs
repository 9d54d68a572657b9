//! Transient filesystem views.

pub mod model;

pub use model::{DIRECTORY_MIME, Entry, EntryHead};
