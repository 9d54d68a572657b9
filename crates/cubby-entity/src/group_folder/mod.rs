//! Group folder domain entities.

pub mod model;

pub use model::{CreateGroupFolder, GroupFolder};
