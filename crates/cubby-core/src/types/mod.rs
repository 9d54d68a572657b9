//! Core type definitions used across the cubby workspace.

pub mod owner;
pub mod path;

pub use owner::Owner;
