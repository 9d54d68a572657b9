//! Listing and metadata views.

pub mod builder;

pub use builder::EntryBuilder;
