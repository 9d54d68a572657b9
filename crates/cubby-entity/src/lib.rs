//! # cubby-entity
//!
//! Entity models for cubby. Persistent records derive `sqlx::FromRow`;
//! [`entry`] holds the transient views built per request.

pub mod entry;
pub mod favorite;
pub mod group_folder;
pub mod share;
pub mod user;
