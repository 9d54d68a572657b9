//! Favorite domain entities.

pub mod model;

pub use model::{CreateFavorite, Favorite};
