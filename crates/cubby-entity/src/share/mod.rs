//! Share domain entities.

pub mod model;

pub use model::{CreateShare, Share, ShareReceiver};
