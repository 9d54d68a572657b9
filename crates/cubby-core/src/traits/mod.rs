//! Collaborator traits defined in `cubby-core` and implemented by other crates.

pub mod mailer;
pub mod search;
pub mod usage;

pub use mailer::{Mailer, ShareNotice};
pub use search::SearchIndexer;
pub use usage::{NodeKind, OwnerRoots, ScannedNode, SizeScanner, VolumeStats};
