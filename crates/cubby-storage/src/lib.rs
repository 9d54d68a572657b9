//! # cubby-storage
//!
//! Everything that touches an owner's tree on disk:
//!
//! - [`resolver`]: the containment boundary mapping `(owner, path)` to a
//!   validated [`PhysicalPath`].
//! - [`local`]: filesystem primitives over resolved paths (atomic write,
//!   copy, move, remove, streaming read).
//! - [`tools`]: external processes (size scan, archive extraction, recent
//!   files, volume stats) run with a timeout.

pub mod local;
pub mod resolver;
pub mod tools;

pub use local::{ByteStream, LocalFs};
pub use resolver::{PathResolver, PhysicalPath};
