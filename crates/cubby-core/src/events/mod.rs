//! Change events emitted by the mutation engine.
//!
//! Events are consumed by the change hook, which turns each one into the
//! set of directories whose cached disk usage must be refreshed.

pub mod file;

pub use file::FileEvent;
