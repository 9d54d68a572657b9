//! External tools invoked as child processes.

pub mod archive;
pub mod recent;
pub mod runner;
pub mod scan;

pub use archive::{ArchiveKind, Extractor};
pub use recent::RecentScanner;
pub use runner::{ToolError, ToolOutput, ToolRunner};
pub use scan::FindScanner;
