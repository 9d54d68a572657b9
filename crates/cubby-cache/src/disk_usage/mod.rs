//! Disk usage cache.

pub mod cache;
pub mod tally;

pub use cache::{DiskUsageCache, OwnerUsage, UsageReport};
