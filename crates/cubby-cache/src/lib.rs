//! # cubby-cache
//!
//! In-memory caches derived from the filesystem. The only one today is the
//! per-owner [`DiskUsageCache`], populated by an external size scan and
//! refreshed by the change hook and the scheduler.

pub mod disk_usage;
pub mod keys;

pub use disk_usage::{DiskUsageCache, OwnerUsage, UsageReport};
