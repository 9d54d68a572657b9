//! Scheduled background tasks for cubby.
//!
//! This crate provides:
//! - A task executor that dispatches named tasks to their handlers
//! - A cron scheduler that runs those tasks periodically
//! - The built-in tasks: full disk usage recompute and full search reindex

pub mod executor;
pub mod jobs;
pub mod scheduler;

pub use executor::{TaskError, TaskExecutor, TaskHandler, TaskSummary};
pub use scheduler::CronScheduler;
