//! Task executor: dispatches named tasks to registered handlers.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing;

use cubby_core::error::AppError;

/// A periodic task.
#[async_trait]
pub trait TaskHandler: Send + Sync + Debug {
    /// Name the task is registered and scheduled under.
    fn name(&self) -> &str;

    /// Run one full pass.
    async fn run(&self) -> Result<TaskSummary, TaskError>;
}

/// Outcome of one pass over every owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    /// Owners processed successfully.
    pub processed: usize,
    /// Owners that failed and were skipped.
    pub failed: usize,
}

/// Error from a task run.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// No handler is registered under the requested name.
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    /// The owner list could not be loaded.
    #[error("Failed to list owners: {0}")]
    Owners(#[source] AppError),

    /// Any other failure.
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

/// Registry of task handlers by name.
#[derive(Debug, Default)]
pub struct TaskExecutor {
    handlers: HashMap<String, Arc<dyn TaskHandler>>,
}

impl TaskExecutor {
    /// Create an empty executor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its own name.
    pub fn register(&mut self, handler: Arc<dyn TaskHandler>) {
        let name = handler.name().to_string();
        tracing::info!(task = %name, "Registered task handler");
        self.handlers.insert(name, handler);
    }

    /// Run the task registered as `name`.
    pub async fn execute(&self, name: &str) -> Result<TaskSummary, TaskError> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| TaskError::UnknownTask(name.to_string()))?;

        tracing::info!(task = name, "Running task");
        let summary = handler.run().await?;
        tracing::info!(
            task = name,
            processed = summary.processed,
            failed = summary.failed,
            "Task finished"
        );
        Ok(summary)
    }

    /// Whether a handler is registered as `name`.
    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Names of every registered task.
    pub fn registered_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Fixed;

    #[async_trait]
    impl TaskHandler for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn run(&self) -> Result<TaskSummary, TaskError> {
            Ok(TaskSummary {
                processed: 3,
                failed: 1,
            })
        }
    }

    #[tokio::test]
    async fn test_dispatch_by_name() {
        let mut executor = TaskExecutor::new();
        executor.register(Arc::new(Fixed));

        assert!(executor.has_handler("fixed"));
        assert_eq!(executor.registered_names(), vec!["fixed".to_string()]);
        let summary = executor.execute("fixed").await.unwrap();
        assert_eq!(summary.processed, 3);
        assert!(matches!(
            executor.execute("other").await,
            Err(TaskError::UnknownTask(name)) if name == "other"
        ));
    }
}
