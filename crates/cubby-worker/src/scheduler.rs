//! Cron scheduler for the periodic tasks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use cubby_core::config::AppConfig;
use cubby_core::error::AppError;

use crate::executor::TaskExecutor;
use crate::jobs::{disk_usage, search_index};

/// Runs registered tasks on cron schedules.
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// Handlers the schedules dispatch to
    executor: Arc<TaskExecutor>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler")
            .field("tasks", &self.executor.registered_names())
            .finish()
    }
}

impl CronScheduler {
    /// Create a scheduler dispatching to `executor`.
    pub async fn new(executor: Arc<TaskExecutor>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            executor,
        })
    }

    /// Register the built-in schedules from configuration.
    pub async fn register_default_tasks(&self, config: &AppConfig) -> Result<(), AppError> {
        self.register(disk_usage::TASK_NAME, &config.disk_usage.recompute_schedule)
            .await?;
        if self.executor.has_handler(search_index::TASK_NAME) {
            self.register(search_index::TASK_NAME, &config.search.reindex_schedule)
                .await?;
        }

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Schedule the task registered as `name`.
    ///
    /// A firing that arrives while the previous run is still going is
    /// skipped.
    pub async fn register(&self, name: &str, schedule: &str) -> Result<(), AppError> {
        if !self.executor.has_handler(name) {
            return Err(AppError::internal(format!(
                "No handler registered for task {name}"
            )));
        }

        let executor = Arc::clone(&self.executor);
        let running = Arc::new(AtomicBool::new(false));
        let task = name.to_string();
        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let executor = Arc::clone(&executor);
            let running = Arc::clone(&running);
            let task = task.clone();
            Box::pin(async move {
                if running.swap(true, Ordering::AcqRel) {
                    tracing::warn!(task = %task, "Previous run still in progress, skipping");
                    return;
                }
                if let Err(e) = executor.execute(&task).await {
                    tracing::error!(task = %task, "Scheduled task failed: {}", e);
                }
                running.store(false, Ordering::Release);
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create {name} schedule: {}", e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add {name} schedule: {}", e)))?;

        tracing::info!("Registered: {} ({})", name, schedule);
        Ok(())
    }

    /// Kick off the startup passes enabled in configuration.
    pub fn run_startup_tasks(&self, config: &AppConfig) -> Option<JoinHandle<()>> {
        if !config.disk_usage.recompute_on_startup {
            return None;
        }
        let executor = Arc::clone(&self.executor);
        Some(tokio::spawn(async move {
            if let Err(e) = executor.execute(disk_usage::TASK_NAME).await {
                tracing::error!("Startup disk usage recompute failed: {}", e);
            }
        }))
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&self) -> Result<(), AppError> {
        let mut scheduler = self.scheduler.clone();
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}
