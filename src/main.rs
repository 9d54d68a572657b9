//! cubby server: owner-scoped file storage core.
//!
//! Wires the metadata store, the service graph, and the background
//! scheduler together, then runs until a shutdown signal arrives.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use cubby_core::config::AppConfig;
use cubby_core::error::AppError;
use cubby_database::DatabasePool;
use cubby_service::CoreState;
use cubby_worker::CronScheduler;

#[tokio::main]
async fn main() {
    let env = std::env::var("CUBBY_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!("Loaded configuration (env: {})", env);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting cubby v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Owner root parents ───────────────────────────────
    create_data_directories(&config).await?;

    // ── Step 2: Metadata store + migrations ──────────────────────
    let db = DatabasePool::connect_and_migrate(&config.database).await?;
    tracing::info!("Metadata store ready");

    // ── Step 3: Service graph ────────────────────────────────────
    let state = CoreState::build(config, db.stores());
    let custom_roots = state.group_folders.load_roots().await?;
    tracing::info!(custom_roots, "Group folder roots registered");

    // ── Step 4: Background scheduler ─────────────────────────────
    let executor = Arc::new(cubby_worker::jobs::default_executor(&state));
    let scheduler = if state.config.worker.enabled {
        let scheduler = CronScheduler::new(Arc::clone(&executor)).await?;
        scheduler.register_default_tasks(&state.config).await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Background scheduler disabled");
        None
    };
    let startup = match &scheduler {
        Some(scheduler) => scheduler.run_startup_tasks(&state.config),
        None => None,
    };

    tracing::info!("cubby is running");

    // ── Step 5: Graceful shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");

    if let Some(scheduler) = &scheduler {
        scheduler.shutdown().await?;
    }
    if let Some(handle) = startup {
        handle.abort();
    }
    if let Some(pending) = state.hook.pending_reindexes() {
        tracing::info!(pending, "Dropping queued reindex requests");
    }

    let _ = tokio::time::timeout(Duration::from_secs(10), db.close()).await;
    tracing::info!("cubby shut down gracefully");
    Ok(())
}

/// Create the parents of every owner root
async fn create_data_directories(config: &AppConfig) -> Result<(), AppError> {
    for dir in [&config.storage.users_root, &config.storage.groups_root] {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| AppError::from_io(e, &dir.display().to_string()))?;
    }
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
