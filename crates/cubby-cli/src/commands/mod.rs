//! CLI command definitions and dispatch.

pub mod files;
pub mod group_folder;
pub mod migrate;
pub mod share;
pub mod usage;

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;
use cubby_core::config::AppConfig;
use cubby_core::error::AppError;
use cubby_core::Owner;
use cubby_database::DatabasePool;
use cubby_service::CoreState;

/// cubby: file storage core administration
#[derive(Debug, Parser)]
#[command(name = "cubby", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Disk usage inspection and recompute
    Usage(usage::UsageArgs),
    /// File operations on an owner tree
    Files(files::FilesArgs),
    /// Share management
    Share(share::ShareArgs),
    /// Group folder management
    #[command(name = "groupfolder")]
    GroupFolder(group_folder::GroupFolderArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &self.config).await,
            Commands::Usage(args) => usage::execute(args, &self.config, self.format).await,
            Commands::Files(args) => files::execute(args, &self.config, self.format).await,
            Commands::Share(args) => share::execute(args, &self.config, self.format).await,
            Commands::GroupFolder(args) => {
                group_folder::execute(args, &self.config, self.format).await
            }
        }
    }
}

/// Selects the owner tree a command works on.
#[derive(Debug, Clone, Args)]
pub struct OwnerArgs {
    /// Username owning the tree
    #[arg(short, long, conflicts_with = "group", required_unless_present = "group")]
    pub user: Option<String>,
    /// Group folder id owning the tree
    #[arg(short, long)]
    pub group: Option<String>,
}

impl OwnerArgs {
    /// The selected owner.
    pub fn owner(&self) -> Result<Owner, AppError> {
        match (&self.user, &self.group) {
            (Some(user), None) => Ok(Owner::user(user)),
            (None, Some(group)) => Ok(Owner::group_folder(group)),
            _ => Err(AppError::configuration(
                "Exactly one of --user or --group is required",
            )),
        }
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::load_file(config_path)
}

/// Helper: open the metadata store pool
pub async fn create_db_pool(config: &AppConfig) -> Result<DatabasePool, AppError> {
    DatabasePool::connect(&config.database).await
}

/// Helper: wire every service against the configured store
pub async fn connect(config_path: &str) -> Result<CoreState, AppError> {
    let config = load_config(config_path)?;
    let pool = create_db_pool(&config).await?;
    let state = CoreState::build(config, pool.stores());
    state.group_folders.load_roots().await?;
    Ok(state)
}
