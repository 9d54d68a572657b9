//! Disk usage CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;

use super::OwnerArgs;
use crate::output::{self, OutputFormat};
use cubby_core::error::AppError;

/// Arguments for usage commands
#[derive(Debug, Args)]
pub struct UsageArgs {
    /// Usage subcommand
    #[command(subcommand)]
    pub command: UsageCommand,
}

/// Usage subcommands
#[derive(Debug, Subcommand)]
pub enum UsageCommand {
    /// Show usage of an owner tree
    Show {
        /// Owner selection
        #[command(flatten)]
        owner: OwnerArgs,
        /// Also show the aggregate of this directory
        #[arg(short, long)]
        path: Option<String>,
    },
    /// Rescan an owner tree, or one directory of it
    Recompute {
        /// Owner selection
        #[command(flatten)]
        owner: OwnerArgs,
        /// Directory to rescan; the whole tree when omitted
        #[arg(short, long)]
        path: Option<String>,
    },
}

#[derive(Debug, Serialize)]
struct UsageView {
    owner: String,
    used: u64,
    available: u64,
    capacity: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    directory: Option<DirectoryView>,
}

#[derive(Debug, Serialize)]
struct DirectoryView {
    path: String,
    size: u64,
}

/// Execute usage commands
pub async fn execute(
    args: &UsageArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let state = super::connect(config_path).await?;

    let (owner, path) = match &args.command {
        UsageCommand::Show { owner, path } => (owner.owner()?, path),
        UsageCommand::Recompute { owner, path } => {
            let owner = owner.owner()?;
            match path {
                Some(path) if state.usage.is_populated(&owner) => {
                    state.usage.recompute_directory(&owner, path).await;
                }
                _ => state.usage.recompute(&owner).await,
            }
            output::print_success(&format!("Recomputed {}", owner));
            (owner, path)
        }
    };

    let report = state.usage.get(&owner).await;
    let directory = path.as_ref().map(|p| DirectoryView {
        path: p.clone(),
        size: state.usage.get_directory(&owner, p),
    });
    let view = UsageView {
        owner: owner.to_string(),
        used: report.used,
        available: report.available,
        capacity: report.capacity,
        directory,
    };

    match format {
        OutputFormat::Json => output::print_json(&view),
        OutputFormat::Table => {
            println!("{}", view.owner);
            output::print_kv("Used", &output::format_bytes(view.used));
            output::print_kv("Available", &output::format_bytes(view.available));
            output::print_kv("Capacity", &output::format_bytes(view.capacity));
            if let Some(dir) = &view.directory {
                output::print_kv(&dir.path, &output::format_bytes(dir.size));
            }
        }
    }

    Ok(())
}
