//! File operation CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use super::OwnerArgs;
use crate::output::{self, OutputFormat};
use cubby_core::error::AppError;
use cubby_entity::entry::Entry;

/// Arguments for file commands
#[derive(Debug, Args)]
pub struct FilesArgs {
    /// File subcommand
    #[command(subcommand)]
    pub command: FilesCommand,
}

/// File subcommands
#[derive(Debug, Subcommand)]
pub enum FilesCommand {
    /// List a directory, or show a single file
    Ls {
        /// Owner selection
        #[command(flatten)]
        owner: OwnerArgs,
        /// Owner-relative path
        #[arg(default_value = "/")]
        path: String,
    },
    /// Create a directory (parents included)
    Mkdir {
        /// Owner selection
        #[command(flatten)]
        owner: OwnerArgs,
        /// Owner-relative path
        path: String,
    },
    /// Upload a local file
    Put {
        /// Owner selection
        #[command(flatten)]
        owner: OwnerArgs,
        /// Local file to read
        source: std::path::PathBuf,
        /// Owner-relative destination path
        path: String,
        /// Replace an existing file
        #[arg(long)]
        overwrite: bool,
    },
    /// Remove a file or directory tree
    Rm {
        /// Owner selection
        #[command(flatten)]
        owner: OwnerArgs,
        /// Owner-relative path
        path: String,
    },
    /// Move within the same owner tree
    Mv {
        /// Owner selection
        #[command(flatten)]
        owner: OwnerArgs,
        /// Source path
        from: String,
        /// Destination path
        to: String,
    },
    /// Copy within the same owner tree
    Cp {
        /// Owner selection
        #[command(flatten)]
        owner: OwnerArgs,
        /// Source path
        from: String,
        /// Destination path
        to: String,
    },
    /// Extract an archive into a directory of the same owner tree
    Extract {
        /// Owner selection
        #[command(flatten)]
        owner: OwnerArgs,
        /// Archive path
        archive: String,
        /// Target directory
        target: String,
    },
    /// Files modified within the last days
    Recent {
        /// Owner selection
        #[command(flatten)]
        owner: OwnerArgs,
        /// Look-back window; the configured default when omitted
        #[arg(short, long)]
        days: Option<u32>,
        /// Result cap; the configured default when omitted
        #[arg(short, long)]
        max: Option<usize>,
    },
    /// Translate a virtual path such as /home/docs or /shares/<id>/x
    Resolve {
        /// Calling user; anonymous when omitted
        #[arg(long = "as")]
        caller: Option<String>,
        /// Virtual path
        path: String,
    },
}

/// Entry display row
#[derive(Debug, Serialize, Tabled)]
struct EntryRow {
    /// Name
    name: String,
    /// Kind
    kind: String,
    /// Size
    size: String,
    /// Modified
    modified: String,
    /// MIME type
    mime: String,
    /// Share count
    shares: usize,
}

impl From<&Entry> for EntryRow {
    fn from(entry: &Entry) -> Self {
        Self {
            name: entry.file_name.clone(),
            kind: if entry.is_directory { "dir" } else { "file" }.to_string(),
            size: output::format_bytes(entry.size),
            modified: entry.mtime.format("%Y-%m-%d %H:%M").to_string(),
            mime: entry.mime_type.clone(),
            shares: entry.shared_with.len(),
        }
    }
}

/// Recent file display row
#[derive(Debug, Serialize, Tabled)]
struct RecentRow {
    /// Path
    path: String,
    /// Size
    size: String,
    /// Modified
    modified: String,
}

/// Execute file commands
pub async fn execute(
    args: &FilesArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let state = super::connect(config_path).await?;
    let files = &state.files;

    match &args.command {
        FilesCommand::Ls { owner, path } => {
            let entry = files.get(&owner.owner()?, path).await?;
            match format {
                OutputFormat::Json => output::print_json(&entry),
                OutputFormat::Table if entry.is_directory => {
                    println!("{} ({})", entry.file_path, output::format_bytes(entry.size));
                    let rows: Vec<EntryRow> = entry.files.iter().map(EntryRow::from).collect();
                    output::print_list(&rows, format);
                }
                OutputFormat::Table => output::print_list(&[EntryRow::from(&entry)], format),
            }
        }
        FilesCommand::Mkdir { owner, path } => {
            files.add_directory(&owner.owner()?, path).await?;
            output::print_success(&format!("Created {}", path));
        }
        FilesCommand::Put {
            owner,
            source,
            path,
            overwrite,
        } => {
            let content = tokio::fs::read(source)
                .await
                .map_err(|e| AppError::from_io(e, &source.display().to_string()))?;
            let size = content.len() as u64;
            files
                .add_or_overwrite_file_contents(&owner.owner()?, path, content, None, *overwrite)
                .await?;
            output::print_success(&format!(
                "Wrote {} ({})",
                path,
                output::format_bytes(size)
            ));
        }
        FilesCommand::Rm { owner, path } => {
            files.remove(&owner.owner()?, path).await?;
            output::print_success(&format!("Removed {}", path));
        }
        FilesCommand::Mv { owner, from, to } => {
            let owner = owner.owner()?;
            files.move_to(&owner, from, &owner, to).await?;
            output::print_success(&format!("Moved {} to {}", from, to));
        }
        FilesCommand::Cp { owner, from, to } => {
            let owner = owner.owner()?;
            files.copy_to(&owner, from, &owner, to).await?;
            output::print_success(&format!("Copied {} to {}", from, to));
        }
        FilesCommand::Extract {
            owner,
            archive,
            target,
        } => {
            let owner = owner.owner()?;
            let kind = files.extract(&owner, archive, &owner, target).await?;
            output::print_success(&format!("Extracted {:?} archive into {}", kind, target));
        }
        FilesCommand::Recent { owner, days, max } => {
            let days = days.unwrap_or(state.config.recent.days);
            let max = max.unwrap_or(state.config.recent.max_results);
            let entries = files.recent(&owner.owner()?, days, max).await?;
            let rows: Vec<RecentRow> = entries
                .iter()
                .map(|e| RecentRow {
                    path: e.file_path.clone(),
                    size: output::format_bytes(e.size),
                    modified: e.mtime.format("%Y-%m-%d %H:%M").to_string(),
                })
                .collect();
            output::print_list(&rows, format);
        }
        FilesCommand::Resolve { caller, path } => {
            match state.translator.translate(caller.as_deref(), path).await? {
                Some(resolved) => match format {
                    OutputFormat::Json => output::print_json(&resolved),
                    OutputFormat::Table => {
                        output::print_kv("Namespace", resolved.namespace.as_str());
                        output::print_kv("Owner", &resolved.owner.to_string());
                        output::print_kv("Path", &resolved.relative_path);
                        output::print_kv("Read-only", &resolved.readonly.to_string());
                        if let Some(share) = &resolved.share {
                            output::print_kv("Share", &share.id);
                        }
                    }
                },
                None => {
                    return Err(AppError::not_found(format!("{} does not resolve", path)));
                }
            }
        }
    }

    Ok(())
}
