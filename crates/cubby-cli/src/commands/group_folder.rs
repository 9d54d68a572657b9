//! Group folder management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use cubby_core::error::AppError;
use cubby_entity::group_folder::{CreateGroupFolder, GroupFolder};

/// Arguments for group folder commands
#[derive(Debug, Args)]
pub struct GroupFolderArgs {
    /// Group folder subcommand
    #[command(subcommand)]
    pub command: GroupFolderCommand,
}

/// Group folder subcommands
#[derive(Debug, Subcommand)]
pub enum GroupFolderCommand {
    /// Create a group folder
    Add {
        /// Slug identifier
        id: String,
        /// Display name
        name: String,
        /// Custom root directory
        #[arg(long)]
        path: Option<String>,
        /// Initial member (repeatable)
        #[arg(short, long = "member")]
        members: Vec<String>,
    },
    /// List group folders
    List {
        /// Only folders this user belongs to
        #[arg(long)]
        member: Option<String>,
    },
    /// Delete a group folder and its whole tree
    Remove {
        /// Group folder ID
        id: String,
    },
    /// Add a member
    AddMember {
        /// Group folder ID
        id: String,
        /// Username
        username: String,
    },
    /// Remove a member
    RemoveMember {
        /// Group folder ID
        id: String,
        /// Username
        username: String,
    },
}

/// Group folder display row
#[derive(Debug, Serialize, Tabled)]
struct GroupFolderRow {
    /// Group folder ID
    id: String,
    /// Name
    name: String,
    /// Root directory
    root: String,
    /// Members
    members: String,
}

/// Execute group folder commands
pub async fn execute(
    args: &GroupFolderArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let state = super::connect(config_path).await?;
    let service = &state.group_folders;

    match &args.command {
        GroupFolderCommand::Add {
            id,
            name,
            path,
            members,
        } => {
            let group = service
                .add(CreateGroupFolder {
                    id: id.clone(),
                    name: name.clone(),
                    folder_path: path.clone(),
                    members: members.clone(),
                })
                .await?;
            output::print_success(&format!("Group folder '{}' created", group.id));
        }
        GroupFolderCommand::List { member } => {
            let groups = match member {
                Some(username) => service.list_for_member(username).await?,
                None => service.list().await?,
            };
            let rows: Vec<GroupFolderRow> = groups
                .iter()
                .map(|g: &GroupFolder| GroupFolderRow {
                    id: g.id.clone(),
                    name: g.name.clone(),
                    root: state
                        .resolver
                        .root(&g.owner())
                        .map(|root| root.display().to_string())
                        .unwrap_or_default(),
                    members: g.members.join(", "),
                })
                .collect();
            output::print_list(&rows, format);
        }
        GroupFolderCommand::Remove { id } => {
            service.remove(id).await?;
            output::print_success(&format!("Group folder '{}' removed", id));
        }
        GroupFolderCommand::AddMember { id, username } => {
            service.add_member(id, username).await?;
            output::print_success(&format!("Added {} to '{}'", username, id));
        }
        GroupFolderCommand::RemoveMember { id, username } => {
            service.remove_member(id, username).await?;
            output::print_success(&format!("Removed {} from '{}'", username, id));
        }
    }

    Ok(())
}
