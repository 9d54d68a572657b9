//! Share management CLI commands.

use chrono::{Duration, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use super::OwnerArgs;
use crate::output::{self, OutputFormat};
use cubby_core::error::AppError;
use cubby_entity::share::{CreateShare, Share, ShareReceiver};

/// Arguments for share commands
#[derive(Debug, Args)]
pub struct ShareArgs {
    /// Share subcommand
    #[command(subcommand)]
    pub command: ShareCommand,
}

/// Share subcommands
#[derive(Debug, Subcommand)]
pub enum ShareCommand {
    /// Share a path; a public link when no receiver is given
    Create {
        /// Owner selection
        #[command(flatten)]
        owner: OwnerArgs,
        /// Owner-relative path to share
        path: String,
        /// Registered receiver
        #[arg(long, conflicts_with = "to_email")]
        to_user: Option<String>,
        /// Email receiver
        #[arg(long)]
        to_email: Option<String>,
        /// Grant read-only access
        #[arg(long)]
        readonly: bool,
        /// Expire after this many days
        #[arg(long)]
        expires_in_days: Option<i64>,
    },
    /// List shares of an owner tree
    List {
        /// Owner selection
        #[command(flatten)]
        owner: OwnerArgs,
    },
    /// List shares addressed to a user
    Received {
        /// Receiving username
        username: String,
    },
    /// Delete a share
    Remove {
        /// Share ID
        id: String,
    },
}

/// Share display row
#[derive(Debug, Serialize, Tabled)]
struct ShareRow {
    /// Share ID
    id: String,
    /// Shared path
    path: String,
    /// Receiver
    receiver: String,
    /// Read-only
    readonly: bool,
    /// Expiry
    expires: String,
}

impl From<&Share> for ShareRow {
    fn from(share: &Share) -> Self {
        Self {
            id: share.id.clone(),
            path: share.file_path.clone(),
            receiver: match share.receiver() {
                ShareReceiver::User(user) => user,
                ShareReceiver::Email(email) => email,
                ShareReceiver::Link => "(public link)".to_string(),
            },
            readonly: share.readonly,
            expires: share
                .expires_at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "never".to_string()),
        }
    }
}

/// Execute share commands
pub async fn execute(
    args: &ShareArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let state = super::connect(config_path).await?;

    match &args.command {
        ShareCommand::Create {
            owner,
            path,
            to_user,
            to_email,
            readonly,
            expires_in_days,
        } => {
            let receiver = match (to_user, to_email) {
                (Some(user), _) => ShareReceiver::User(user.clone()),
                (None, Some(email)) => ShareReceiver::Email(email.clone()),
                (None, None) => ShareReceiver::Link,
            };
            let share = state
                .shares
                .create(CreateShare {
                    owner: owner.owner()?,
                    file_path: path.clone(),
                    receiver,
                    readonly: *readonly,
                    expires_at: expires_in_days.map(|days| Utc::now() + Duration::days(days)),
                })
                .await?;
            output::print_success(&format!("Share {} created", share.id));
        }
        ShareCommand::List { owner } => {
            let shares = state.shares.list_owned(&owner.owner()?).await?;
            let rows: Vec<ShareRow> = shares.iter().map(ShareRow::from).collect();
            output::print_list(&rows, format);
        }
        ShareCommand::Received { username } => {
            let shares = state.shares.list_received(username).await?;
            let rows: Vec<ShareRow> = shares.iter().map(ShareRow::from).collect();
            output::print_list(&rows, format);
        }
        ShareCommand::Remove { id } => {
            state.shares.remove(id).await?;
            output::print_success(&format!("Share {} removed", id));
        }
    }

    Ok(())
}
