//! Outbound notification boundary.

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::types::Owner;

/// A share was created for an email recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareNotice {
    /// Share id.
    pub share_id: String,
    /// Owner of the shared tree.
    pub owner: Owner,
    /// Shared root path.
    pub file_path: String,
    /// Recipient address.
    pub receiver_email: String,
}

/// Sends share notifications. Not awaited by the mutation path.
#[async_trait]
pub trait Mailer: Send + Sync + Debug + 'static {
    /// Notify a recipient that a share was created for them.
    async fn share_created(&self, notice: &ShareNotice) -> AppResult<()>;
}
