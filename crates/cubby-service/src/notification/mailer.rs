//! Mailer that records notifications in the log instead of sending them.

use async_trait::async_trait;
use tracing::info;

use cubby_core::AppResult;
use cubby_core::traits::{Mailer, ShareNotice};

/// Logs every share notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

impl LogMailer {
    /// Create a logging mailer.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn share_created(&self, notice: &ShareNotice) -> AppResult<()> {
        info!(
            to = %notice.receiver_email,
            share_id = %notice.share_id,
            owner = %notice.owner,
            path = %notice.file_path,
            "Would send share notification"
        );
        Ok(())
    }
}
