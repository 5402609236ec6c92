//! Notification port for new contact submissions.
//!
//! Notifications are fire-and-forget: they run after the submission has been
//! stored and their failure never affects the stored record.

use anyhow::Result;
use async_trait::async_trait;
use log::info;

use crate::models::{ContactSubmission, Record};

/// Receives a copy of every stored contact submission.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_submission(&self, submission: &Record<ContactSubmission>) -> Result<()>;
}

/// Notifier that only writes a log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_submission(&self, submission: &Record<ContactSubmission>) -> Result<()> {
        info!(
            "📬 New contact submission {} from {} <{}>",
            submission.id, submission.data.name, submission.data.email
        );
        Ok(())
    }
}
