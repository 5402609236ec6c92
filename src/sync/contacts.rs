use log::{debug, warn};
use serde_json::Value;
use std::sync::Arc;

use super::{Outcome, Repository};
use crate::backend::RemoteError;
use crate::constants::ADVISORY_SAVED_LOCALLY;
use crate::models::{ContactSubmission, Record, RecordId};
use crate::notify::Notifier;

impl Repository<ContactSubmission> {
    /// Clear the unread flag of a submission.
    ///
    /// Idempotent. Returns the updated record, or `None` when no submission
    /// with that id exists in the store that served the call.
    pub async fn mark_as_read(&self, id: &RecordId) -> Outcome<Option<Record<ContactSubmission>>> {
        match self.mark_remote_as_read(id).await {
            Ok(record) => {
                let updated = record.clone();
                self.write_through(move |cached| cached.upsert(&updated)).await;
                Outcome::remote(Some(record))
            }
            Err(e) => {
                let reason = self.fallback_reason("mark_as_read", &e);
                let mut cached = self.cache.snapshot().await;
                if cached.set_field(id, "isNew", Value::Bool(false)) {
                    self.cache.store(&cached).await;
                } else {
                    debug!("Contact submission {id} not in local cache");
                }
                Outcome::local(cached.get(id), reason, ADVISORY_SAVED_LOCALLY)
            }
        }
    }

    async fn mark_remote_as_read(&self, id: &RecordId) -> Result<Record<ContactSubmission>, RemoteError> {
        let Some(mut record) = self.remote.get(id).await? else {
            return Err(RemoteError::NotFound(format!("contactSubmissions/{id}")));
        };
        record.data.is_new = false;
        self.remote.replace(id, &record.data).await
    }

    /// Store a new, unread submission and hand it to `notifier` in the
    /// background. A failed notification is logged and otherwise ignored.
    pub async fn submit(
        &self,
        mut submission: ContactSubmission,
        notifier: Arc<dyn Notifier>,
    ) -> Outcome<Record<ContactSubmission>> {
        submission.is_new = true;
        let outcome = self.add(submission).await;

        let record = outcome.value.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.notify_submission(&record).await {
                warn!("⚠️  Contact notification for {} failed: {e}", record.id);
            }
        });

        outcome
    }
}
