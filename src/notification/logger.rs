//! Notifier that only writes to the log. Default for development.

use async_trait::async_trait;

use super::{Notifier, NotifyError};
use crate::storage::StoredSubmission;

pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, submission: &StoredSubmission) -> Result<(), NotifyError> {
        tracing::info!(
            id = %submission.id,
            kind = submission.kind.as_str(),
            contact = submission.contact_name().unwrap_or("anonymous"),
            email = submission.text("email").unwrap_or("-"),
            "New {} received",
            submission.kind.label()
        );
        Ok(())
    }
}
