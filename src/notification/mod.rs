//! Notification subsystem.
//!
//! # Data Flow
//! ```text
//! Intake pipeline (after persistence):
//!     → dispatch() spawns a detached task
//!         → Notifier::notify (logger.rs or email.rs)
//!         → outcome logged and counted, never returned to the caller
//! ```
//!
//! # Design Decisions
//! - The HTTP response never waits on delivery
//! - A failed notification never reverts a stored submission
//! - Provider chosen once at startup from `notifications.provider`

pub mod email;
pub mod logger;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;

use crate::config::{NotificationConfig, NotificationProvider};
use crate::observability::metrics;
use crate::storage::StoredSubmission;

pub use email::HttpMailer;
pub use logger::LogNotifier;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("mail API request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("mail API rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("{failed} of {attempted} messages failed")]
    Partial { failed: usize, attempted: usize },
}

/// Sends the confirmations and staff alerts for a new submission.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, submission: &StoredSubmission) -> Result<(), NotifyError>;
}

/// Build the configured notifier.
pub fn build_notifier(config: &NotificationConfig) -> Result<Arc<dyn Notifier>, NotifyError> {
    Ok(match config.provider {
        NotificationProvider::Log => Arc::new(LogNotifier),
        NotificationProvider::Http => Arc::new(HttpMailer::new(config.clone())?),
    })
}

/// Fire-and-forget delivery for `submission`.
pub fn dispatch(notifier: Arc<dyn Notifier>, submission: StoredSubmission) -> JoinHandle<()> {
    tokio::spawn(async move {
        let start = Instant::now();
        let kind = submission.kind.as_str();
        match notifier.notify(&submission).await {
            Ok(()) => {
                metrics::record_notification(kind, "sent");
                tracing::debug!(
                    id = %submission.id,
                    kind,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Notification sent"
                );
            }
            Err(e) => {
                metrics::record_notification(kind, "failed");
                tracing::warn!(
                    id = %submission.id,
                    kind,
                    error = %e,
                    "Notification failed; submission is kept"
                );
            }
        }
    })
}
