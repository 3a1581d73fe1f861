//! Email delivery through a Resend-compatible HTTP API.
//!
//! # Responsibilities
//! - Compose the customer confirmation and the staff alert for a submission
//! - Post each message to `notifications.api_url` with bearer auth
//!
//! # Design Decisions
//! - Plain-text bodies; values are already sanitized before they get here
//! - Every message is attempted; one failure does not stop the others

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::{Notifier, NotifyError};
use crate::config::NotificationConfig;
use crate::storage::{StoredSubmission, SubmissionKind};

/// One message in the mail API's wire format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

pub struct HttpMailer {
    client: reqwest::Client,
    config: NotificationConfig,
}

impl HttpMailer {
    pub fn new(config: NotificationConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(email)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for HttpMailer {
    async fn notify(&self, submission: &StoredSubmission) -> Result<(), NotifyError> {
        let messages = compose(submission, &self.config);
        let attempted = messages.len();
        let mut failed = 0;

        for message in &messages {
            if let Err(e) = self.send(message).await {
                failed += 1;
                tracing::warn!(
                    id = %submission.id,
                    subject = %message.subject,
                    error = %e,
                    "Email delivery failed"
                );
            }
        }

        if failed > 0 {
            return Err(NotifyError::Partial { failed, attempted });
        }
        Ok(())
    }
}

/// Render a field for humans. Missing fields render as `-`.
fn show(submission: &StoredSubmission, field: &str) -> String {
    match submission.fields.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_str().map(str::to_owned).unwrap_or_else(|| v.to_string()))
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::Bool(b)) => (if *b { "Yes" } else { "No" }).to_string(),
        Some(Value::Null) | None => "-".to_string(),
        Some(other) => other.to_string(),
    }
}

fn customer_subject(kind: SubmissionKind, venue: &str) -> String {
    match kind {
        SubmissionKind::Reservation => format!("Reservation Request Received - {venue}"),
        SubmissionKind::PrivateEvent => format!("Private Event Enquiry Received - {venue}"),
        SubmissionKind::Banquet => format!("Banquet Enquiry Received - {venue}"),
        SubmissionKind::Contact => format!("We Received Your Message - {venue}"),
        SubmissionKind::Feedback => format!("Thank You for Your Feedback - {venue}"),
        SubmissionKind::Career => format!("Application Received - {venue} Careers"),
    }
}

fn staff_subject(s: &StoredSubmission) -> String {
    match s.kind {
        SubmissionKind::Reservation => format!(
            "NEW RESERVATION - {} ({} guests on {})",
            show(s, "name"),
            show(s, "partySize"),
            show(s, "date")
        ),
        SubmissionKind::PrivateEvent => format!(
            "NEW PRIVATE EVENT ENQUIRY - {} ({} guests)",
            show(s, "eventType"),
            show(s, "guestCount")
        ),
        SubmissionKind::Banquet => format!(
            "NEW BANQUET ENQUIRY - {} ({} guests)",
            show(s, "eventType"),
            show(s, "guestCount")
        ),
        SubmissionKind::Contact => format!("NEW CONTACT FORM - {}", show(s, "inquiryType")),
        SubmissionKind::Feedback => format!(
            "NEW FEEDBACK - {} stars ({})",
            show(s, "overallRating"),
            show(s, "spaceVisited")
        ),
        SubmissionKind::Career => format!(
            "NEW JOB APPLICATION - {} ({}y exp)",
            show(s, "position"),
            show(s, "experienceYears")
        ),
    }
}

fn details(submission: &StoredSubmission) -> String {
    submission
        .fields
        .keys()
        .map(|key| format!("  {key}: {}", show(submission, key)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build every message owed for `submission`.
pub fn compose(submission: &StoredSubmission, config: &NotificationConfig) -> Vec<OutgoingEmail> {
    let venue = &config.venue_name;
    let customer_email = submission.text("email").map(str::to_owned);
    let mut messages = Vec::with_capacity(2);

    if let Some(to) = &customer_email {
        let greeting = submission.contact_name().unwrap_or("Guest");
        messages.push(OutgoingEmail {
            from: config.from_address.clone(),
            to: vec![to.clone()],
            subject: customer_subject(submission.kind, venue),
            text: format!(
                "Dear {greeting},\n\nThank you for reaching out to {venue}. \
                 We have received your {} (reference {}).\n\n\
                 Here is what you sent us:\n{}\n\nWarm regards,\n{venue}",
                submission.kind.label().to_lowercase(),
                submission.id,
                details(submission)
            ),
            reply_to: None,
        });
    }

    if !config.admin_recipients.is_empty() {
        messages.push(OutgoingEmail {
            from: config.from_address.clone(),
            to: config.admin_recipients.clone(),
            subject: staff_subject(submission),
            text: format!(
                "{} {} submitted at {}.\n\n{}\n",
                submission.kind.label(),
                submission.id,
                submission.created_at.to_rfc3339(),
                details(submission)
            ),
            reply_to: customer_email,
        });
    }

    messages
}
