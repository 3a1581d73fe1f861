//! Submission and event records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Validated, sanitized form fields keyed by camelCase name.
pub type Record = Map<String, Value>;

/// The public forms accepted by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    Reservation,
    PrivateEvent,
    Banquet,
    Contact,
    Feedback,
    Career,
}

impl SubmissionKind {
    pub const ALL: [SubmissionKind; 6] = [
        SubmissionKind::Reservation,
        SubmissionKind::PrivateEvent,
        SubmissionKind::Banquet,
        SubmissionKind::Contact,
        SubmissionKind::Feedback,
        SubmissionKind::Career,
    ];

    /// Route segment used under `/api/` and `/api/admin/`.
    pub fn slug(&self) -> &'static str {
        match self {
            SubmissionKind::Reservation => "reservations",
            SubmissionKind::PrivateEvent => "private-events",
            SubmissionKind::Banquet => "banquets",
            SubmissionKind::Contact => "contact",
            SubmissionKind::Feedback => "feedback",
            SubmissionKind::Career => "careers",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.slug() == slug)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionKind::Reservation => "reservation",
            SubmissionKind::PrivateEvent => "private_event",
            SubmissionKind::Banquet => "banquet",
            SubmissionKind::Contact => "contact",
            SubmissionKind::Feedback => "feedback",
            SubmissionKind::Career => "career",
        }
    }

    /// Human-readable name for logs and emails.
    pub fn label(&self) -> &'static str {
        match self {
            SubmissionKind::Reservation => "Reservation",
            SubmissionKind::PrivateEvent => "Private Event Enquiry",
            SubmissionKind::Banquet => "Banquet Enquiry",
            SubmissionKind::Contact => "Contact Message",
            SubmissionKind::Feedback => "Feedback",
            SubmissionKind::Career => "Job Application",
        }
    }

    /// Status a new submission of this kind starts in.
    pub fn initial_status(&self) -> SubmissionStatus {
        match self {
            SubmissionKind::Contact | SubmissionKind::Feedback => SubmissionStatus::New,
            _ => SubmissionStatus::Pending,
        }
    }
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Back-office lifecycle of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    New,
    Confirmed,
    Contacted,
    Reviewed,
    Completed,
    Cancelled,
    NoShow,
    Archived,
}

/// What the intake pipeline hands to persistence.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub kind: SubmissionKind,
    pub fields: Record,
}

/// A persisted submission. `id` is assigned once by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSubmission {
    pub id: Uuid,
    pub kind: SubmissionKind,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub fields: Record,
}

impl StoredSubmission {
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn integer(&self, field: &str) -> Option<i64> {
        self.fields.get(field).and_then(Value::as_i64)
    }

    /// Date stored in `field`, if it holds an ISO date.
    pub fn date(&self, field: &str) -> Option<NaiveDate> {
        self.text(field)
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    }

    /// Name of the person behind the submission.
    pub fn contact_name(&self) -> Option<&str> {
        self.text("name").or_else(|| self.text("fullName"))
    }
}

/// An entry in the public events calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub event_type: String,
    pub space: String,
    pub event_date: NaiveDate,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub price: Option<u32>,
    #[serde(default)]
    pub published: bool,
}

/// Filters and paging for the events listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    pub limit: usize,
    pub offset: usize,
    pub event_type: Option<String>,
    pub space: Option<String>,
}

/// One page of events plus the total number of matches.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPage {
    pub events: Vec<Event>,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_round_trip() {
        for kind in SubmissionKind::ALL {
            assert_eq!(SubmissionKind::from_slug(kind.slug()), Some(kind));
        }
        assert_eq!(SubmissionKind::from_slug("menu"), None);
    }

    #[test]
    fn test_initial_status() {
        assert_eq!(SubmissionKind::Contact.initial_status(), SubmissionStatus::New);
        assert_eq!(SubmissionKind::Feedback.initial_status(), SubmissionStatus::New);
        assert_eq!(SubmissionKind::Banquet.initial_status(), SubmissionStatus::Pending);
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_value(SubmissionStatus::NoShow).unwrap(), "no_show");
        let status: SubmissionStatus = serde_json::from_value("confirmed".into()).unwrap();
        assert_eq!(status, SubmissionStatus::Confirmed);
    }
}
