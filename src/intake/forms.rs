//! The form catalogue: one schema per submission kind.
//!
//! # Design Decisions
//! - Numeric bounds come from `[forms]` so venues can tune capacities without code changes
//! - Allow-lists are fixed; changing them is a deploy, not a config edit

use serde_json::Value;

use super::schema::{CrossFieldRule, DateRule, FieldSpec, FieldType, Schema};
use crate::config::FormLimits;
use crate::storage::{Record, SubmissionKind};

/// Multipart part carrying a file and the record field its URL lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadSlot {
    pub part: &'static str,
    pub url_field: &'static str,
}

/// Everything the pipeline needs to know about one form.
#[derive(Debug, Clone)]
pub struct IntakeForm {
    pub kind: SubmissionKind,
    pub schema: Schema,
    pub upload: Option<UploadSlot>,
}

pub const RESERVATION_TIMES: &[&str] = &["11:00 AM", "1:00 PM", "3:00 PM", "7:00 PM", "9:00 PM", "11:00 PM"];
pub const RESERVATION_SPACES: &[&str] = &["Rooftop Restaurant", "Lounge", "Café", "Any"];

pub const PRIVATE_EVENT_TYPES: &[&str] = &["Birthday", "Anniversary", "Corporate", "Proposal", "Celebration", "Other"];
pub const BUDGET_RANGES: &[&str] = &["₹50k-1L", "₹1L-2L", "₹2L-5L", "₹5L+"];
pub const PRIVATE_EVENT_SPACES: &[&str] = &["Private Dining", "Rooftop Restaurant", "Banquet Hall", "Lounge", "Any"];
pub const CONTACT_PREFERENCES: &[&str] = &["Phone", "WhatsApp", "Email"];

pub const BANQUET_EVENT_TYPES: &[&str] = &[
    "Wedding",
    "Reception",
    "Sangeet",
    "Corporate Event",
    "Conference",
    "Exhibition",
    "Other",
];
pub const REFERRAL_SOURCES: &[&str] = &[
    "Google",
    "Instagram",
    "Facebook",
    "Referral",
    "Wedding Planner",
    "Walk-in",
    "Other",
];
pub const BANQUET_REQUEST_TYPES: &[&str] = &["Site Visit", "Quote", "Both"];

pub const INQUIRY_TYPES: &[&str] = &[
    "Reservation",
    "Event",
    "General",
    "Corporate",
    "Jobs",
    "Press",
    "Issue",
    "Feedback",
    "Booking",
    "Other",
];

pub const VISITED_SPACES: &[&str] = &[
    "Café & Bakery",
    "Rooftop Restaurant",
    "Lounge",
    "Club",
    "Private Dining",
    "Banquet",
];
pub const RECOMMENDATIONS: &[&str] = &["Definitely", "Probably", "Maybe", "No"];

pub const POSITIONS: &[&str] = &[
    "Chef",
    "Sous Chef",
    "Bartender",
    "Server",
    "Host",
    "Manager",
    "Housekeeping",
    "Kitchen Staff",
    "Security",
    "Other",
];

pub const RESUME_SLOT: UploadSlot = UploadSlot {
    part: "resume",
    url_field: "resumeUrl",
};

const RATING: FieldType = FieldType::Integer { min: 1, max: Some(5) };

impl IntakeForm {
    pub fn new(kind: SubmissionKind, limits: &FormLimits) -> Self {
        let (schema, upload) = match kind {
            SubmissionKind::Reservation => (reservation(limits), None),
            SubmissionKind::PrivateEvent => (private_event(limits), None),
            SubmissionKind::Banquet => (banquet(limits), None),
            SubmissionKind::Contact => (contact(limits), None),
            SubmissionKind::Feedback => (feedback(), None),
            SubmissionKind::Career => (career(limits), Some(RESUME_SLOT)),
        };
        Self { kind, schema, upload }
    }

    /// Confirmation text returned with a successful submission.
    pub fn success_message(&self, record: &Record) -> &'static str {
        match self.kind {
            SubmissionKind::Reservation => {
                "Reservation request received successfully. We'll contact you within 2 hours to confirm."
            }
            SubmissionKind::PrivateEvent => {
                "Private event enquiry received. Our events team will contact you within 24 hours."
            }
            SubmissionKind::Banquet => {
                "Banquet enquiry received. Our banquet manager will contact you within 12 hours."
            }
            SubmissionKind::Contact => "Thank you for contacting us. We'll respond within 24 hours.",
            SubmissionKind::Feedback => {
                let rating = record.get("overallRating").and_then(Value::as_i64).unwrap_or(0);
                if rating >= 4 {
                    "Thank you for your wonderful feedback! We're delighted you enjoyed your experience."
                } else {
                    "Thank you for your valuable feedback. We take all comments seriously and will work to improve."
                }
            }
            SubmissionKind::Career => {
                "Application submitted successfully. We'll review your application and contact you within 7 business days."
            }
        }
    }
}

fn contact_fields() -> [FieldSpec; 3] {
    [
        FieldSpec::required("name", FieldType::person_name()),
        FieldSpec::required("phone", FieldType::phone()),
        FieldSpec::required("email", FieldType::email()),
    ]
}

fn reservation(limits: &FormLimits) -> Schema {
    let mut fields = vec![
        FieldSpec::required("date", FieldType::Date(DateRule::NotPast)),
        FieldSpec::required("time", FieldType::Enum(RESERVATION_TIMES)),
        FieldSpec::required("partySize", FieldType::range(1, limits.reservation_max_party)),
        FieldSpec::required("spacePreference", FieldType::Enum(RESERVATION_SPACES)),
        FieldSpec::optional("occasion", FieldType::text(0, 100)),
    ];
    fields.extend(contact_fields());
    fields.push(FieldSpec::optional("specialRequests", FieldType::text(0, 500)));
    fields.push(FieldSpec::required("agreeToSMS", FieldType::Flag { must_be_true: true }));
    Schema::new(fields)
}

fn private_event(limits: &FormLimits) -> Schema {
    let mut fields = vec![
        FieldSpec::required("eventType", FieldType::Enum(PRIVATE_EVENT_TYPES)),
        FieldSpec::required("eventDate", FieldType::Date(DateRule::NotPast)),
        FieldSpec::required(
            "guestCount",
            FieldType::range(limits.private_event_min_guests, limits.private_event_max_guests),
        ),
        FieldSpec::required("budgetRange", FieldType::Enum(BUDGET_RANGES)),
        FieldSpec::required("spacePreference", FieldType::Enum(PRIVATE_EVENT_SPACES)),
    ];
    fields.extend(contact_fields());
    fields.extend([
        FieldSpec::optional("company", FieldType::text(0, 100)),
        FieldSpec::required("requirements", FieldType::text(10, 1000)),
        FieldSpec::required("preferredContact", FieldType::Enum(CONTACT_PREFERENCES)),
    ]);
    Schema::new(fields)
}

fn banquet(limits: &FormLimits) -> Schema {
    let mut fields = vec![
        FieldSpec::required("eventType", FieldType::Enum(BANQUET_EVENT_TYPES)),
        FieldSpec::required("eventDate", FieldType::Date(DateRule::NotPast)),
        FieldSpec::optional("alternateDate", FieldType::Date(DateRule::NotPast)),
        FieldSpec::required(
            "guestCount",
            FieldType::range(limits.banquet_min_guests, limits.banquet_max_guests),
        ),
        FieldSpec::required("timingFrom", FieldType::time()),
        FieldSpec::required("timingTo", FieldType::time()),
        FieldSpec::required(
            "requirements",
            FieldType::TextList {
                min_items: 1,
                max_items: 20,
                item_max: 100,
            },
        ),
    ];
    fields.extend(contact_fields());
    fields.extend([
        FieldSpec::required("city", FieldType::text(2, 100)),
        FieldSpec::required("hearAboutUs", FieldType::Enum(REFERRAL_SOURCES)),
        FieldSpec::optional("additionalNotes", FieldType::text(0, 1000)),
        FieldSpec::required("requestType", FieldType::Enum(BANQUET_REQUEST_TYPES)),
    ]);
    Schema::new(fields)
        .with_rule(CrossFieldRule::DistinctFrom {
            field: "alternateDate",
            other: "eventDate",
        })
        .with_rule(CrossFieldRule::RequiredWhen {
            field: "additionalNotes",
            when: "eventType",
            equals: "Other",
            min: 10,
        })
}

fn contact(limits: &FormLimits) -> Schema {
    let mut fields = vec![FieldSpec::required("inquiryType", FieldType::Enum(INQUIRY_TYPES))];
    fields.extend(contact_fields());
    fields.push(FieldSpec::required(
        "message",
        FieldType::text(limits.contact_message_min, limits.contact_message_max),
    ));
    Schema::new(fields)
}

fn feedback() -> Schema {
    Schema::new(vec![
        FieldSpec::required("visitDate", FieldType::Date(DateRule::NotFuture)),
        FieldSpec::required("spaceVisited", FieldType::Enum(VISITED_SPACES)),
        FieldSpec::required("overallRating", RATING),
        FieldSpec::required("foodRating", RATING),
        FieldSpec::required("serviceRating", RATING),
        FieldSpec::required("ambianceRating", RATING),
        FieldSpec::required("valueRating", RATING),
        FieldSpec::required("whatYouLoved", FieldType::text(10, 500)),
        FieldSpec::optional("improvements", FieldType::text(0, 500)),
        FieldSpec::required("wouldRecommend", FieldType::Enum(RECOMMENDATIONS)),
        FieldSpec::optional("name", FieldType::text(0, 100)),
        FieldSpec::optional("email", FieldType::email()),
        FieldSpec::required("canSharePublicly", FieldType::Flag { must_be_true: false }),
    ])
}

fn career(limits: &FormLimits) -> Schema {
    Schema::new(vec![
        FieldSpec::required("position", FieldType::Enum(POSITIONS)),
        FieldSpec::required("fullName", FieldType::person_name()),
        FieldSpec::required("email", FieldType::email()),
        FieldSpec::required("phone", FieldType::phone()),
        FieldSpec::required("currentCity", FieldType::text(2, 100)),
        FieldSpec::required("experienceYears", FieldType::range(0, 50)),
        FieldSpec::optional("currentPosition", FieldType::text(0, 100)),
        FieldSpec::optional("expectedSalary", FieldType::Integer { min: 0, max: None }),
        FieldSpec::optional("portfolioUrl", FieldType::url()),
        FieldSpec::required(
            "whyAmante",
            FieldType::text(limits.career_motivation_min, 1000),
        ),
        FieldSpec::required("availableToJoin", FieldType::Date(DateRule::Any)),
        FieldSpec::required(RESUME_SLOT.url_field, FieldType::url()),
    ])
}
