//! Back-office KPIs computed from the submission lists.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::storage::{StoredSubmission, SubmissionKind, SubmissionStatus};

const RECENT: usize = 10;
const UPCOMING_DAYS: i64 = 7;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub today_reservations: Vec<StoredSubmission>,
    pub upcoming_reservations: usize,
    pub upcoming_private_events: usize,
    pub totals: BTreeMap<&'static str, usize>,
    pub recent_feedback: Vec<StoredSubmission>,
    pub recent_applications: Vec<StoredSubmission>,
    pub recent_contacts: Vec<StoredSubmission>,
    pub average_rating: Option<f64>,
}

fn active(s: &StoredSubmission) -> bool {
    !matches!(s.status, SubmissionStatus::Cancelled | SubmissionStatus::Archived)
}

fn upcoming(list: &[StoredSubmission], field: &str, today: NaiveDate) -> usize {
    let horizon = today + Duration::days(UPCOMING_DAYS);
    list.iter()
        .filter(|s| active(s))
        .filter_map(|s| s.date(field))
        .filter(|d| *d >= today && *d <= horizon)
        .count()
}

fn recent(list: &[StoredSubmission]) -> Vec<StoredSubmission> {
    list.iter().take(RECENT).cloned().collect()
}

/// Mean overall rating rounded to one decimal.
fn average_rating(feedback: &[StoredSubmission]) -> Option<f64> {
    let ratings: Vec<i64> = feedback.iter().filter_map(|s| s.integer("overallRating")).collect();
    if ratings.is_empty() {
        return None;
    }
    let mean = ratings.iter().sum::<i64>() as f64 / ratings.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

/// Build the dashboard. Each list must be newest first.
pub fn build_dashboard(lists: &HashMap<SubmissionKind, Vec<StoredSubmission>>, today: NaiveDate) -> Dashboard {
    let empty = Vec::new();
    let list = |kind: SubmissionKind| lists.get(&kind).unwrap_or(&empty);

    let reservations = list(SubmissionKind::Reservation);
    let feedback = list(SubmissionKind::Feedback);

    Dashboard {
        today_reservations: reservations
            .iter()
            .filter(|s| active(s) && s.date("date") == Some(today))
            .cloned()
            .collect(),
        upcoming_reservations: upcoming(reservations, "date", today),
        upcoming_private_events: upcoming(list(SubmissionKind::PrivateEvent), "eventDate", today),
        totals: SubmissionKind::ALL
            .into_iter()
            .map(|kind| (kind.as_str(), list(kind).len()))
            .collect(),
        recent_feedback: recent(feedback),
        recent_applications: recent(list(SubmissionKind::Career)),
        recent_contacts: recent(list(SubmissionKind::Contact)),
        average_rating: average_rating(feedback),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn submission(kind: SubmissionKind, fields: serde_json::Value) -> StoredSubmission {
        StoredSubmission {
            id: Uuid::new_v4(),
            kind,
            status: kind.initial_status(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            fields: fields.as_object().cloned().unwrap(),
        }
    }

    #[test]
    fn test_kpis() {
        let today = NaiveDate::from_ymd_opt(2030, 1, 10).unwrap();
        let mut cancelled = submission(SubmissionKind::Reservation, json!({ "date": "2030-01-10" }));
        cancelled.status = SubmissionStatus::Cancelled;

        let mut lists = HashMap::new();
        lists.insert(
            SubmissionKind::Reservation,
            vec![
                submission(SubmissionKind::Reservation, json!({ "date": "2030-01-10" })),
                submission(SubmissionKind::Reservation, json!({ "date": "2030-01-15" })),
                submission(SubmissionKind::Reservation, json!({ "date": "2030-02-01" })),
                cancelled,
            ],
        );
        lists.insert(
            SubmissionKind::PrivateEvent,
            vec![submission(SubmissionKind::PrivateEvent, json!({ "eventDate": "2030-01-17" }))],
        );
        lists.insert(
            SubmissionKind::Feedback,
            vec![
                submission(SubmissionKind::Feedback, json!({ "overallRating": 5 })),
                submission(SubmissionKind::Feedback, json!({ "overallRating": 4 })),
                submission(SubmissionKind::Feedback, json!({ "overallRating": 4 })),
            ],
        );

        let dashboard = build_dashboard(&lists, today);
        assert_eq!(dashboard.today_reservations.len(), 1);
        assert_eq!(dashboard.upcoming_reservations, 2);
        assert_eq!(dashboard.upcoming_private_events, 1);
        assert_eq!(dashboard.totals["reservation"], 4);
        assert_eq!(dashboard.totals["career"], 0);
        assert_eq!(dashboard.recent_feedback.len(), 3);
        assert_eq!(dashboard.average_rating, Some(4.3));
    }

    #[test]
    fn test_empty_dashboard() {
        let dashboard = build_dashboard(&HashMap::new(), NaiveDate::from_ymd_opt(2030, 1, 1).unwrap());
        assert!(dashboard.average_rating.is_none());
        assert_eq!(dashboard.totals.len(), 6);
    }
}
