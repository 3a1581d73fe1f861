//! In-process submission and event store.
//!
//! # Responsibilities
//! - Hold submissions per kind in insertion order
//! - Serve the published events calendar
//! - Load and save a JSON snapshot so restarts keep submissions
//!
//! # Design Decisions
//! - One DashMap shard entry per kind; appends and status updates lock only that kind
//! - Snapshots are written on shutdown, not per write

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use uuid::Uuid;

use super::{
    Event, EventPage, EventQuery, EventStore, NewSubmission, StoreError, StoredSubmission,
    SubmissionKind, SubmissionStatus, SubmissionStore,
};

#[derive(Serialize, Deserialize, Default)]
struct Snapshot {
    submissions: Vec<StoredSubmission>,
}

#[derive(Default)]
pub struct MemoryStore {
    submissions: DashMap<SubmissionKind, Vec<StoredSubmission>>,
    events: RwLock<Vec<Event>>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new(snapshot_path: Option<PathBuf>) -> Self {
        Self {
            snapshot_path,
            ..Self::default()
        }
    }

    /// Create a store and fill it from `path` when the snapshot exists.
    pub fn load_from_file(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let store = Self::new(Some(path.clone()));
        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            let snapshot: Snapshot = serde_json::from_reader(reader)?;
            let count = snapshot.submissions.len();
            for submission in snapshot.submissions {
                store.submissions.entry(submission.kind).or_default().push(submission);
            }
            for mut entry in store.submissions.iter_mut() {
                entry.value_mut().sort_by_key(|s| s.created_at);
            }
            tracing::info!(count, path = %path.display(), "Loaded submissions from snapshot");
        }
        Ok(store)
    }

    /// Write every submission to the snapshot path, if one is configured.
    pub fn save_to_file(&self) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut snapshot = Snapshot::default();
        for entry in self.submissions.iter() {
            snapshot.submissions.extend(entry.value().iter().cloned());
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, &snapshot)?;
        tracing::info!(
            count = snapshot.submissions.len(),
            path = %path.display(),
            "Saved submissions to snapshot"
        );
        Ok(())
    }

    /// Replace the events calendar with the JSON array in `path`.
    pub fn seed_events(&self, path: &Path) -> Result<usize, StoreError> {
        let reader = BufReader::new(File::open(path)?);
        let events: Vec<Event> = serde_json::from_reader(reader)?;
        let count = events.len();
        self.set_events(events);
        Ok(count)
    }

    pub fn set_events(&self, events: Vec<Event>) {
        match self.events.write() {
            Ok(mut guard) => *guard = events,
            Err(poisoned) => *poisoned.into_inner() = events,
        }
    }

    pub fn add_event(&self, event: Event) {
        match self.events.write() {
            Ok(mut guard) => guard.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }

    /// Total number of stored submissions across all kinds.
    pub fn len(&self) -> usize {
        self.submissions.iter().map(|e| e.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn create(&self, submission: NewSubmission) -> Result<Option<StoredSubmission>, StoreError> {
        let now = Utc::now();
        let stored = StoredSubmission {
            id: Uuid::new_v4(),
            kind: submission.kind,
            status: submission.kind.initial_status(),
            created_at: now,
            updated_at: now,
            fields: submission.fields,
        };
        self.submissions
            .entry(submission.kind)
            .or_default()
            .push(stored.clone());
        Ok(Some(stored))
    }

    async fn list(&self, kind: SubmissionKind) -> Result<Vec<StoredSubmission>, StoreError> {
        Ok(self
            .submissions
            .get(&kind)
            .map(|entries| entries.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    async fn get(&self, kind: SubmissionKind, id: Uuid) -> Result<Option<StoredSubmission>, StoreError> {
        Ok(self
            .submissions
            .get(&kind)
            .and_then(|entries| entries.iter().find(|s| s.id == id).cloned()))
    }

    async fn update_status(
        &self,
        kind: SubmissionKind,
        id: Uuid,
        status: SubmissionStatus,
    ) -> Result<Option<StoredSubmission>, StoreError> {
        let Some(mut entries) = self.submissions.get_mut(&kind) else {
            return Ok(None);
        };
        Ok(entries.iter_mut().find(|s| s.id == id).map(|s| {
            s.status = status;
            s.updated_at = Utc::now();
            s.clone()
        }))
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn published_events(&self, query: &EventQuery, today: NaiveDate) -> Result<EventPage, StoreError> {
        let events = self
            .events
            .read()
            .map_err(|_| StoreError::Unavailable("events lock poisoned".into()))?;

        let mut matching: Vec<&Event> = events
            .iter()
            .filter(|e| e.published && e.event_date >= today)
            .filter(|e| query.event_type.as_deref().is_none_or(|t| e.event_type == t))
            .filter(|e| query.space.as_deref().is_none_or(|s| e.space == s))
            .collect();
        matching.sort_by(|a, b| {
            a.event_date
                .cmp(&b.event_date)
                .then_with(|| a.start_time.cmp(&b.start_time))
        });

        let total = matching.len();
        let events = matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect();
        Ok(EventPage { events, total })
    }
}
