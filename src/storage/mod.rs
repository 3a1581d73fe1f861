//! Persistence subsystem.
//!
//! # Data Flow
//! ```text
//! Intake pipeline:
//!     → SubmissionStore::create (assign id, status, timestamps)
//!     → FileStorage::upload (resume attachments, before create)
//! Events listing:
//!     → EventStore::published_events (filter, order, page)
//! Admin:
//!     → SubmissionStore::list / get / update_status
//! ```
//!
//! # Design Decisions
//! - Every backend sits behind a trait shared as `Arc<dyn _>` so tests can swap in failing doubles
//! - `create` may return `Ok(None)`; callers treat a missing record as a persistence failure
//! - The bundled backends are in-process (`memory.rs`) and local disk (`files.rs`)

pub mod files;
pub mod memory;
pub mod model;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::intake::body::UploadedFile;

pub use files::LocalFileStorage;
pub use memory::MemoryStore;
pub use model::{
    Event, EventPage, EventQuery, NewSubmission, Record, StoredSubmission, SubmissionKind,
    SubmissionStatus,
};

/// Failure reported by a submission or event backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Failure reported by a file backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid object name: {0}")]
    InvalidName(String),
    #[error("upload failed: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Persist a new submission. The store assigns id, status and timestamps.
    async fn create(&self, submission: NewSubmission) -> Result<Option<StoredSubmission>, StoreError>;

    /// All submissions of `kind`, newest first.
    async fn list(&self, kind: SubmissionKind) -> Result<Vec<StoredSubmission>, StoreError>;

    async fn get(&self, kind: SubmissionKind, id: Uuid) -> Result<Option<StoredSubmission>, StoreError>;

    /// Move a submission to `status`. `Ok(None)` when no such submission exists.
    async fn update_status(
        &self,
        kind: SubmissionKind,
        id: Uuid,
        status: SubmissionStatus,
    ) -> Result<Option<StoredSubmission>, StoreError>;
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Published events dated `today` or later, ascending by date.
    async fn published_events(&self, query: &EventQuery, today: NaiveDate) -> Result<EventPage, StoreError>;
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store `file` as `name` inside `bucket` and return its public URL.
    async fn upload(&self, bucket: &str, name: &str, file: &UploadedFile) -> Result<String, StorageError>;
}
