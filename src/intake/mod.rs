//! Form intake subsystem.
//!
//! # Data Flow
//! ```text
//! POST /api/<form> (already rate checked)
//!     → body.rs (JSON or multipart → field record + optional file)
//!     → schema.rs (coerce, then validate against forms.rs catalogue)
//!     → sanitize.rs (strip markup from free text)
//!     → upload.rs (career resume: check type and size, then store)
//!     → storage (create record)
//!     → notification (detached)
//!     → envelope response
//! ```
//!
//! # Design Decisions
//! - All six forms share `pipeline.rs`; they differ only in their schema
//! - Any stage can end the request with an error; notification cannot

pub mod body;
pub mod forms;
pub mod handlers;
pub mod pipeline;
pub mod sanitize;
pub mod schema;
pub mod upload;

pub use body::{FileSlot, FormPayload, UploadedFile};
pub use forms::IntakeForm;
pub use pipeline::{IntakeService, SubmissionReceipt};
pub use schema::{FieldError, Schema, ValidationContext};
