//! The submission pipeline shared by every public form.
//!
//! # Responsibilities
//! - Run parse → validate → sanitize → file check → persist → notify for one request
//! - Map each stage's failure to exactly one envelope error
//!
//! # Design Decisions
//! - Rate limiting already happened in middleware; nothing here runs for rejected clients
//! - Nothing reaches a store or the file bucket unless it validated and was sanitized
//! - Notification is dispatched after persistence and never awaited

use axum::{body::Body, http::Request};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use super::body::{parse_body, FileSlot, UploadedFile};
use super::forms::IntakeForm;
use super::sanitize::sanitize_record;
use super::schema::{FieldError, ValidationContext};
use super::upload::{storage_name, validate_file};
use crate::config::{FormLimits, UploadConfig};
use crate::http::response::{ApiError, ApiResponse, ApiResult};
use crate::notification::{self, Notifier};
use crate::observability::metrics;
use crate::security::ClientKey;
use crate::storage::{
    FileStorage, NewSubmission, SubmissionKind, SubmissionStatus, SubmissionStore,
};

/// Echoed back to the submitter on success.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub id: Uuid,
    pub kind: SubmissionKind,
    pub status: SubmissionStatus,
    pub submitted_at: chrono::DateTime<Utc>,
}

pub struct IntakeService {
    forms: HashMap<SubmissionKind, IntakeForm>,
    store: Arc<dyn SubmissionStore>,
    files: Arc<dyn FileStorage>,
    notifier: Arc<dyn Notifier>,
    uploads: UploadConfig,
    trust_forwarded: bool,
}

impl IntakeService {
    pub fn new(
        limits: &FormLimits,
        uploads: UploadConfig,
        store: Arc<dyn SubmissionStore>,
        files: Arc<dyn FileStorage>,
        notifier: Arc<dyn Notifier>,
        trust_forwarded: bool,
    ) -> Self {
        let forms = SubmissionKind::ALL
            .into_iter()
            .map(|kind| (kind, IntakeForm::new(kind, limits)))
            .collect();
        Self {
            forms,
            store,
            files,
            notifier,
            uploads,
            trust_forwarded,
        }
    }

    pub fn form(&self, kind: SubmissionKind) -> Option<&IntakeForm> {
        self.forms.get(&kind)
    }

    /// Handle one submission of `kind`.
    pub async fn submit(&self, kind: SubmissionKind, request: Request<Body>) -> ApiResult<SubmissionReceipt> {
        let start = Instant::now();
        let client = ClientKey::from_request(&request, self.trust_forwarded);
        let today = chrono::Local::now().date_naive();

        let result = self.run(kind, request, today).await;
        match &result {
            Ok(response) => {
                metrics::record_submission(kind.as_str(), "accepted");
                tracing::info!(
                    kind = kind.as_str(),
                    id = %response.data.id,
                    client = %client,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Submission accepted"
                );
            }
            Err(e) => {
                metrics::record_submission(kind.as_str(), e.kind.code());
                tracing::info!(
                    kind = kind.as_str(),
                    client = %client,
                    code = e.kind.code(),
                    "Submission rejected"
                );
            }
        }
        result
    }

    async fn run(&self, kind: SubmissionKind, request: Request<Body>, today: NaiveDate) -> ApiResult<SubmissionReceipt> {
        let form = self
            .form(kind)
            .ok_or_else(|| ApiError::internal(format!("no form registered for {kind}")))?;

        let file_slot = form.upload.map(|slot| FileSlot {
            part: slot.part,
            max_bytes: self.uploads.max_resume_bytes,
        });
        let mut payload = parse_body(request, file_slot).await?;

        // With a multipart upload the URL field is ours to fill in, never the client's.
        let deferred: Vec<&'static str> = match form.upload {
            Some(slot) if payload.multipart => {
                payload.fields.remove(slot.url_field);
                vec![slot.url_field]
            }
            _ => Vec::new(),
        };
        if payload.multipart {
            form.schema.coerce_form_fields(&mut payload.fields);
        }

        let ctx = ValidationContext {
            today,
            deferred: &deferred,
        };
        let mut record = form
            .schema
            .validate(&payload.fields, &ctx)
            .map_err(validation_error)?;

        // Stripping markup can leave a field short or empty, so check again.
        sanitize_record(&mut record, &form.schema);
        let mut record = form
            .schema
            .validate(&record, &ctx)
            .map_err(validation_error)?;

        if let (Some(slot), true) = (form.upload, payload.multipart) {
            let url = self.store_file(payload.file.as_ref()).await?;
            record.insert(slot.url_field.to_string(), url.into());
        }

        let message = form.success_message(&record);
        let stored = self
            .store
            .create(NewSubmission { kind, fields: record })
            .await
            .map_err(ApiError::persistence)?
            .ok_or_else(|| ApiError::persistence(format!("store returned no {kind} record")))?;

        notification::dispatch(self.notifier.clone(), stored.clone());

        Ok(ApiResponse::with_message(
            SubmissionReceipt {
                id: stored.id,
                kind: stored.kind,
                status: stored.status,
                submitted_at: stored.created_at,
            },
            message,
        ))
    }

    async fn store_file(&self, file: Option<&UploadedFile>) -> Result<String, ApiError> {
        let file = validate_file(file, &self.uploads)?;
        let name = storage_name(&file.filename, Utc::now().timestamp_millis());
        self.files
            .upload(&self.uploads.bucket, &name, file)
            .await
            .map_err(ApiError::persistence)
    }
}

fn validation_error(errors: Vec<FieldError>) -> ApiError {
    let message = match errors.as_slice() {
        [only] => format!("Invalid {}: {}", only.field, only.message),
        _ => format!("{} fields are invalid", errors.len()),
    };
    let details = serde_json::to_value(&errors).unwrap_or_default();
    ApiError::validation(message).with_details(details)
}
