//! Request body decoding.
//!
//! # Responsibilities
//! - Decode JSON bodies into a field record
//! - Decode multipart bodies into text fields plus at most one file part
//!
//! # Design Decisions
//! - A missing `Content-Type` is read as JSON
//! - Multipart is only accepted where the form declares an upload slot
//! - The file part is kept as raw bytes; checking it is `upload.rs`'s job
//! - Body size is capped by the router's `DefaultBodyLimit`; a multipart body
//!   that hits the cap is reported as an oversized file

use axum::{
    body::{Body, Bytes},
    extract::{multipart::MultipartError, FromRequest, Multipart},
    http::{header::CONTENT_TYPE, Request, StatusCode},
};
use serde_json::Value;

use super::upload::file_too_large;
use crate::http::response::ApiError;
use crate::storage::Record;

/// A file part taken from a multipart body.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Where a form's file arrives and how large it may be.
#[derive(Debug, Clone, Copy)]
pub struct FileSlot<'a> {
    pub part: &'a str,
    pub max_bytes: usize,
}

/// Decoded request body.
#[derive(Debug, Default)]
pub struct FormPayload {
    pub fields: Record,
    pub file: Option<UploadedFile>,
    pub multipart: bool,
}

enum BodyKind {
    Json,
    Multipart,
    Other(String),
}

fn body_kind(request: &Request<Body>) -> BodyKind {
    let Some(value) = request.headers().get(CONTENT_TYPE) else {
        return BodyKind::Json;
    };
    let content_type = value.to_str().unwrap_or_default().to_ascii_lowercase();
    let essence = content_type.split(';').next().unwrap_or_default().trim();

    if essence == "application/json" || essence.ends_with("+json") {
        BodyKind::Json
    } else if essence == "multipart/form-data" {
        BodyKind::Multipart
    } else {
        BodyKind::Other(essence.to_string())
    }
}

/// Decode `request` into a payload.
///
/// `upload` names the multipart part holding the file; forms without one
/// reject multipart bodies.
pub async fn parse_body(request: Request<Body>, upload: Option<FileSlot<'_>>) -> Result<FormPayload, ApiError> {
    match body_kind(&request) {
        BodyKind::Json => parse_json(request).await,
        BodyKind::Multipart => match upload {
            Some(slot) => parse_multipart(request, slot).await,
            None => Err(ApiError::malformed(
                "This form only accepts application/json bodies",
            )),
        },
        BodyKind::Other(content_type) => Err(ApiError::malformed(format!(
            "Unsupported content type: {content_type}"
        ))),
    }
}

async fn parse_json(request: Request<Body>) -> Result<FormPayload, ApiError> {
    let bytes = Bytes::from_request(request, &())
        .await
        .map_err(|e| ApiError::malformed(format!("Could not read request body: {}", e.body_text())))?;

    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::malformed(format!("Invalid JSON in request body: {e}")))?;

    match value {
        Value::Object(fields) => Ok(FormPayload {
            fields,
            file: None,
            multipart: false,
        }),
        _ => Err(ApiError::malformed("Request body must be a JSON object")),
    }
}

fn multipart_error(e: MultipartError, slot: FileSlot<'_>, context: &str) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return file_too_large(slot.max_bytes);
    }
    ApiError::malformed(format!("{context}: {}", e.body_text()))
}

async fn parse_multipart(request: Request<Body>, slot: FileSlot<'_>) -> Result<FormPayload, ApiError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| ApiError::malformed(format!("Invalid multipart body: {}", e.body_text())))?;

    let mut payload = FormPayload {
        multipart: true,
        ..FormPayload::default()
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, slot, "Invalid multipart body"))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == slot.part {
            let filename = field.file_name().unwrap_or_default().to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| multipart_error(e, slot, "Could not read file part"))?;

            // Browsers send an empty, unnamed part when no file was chosen.
            if filename.is_empty() && bytes.is_empty() {
                continue;
            }
            payload.file = Some(UploadedFile {
                filename,
                content_type,
                bytes,
            });
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| multipart_error(e, slot, &format!("Could not read field {name}")))?;
        insert_text(&mut payload.fields, name, text);
    }

    Ok(payload)
}

/// Repeated names collect into an array.
fn insert_text(fields: &mut Record, name: String, text: String) {
    match fields.get_mut(&name) {
        Some(Value::Array(items)) => items.push(Value::String(text)),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, Value::String(text)]);
        }
        None => {
            fields.insert(name, Value::String(text));
        }
    }
}
