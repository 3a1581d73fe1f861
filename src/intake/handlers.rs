//! Axum handlers for the public form endpoints.

use axum::extract::{Request, State};

use super::pipeline::SubmissionReceipt;
use crate::http::response::ApiResult;
use crate::http::server::AppState;
use crate::storage::SubmissionKind;

pub async fn submit_reservation(State(state): State<AppState>, request: Request) -> ApiResult<SubmissionReceipt> {
    state.intake.submit(SubmissionKind::Reservation, request).await
}

pub async fn submit_private_event(State(state): State<AppState>, request: Request) -> ApiResult<SubmissionReceipt> {
    state.intake.submit(SubmissionKind::PrivateEvent, request).await
}

pub async fn submit_banquet(State(state): State<AppState>, request: Request) -> ApiResult<SubmissionReceipt> {
    state.intake.submit(SubmissionKind::Banquet, request).await
}

pub async fn submit_contact(State(state): State<AppState>, request: Request) -> ApiResult<SubmissionReceipt> {
    state.intake.submit(SubmissionKind::Contact, request).await
}

pub async fn submit_feedback(State(state): State<AppState>, request: Request) -> ApiResult<SubmissionReceipt> {
    state.intake.submit(SubmissionKind::Feedback, request).await
}

/// Accepts JSON with `resumeUrl`, or multipart with a `resume` file part.
pub async fn submit_career(State(state): State<AppState>, request: Request) -> ApiResult<SubmissionReceipt> {
    state.intake.submit(SubmissionKind::Career, request).await
}
