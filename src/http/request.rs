//! Request identification.
//!
//! # Responsibilities
//! - Assign every request an `x-request-id` (UUID v4) unless the caller sent one
//! - Echo the id on the response and attach it to the request's tracing span
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Uses tower-http's request-id layers; this module only names the pieces

use axum::http::{HeaderMap, Request};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::MakeSpan,
};
use tracing::Span;

pub const X_REQUEST_ID: &str = "x-request-id";

/// The request's id, or `"unknown"` before the id layer ran.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

/// Span per request carrying method, path and request id.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        tracing::info_span!(
            "request",
            method = %request.method(),
            path = %request.uri().path(),
            request_id = %request_id(request.headers()),
        )
    }
}
