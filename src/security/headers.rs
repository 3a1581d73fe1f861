//! Security response headers.
//!
//! # Responsibilities
//! - Add X-Content-Type-Options, X-Frame-Options and Referrer-Policy
//!
//! # Design Decisions
//! - Headers are only set when the handler did not set them already
//! - Toggled by `security.enable_headers`

use axum::http::header::{REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS};
use axum::{http::HeaderValue, Router};
use tower_http::set_header::SetResponseHeaderLayer;

/// Wrap a router with the security header layers.
pub fn apply_security_headers<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(SetResponseHeaderLayer::if_not_present(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
}
