//! CORS for the public endpoints.
//!
//! # Responsibilities
//! - Build a `CorsLayer` per route group from `CorsConfig`
//! - Answer preflights with 204 instead of the layer's empty 200
//!
//! # Design Decisions
//! - `*` in `cors.allowed_origins` allows any origin without credentials
//! - A listed origin is echoed back with credentials allowed
//! - Unlisted origins get no allow-origin header; the browser blocks them

use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request, StatusCode,
    },
    middleware::Next,
    response::Response,
};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::CorsConfig;

pub const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");

/// Verbs advertised by the form submission routes.
pub const FORM_METHODS: [Method; 2] = [Method::POST, Method::OPTIONS];

/// Verbs advertised by the read-only routes.
pub const READ_METHODS: [Method; 2] = [Method::GET, Method::OPTIONS];

/// CORS layer for a route group accepting `methods`.
pub fn cors_layer(config: &CorsConfig, methods: &[Method]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(methods.to_vec())
        .allow_headers([CONTENT_TYPE, AUTHORIZATION, X_REQUESTED_WITH])
        .max_age(Duration::from_secs(config.max_age_secs));

    if config.allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    layer.allow_origin(AllowOrigin::list(origins)).allow_credentials(true)
}

/// Turns the empty 200 that `CorsLayer` gives a preflight into a 204.
pub async fn preflight_no_content(request: Request<Body>, next: Next) -> Response {
    let preflight = request.method() == Method::OPTIONS;
    let mut response = next.run(request).await;
    if preflight && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}
