//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define intake metrics (requests, latency, submissions, limiter events)
//! - Expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `intake_requests_total` (counter): requests by route, status
//! - `intake_request_duration_seconds` (histogram): latency by route
//! - `intake_submissions_total` (counter): submissions by kind, outcome
//! - `intake_rate_limited_total` (counter): rejections by policy
//! - `intake_rate_limiter_store_errors_total` (counter): counter store failures by fail mode
//! - `intake_notifications_total` (counter): notification attempts by kind, outcome
//!
//! # Design Decisions
//! - Route labels come from the matched route template, never the raw path
//! - Outcome labels reuse the envelope error codes

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(route: &str, status: u16, start: Instant) {
    let route = route.to_string();
    counter!(
        "intake_requests_total",
        "route" => route.clone(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("intake_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_submission(kind: &'static str, outcome: &'static str) {
    counter!("intake_submissions_total", "kind" => kind, "outcome" => outcome).increment(1);
}

pub fn record_rate_limited(policy: &'static str) {
    counter!("intake_rate_limited_total", "policy" => policy).increment(1);
}

pub fn record_rate_limiter_store_error(mode: &'static str) {
    counter!("intake_rate_limiter_store_errors_total", "mode" => mode).increment(1);
}

pub fn record_notification(kind: &'static str, outcome: &'static str) {
    counter!("intake_notifications_total", "kind" => kind, "outcome" => outcome).increment(1);
}

/// Route-level middleware recording request count and latency.
///
/// Installed with `route_layer` so the matched path is available.
pub async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let response = next.run(request).await;
    record_request(&route, response.status().as_u16(), start);
    response
}
