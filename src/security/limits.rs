//! Request body limits.
//!
//! # Responsibilities
//! - Cap the bytes read from any request body
//!
//! # Design Decisions
//! - One ceiling for JSON and multipart; it must leave room for a full resume
//! - The cap is enforced while reading, before anything is decoded

use axum::extract::DefaultBodyLimit;

use crate::config::SecurityConfig;

/// Layer that applies `security.max_body_size` to body extractors.
pub fn body_limit(config: &SecurityConfig) -> DefaultBodyLimit {
    DefaultBodyLimit::max(config.max_body_size)
}
