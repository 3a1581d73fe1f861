//! Admin API: authenticated read and status-update access to submissions.
//!
//! # Data Flow
//! ```text
//! /api/admin/*
//!     → auth.rs (bearer token → AdminUser extension, else 401)
//!     → handlers.rs (list, update status, dashboard)
//!     → storage::SubmissionStore
//! ```
//!
//! # Design Decisions
//! - Mounted only when `admin.enabled`
//! - Shares the public envelope so one client library handles both

pub mod auth;
pub mod dashboard;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, patch},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub use auth::{require_admin, AdminUser};

pub fn setup_admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/status", get(get_status))
        .route("/api/admin/dashboard", get(get_dashboard))
        .route("/api/admin/{slug}", get(list_submissions))
        .route("/api/admin/{slug}/{id}/status", patch(update_status))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
