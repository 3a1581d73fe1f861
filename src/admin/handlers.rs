//! Admin API handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::auth::AdminUser;
use super::dashboard::{build_dashboard, Dashboard};
use crate::http::response::{ApiError, ApiResponse, ApiResult};
use crate::http::server::AppState;
use crate::storage::{StoredSubmission, SubmissionKind, SubmissionStatus};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub user: AdminUser,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: SubmissionStatus,
}

fn kind_from_slug(slug: &str) -> Result<SubmissionKind, ApiError> {
    SubmissionKind::from_slug(slug).ok_or_else(|| ApiError::not_found(format!("Unknown submission type: {slug}")))
}

pub async fn get_status(State(state): State<AppState>, Extension(user): Extension<AdminUser>) -> ApiResult<SystemStatus> {
    Ok(ApiResponse::ok(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
        user,
    }))
}

/// `GET /api/admin/{slug}`, newest first.
pub async fn list_submissions(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Vec<StoredSubmission>> {
    let kind = kind_from_slug(&slug)?;
    let submissions = state.submissions.list(kind).await.map_err(ApiError::internal)?;
    Ok(ApiResponse::ok(submissions))
}

/// `PATCH /api/admin/{slug}/{id}/status`
pub async fn update_status(
    State(state): State<AppState>,
    Extension(user): Extension<AdminUser>,
    Path((slug, id)): Path<(String, String)>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult<StoredSubmission> {
    let kind = kind_from_slug(&slug)?;
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::invalid_parameter("id must be a UUID"))?;
    let Json(update) = body.map_err(|e| ApiError::malformed(e.body_text()))?;

    let updated = state
        .submissions
        .update_status(kind, id, update.status)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found(format!("No {kind} submission with id {id}")))?;

    tracing::info!(
        admin = %user.name,
        kind = kind.as_str(),
        id = %id,
        status = ?update.status,
        "Submission status updated"
    );
    Ok(ApiResponse::with_message(updated, "Status updated"))
}

/// `GET /api/admin/dashboard`
pub async fn get_dashboard(State(state): State<AppState>) -> ApiResult<Dashboard> {
    let mut lists = HashMap::new();
    for kind in SubmissionKind::ALL {
        let list = state.submissions.list(kind).await.map_err(ApiError::internal)?;
        lists.insert(kind, list);
    }
    let today = chrono::Local::now().date_naive();
    Ok(ApiResponse::ok(build_dashboard(&lists, today)))
}
