//! Bearer-token authentication for the admin API.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use subtle::ConstantTimeEq;

use crate::config::AdminConfig;
use crate::http::response::ApiError;
use crate::http::server::AppState;

/// The authenticated back-office user, inserted as a request extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub name: String,
    pub role: String,
    pub access_level: String,
}

/// Constant-time for equal lengths; a length mismatch returns early.
fn tokens_match(presented: &[u8], expected: &[u8]) -> bool {
    bool::from(presented.ct_eq(expected))
}

/// Resolve the caller from `Authorization: Bearer <token>`.
pub fn require_admin(headers: &HeaderMap, config: &AdminConfig) -> Result<AdminUser, ApiError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(ApiError::unauthorized)?;

    config
        .users
        .iter()
        .find(|u| tokens_match(token.as_bytes(), u.token.as_bytes()))
        .map(|u| AdminUser {
            name: u.name.clone(),
            role: u.role.clone(),
            access_level: u.access_level.clone(),
        })
        .ok_or_else(ApiError::unauthorized)
}

/// Rejects unauthenticated admin calls before any handler runs.
pub async fn admin_auth_middleware(State(state): State<AppState>, mut request: Request<Body>, next: Next) -> Response {
    match require_admin(request.headers(), &state.config.admin) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(path = %request.uri().path(), "Rejected admin request");
            e.into_response()
        }
    }
}
