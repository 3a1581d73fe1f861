//! Response envelope and error kinds.
//!
//! # Responsibilities
//! - One success shape: `{ success: true, data, message? }`
//! - One error shape: `{ success: false, error: { code, message, details? } }`
//! - Map every error kind to its HTTP status
//!
//! # Design Decisions
//! - Handlers return `Result<ApiResponse<T>, ApiError>`; nothing else reaches the client
//! - 500-class messages are generic; the cause is logged server-side

use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

/// Machine-readable error codes carried in the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ValidationError,
    MalformedBody,
    FileValidationError,
    InvalidParameter,
    Unauthorized,
    NotFound,
    RateLimited,
    PersistenceError,
    InternalError,
}

impl ErrorKind {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::ValidationError
            | ErrorKind::MalformedBody
            | ErrorKind::FileValidationError
            | ErrorKind::InvalidParameter => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::PersistenceError | ErrorKind::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "VALIDATION_ERROR",
            ErrorKind::MalformedBody => "MALFORMED_BODY",
            ErrorKind::FileValidationError => "FILE_VALIDATION_ERROR",
            ErrorKind::InvalidParameter => "INVALID_PARAMETER",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::RateLimited => "RATE_LIMITED",
            ErrorKind::PersistenceError => "PERSISTENCE_ERROR",
            ErrorKind::InternalError => "INTERNAL_ERROR",
        }
    }
}

/// Error returned by any endpoint.
#[derive(Debug, thiserror::Error)]
#[error("{}: {}", .kind.code(), .message)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<Value>,
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            headers: Vec::new(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedBody, message)
    }

    pub fn file(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FileValidationError, message)
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParameter, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorKind::Unauthorized, "Authentication required")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Logs the cause and returns a generic persistence failure.
    pub fn persistence(cause: impl std::fmt::Display) -> Self {
        tracing::error!(error = %cause, "Persistence failure");
        Self::new(
            ErrorKind::PersistenceError,
            "Failed to save your submission. Please try again.",
        )
    }

    /// Logs the cause and returns a generic internal failure.
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        tracing::error!(error = %cause, "Internal error");
        Self::new(
            ErrorKind::InternalError,
            "An unexpected error occurred. Please try again later.",
        )
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: ErrorKind,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Value>,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    success: bool,
    error: ErrorBody<'a>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorEnvelope {
            success: false,
            error: ErrorBody {
                code: self.kind,
                message: &self.message,
                details: self.details.as_ref(),
            },
        };
        let mut response = (self.kind.status(), Json(body)).into_response();
        for (name, value) in self.headers {
            response.headers_mut().insert(name, value);
        }
        response
    }
}

/// Successful response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Result type for endpoint handlers.
pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::not_found("No such endpoint")
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorKind::ValidationError.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::MalformedBody.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::FileValidationError.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorKind::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            ErrorKind::PersistenceError.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_envelope_shape() {
        let response = ApiError::validation("Invalid input data")
            .with_details(serde_json::json!([{ "field": "email", "message": "bad" }]))
            .with_header(
                HeaderName::from_static("retry-after"),
                HeaderValue::from_static("5"),
            )
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()["retry-after"], "5");
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["details"][0]["field"], "email");
    }

    #[tokio::test]
    async fn test_success_envelope_omits_empty_message() {
        let json = body_json(ApiResponse::ok(serde_json::json!({ "id": "1" })).into_response()).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["id"], "1");
        assert!(json.get("message").is_none());

        let json = body_json(ApiResponse::with_message(1, "done").into_response()).await;
        assert_eq!(json["message"], "done");
    }

    #[test]
    fn test_code_matches_serialized_name() {
        for kind in [
            ErrorKind::ValidationError,
            ErrorKind::MalformedBody,
            ErrorKind::FileValidationError,
            ErrorKind::RateLimited,
            ErrorKind::PersistenceError,
            ErrorKind::Unauthorized,
        ] {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.code());
        }
    }
}
