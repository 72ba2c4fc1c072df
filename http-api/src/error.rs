//! Error handling for the HTTP API
//!
//! Maps task errors to status codes and JSON error bodies.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use task_core::TaskError;
use thiserror::Error;
use tracing::error;

/// Seconds a client is asked to wait before retrying while the database is down
pub const RETRY_AFTER_SECS: u64 = 5;

/// Hint sent with every 503 answer
pub const RETRY_HINT: &str = "Please retry your request in a few moments";

/// Errors returned by HTTP handlers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No database connection right now; retryable
    #[error("Database temporarily unavailable")]
    Unavailable,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or wrong API key
    #[error("Forbidden")]
    Forbidden,

    /// Detail is logged, never sent to the client
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::Unavailable(_) => ApiError::Unavailable,
            TaskError::Validation(msg) => ApiError::BadRequest(msg),
            TaskError::NotFound(msg) => ApiError::NotFound(msg),
            TaskError::Database(msg) => ApiError::Internal(format!("Database error: {msg}")),
            TaskError::Configuration(msg) => {
                ApiError::Internal(format!("Configuration error: {msg}"))
            }
            TaskError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            ApiError::Unavailable => {
                let body = Json(json!({
                    "error": "database_unavailable",
                    "message": "Database temporarily unavailable",
                    "hint": RETRY_HINT,
                }));
                let mut response = (status, body).into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(RETRY_AFTER_SECS));
                response
            }
            ApiError::BadRequest(message) => (
                status,
                Json(json!({ "error": "bad_request", "message": message })),
            )
                .into_response(),
            ApiError::NotFound(message) => (
                status,
                Json(json!({ "error": "not_found", "message": message })),
            )
                .into_response(),
            ApiError::Forbidden => (status, Json(json!({ "error": "Forbidden" }))).into_response(),
            ApiError::Internal(detail) => {
                error!(error = %detail, "Request failed with an internal error");
                (
                    status,
                    Json(json!({
                        "error": "internal_error",
                        "message": "Internal server error",
                    })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_error_mapping() {
        assert_eq!(ApiError::from(TaskError::unavailable()), ApiError::Unavailable);
        assert_eq!(
            ApiError::from(TaskError::Validation("bad title".into())),
            ApiError::BadRequest("bad title".into())
        );
        assert_eq!(
            ApiError::from(TaskError::not_found_id(7)).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(TaskError::Database("syntax".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unavailable_response_carries_retry_after() {
        let response = ApiError::Unavailable.into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response.headers().get(header::RETRY_AFTER).unwrap(),
            &RETRY_AFTER_SECS.to_string()
        );
    }
}
