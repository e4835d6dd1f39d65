//! HTTP error types.
//!
//! Maps domain errors from `gantry-core` into HTTP responses. Every error
//! variant produces a JSON body with a machine-readable `error` field and
//! a human-readable `message`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use gantry_core::error::CoreError;
use gantry_core::store::StoreError;

/// Application-level error returned from HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Authentication failed or the caller does not own the resource.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// A conflict (duplicate key, duplicate email).
    #[error("conflict: {0}")]
    Conflict(String),
    /// Client sent invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            // Backend detail is logged where the failure is mapped; the
            // response body carries a fixed message.
            Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal server error".to_owned(),
            ),
        };

        let body = ErrorBody {
            error: error_type,
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Unauthorized(msg) => Self::Unauthorized(msg),
            CoreError::NotFound(msg) => Self::NotFound(msg),
            err @ CoreError::DuplicateKey { .. } => Self::Conflict(err.to_string()),
            CoreError::Validation(msg) => Self::BadRequest(msg),
            CoreError::Storage(inner) => {
                tracing::error!(error = %inner, "storage failure");
                Self::Internal(inner.to_string())
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::Backend(msg) => {
                tracing::error!(error = %msg, "storage failure");
                Self::Internal(msg)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn rendered(err: ApiError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn internal_responses_withhold_backend_detail() {
        let err = ApiError::from(CoreError::Storage(StoreError::Backend(
            "connection refused: host=db.internal password=hunter2".to_owned(),
        )));
        let (status, body) = rendered(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(
            !body.contains("db.internal") && !body.contains("hunter2"),
            "backend detail must not reach the client: {body}"
        );
        assert!(body.contains("internal server error"));
    }

    #[tokio::test]
    async fn client_errors_keep_their_messages() {
        let err = ApiError::from(CoreError::Validation(
            "app name must not be empty".to_owned(),
        ));
        let (status, body) = rendered(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("bad_request"));
        assert!(body.contains("app name must not be empty"));
    }
}
