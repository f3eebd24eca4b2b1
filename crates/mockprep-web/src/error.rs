//! JSON error responses.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mockprep_core::{CoreError, ErrorKind};
use serde_json::json;
use tracing::error;

/// An error rendered as `{"error": "..."}` with a matching status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Returns the HTTP status of this error.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the error text.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let status = match err.kind() {
            ErrorKind::Configuration | ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => {
                error!(error = %err, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use mockprep_core::Level;

    use super::*;

    #[test]
    fn test_should_map_error_kinds_to_status() {
        let cases = [
            (CoreError::UnknownTemplate("x".into()), StatusCode::BAD_REQUEST),
            (
                CoreError::UnsupportedLevel {
                    template: "t1".into(),
                    level: Level::Middle,
                },
                StatusCode::BAD_REQUEST,
            ),
            (CoreError::InvalidScore(11.0), StatusCode::BAD_REQUEST),
            (CoreError::SessionNotFound("x".into()), StatusCode::NOT_FOUND),
            (
                CoreError::Io(std::io::Error::other("disk full")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status(), status, "{}", api.message());
        }
    }

    #[test]
    fn test_should_keep_error_text() {
        let api: ApiError = CoreError::SessionNotFound("abc".into()).into();
        assert_eq!(api.message(), "session not found: abc");
    }
}
