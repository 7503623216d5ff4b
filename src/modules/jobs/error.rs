use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::common::response::ApiResponse;

/// Failure taxonomy for a media job. Every processing failure collapses
/// into one of these before it reaches a caller or a chat.
#[derive(Debug, Clone, Error)]
pub enum JobError {
    #[error("{0}")]
    Validation(String),

    #[error("failed to fetch source media: {0}")]
    Fetch(String),

    #[error("transcoding failed: {0}")]
    Transcode(String),

    #[error("processing exceeded the {0}s deadline and was cancelled")]
    Timeout(u64),

    #[error("result delivery failed: {0}")]
    Delivery(String),
}

impl JobError {
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::Validation(_) => "validation",
            JobError::Fetch(_) => "fetch",
            JobError::Transcode(_) => "transcode",
            JobError::Timeout(_) => "timeout",
            JobError::Delivery(_) => "delivery",
        }
    }

    /// Whether a caller may reasonably retry the same job. Bad input is
    /// not retryable; transient transport problems are.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            JobError::Fetch(_) | JobError::Timeout(_) | JobError::Delivery(_)
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            JobError::Validation(_) => StatusCode::BAD_REQUEST,
            JobError::Fetch(_) => StatusCode::BAD_GATEWAY,
            JobError::Transcode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            JobError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            JobError::Delivery(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for JobError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()>::error_with_code(self.kind(), &self.to_string());
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_and_statuses_line_up() {
        let cases: Vec<(JobError, &str, StatusCode, bool)> = vec![
            (
                JobError::Validation("bad".into()),
                "validation",
                StatusCode::BAD_REQUEST,
                false,
            ),
            (
                JobError::Fetch("down".into()),
                "fetch",
                StatusCode::BAD_GATEWAY,
                true,
            ),
            (
                JobError::Transcode("broken".into()),
                "transcode",
                StatusCode::UNPROCESSABLE_ENTITY,
                false,
            ),
            (
                JobError::Timeout(120),
                "timeout",
                StatusCode::GATEWAY_TIMEOUT,
                true,
            ),
            (
                JobError::Delivery("gone".into()),
                "delivery",
                StatusCode::BAD_GATEWAY,
                true,
            ),
        ];

        for (err, kind, status, retryable) in cases {
            assert_eq!(err.kind(), kind);
            assert_eq!(err.status_code(), status);
            assert_eq!(err.is_retryable(), retryable);
        }
    }

    #[test]
    fn timeout_message_names_the_deadline() {
        let err = JobError::Timeout(120);
        assert!(err.to_string().contains("120s"));
    }
}
