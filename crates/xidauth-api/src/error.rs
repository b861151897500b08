//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps [`VerifyError`] to HTTP status codes and returns JSON bodies with an
//! error code, message and optional details. Backend failure details are
//! logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use xidauth_core::{AuthState, Decision};
use xidauth_verify::VerifyError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. "NOT_FOUND", "NOT_UP_TO_DATE").
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Server not configured (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request body failed business-rule validation (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (422).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Internal failure (500). Message is logged but not returned.
    #[error("internal error: {0}")]
    Internal(String),

    /// Chain node or GSP unreachable or misbehaving (502).
    #[error("upstream error: {0}")]
    UpstreamError(String),

    /// The GSP is not synchronized (503). Carries the decision to report.
    #[error("backend state is {state}")]
    NotUpToDate { state: String },
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::UNPROCESSABLE_ENTITY, "BAD_REQUEST"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::UpstreamError(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            Self::NotUpToDate { .. } => (StatusCode::SERVICE_UNAVAILABLE, "NOT_UP_TO_DATE"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::UpstreamError(_) => "An upstream service error occurred".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::UpstreamError(_) => tracing::error!(error = %self, "upstream backend error"),
            Self::NotUpToDate { .. } => tracing::warn!(error = %self, "backend not up to date"),
            _ => {}
        }

        let details = match &self {
            Self::NotUpToDate { .. } => {
                serde_json::to_value(Decision::bare(AuthState::NotUpToDate)).ok()
            }
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<VerifyError> for AppError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::UnknownServer(server) => {
                Self::NotFound(format!("server {server} is not configured"))
            }
            VerifyError::NotUpToDate { state } => Self::NotUpToDate { state },
            VerifyError::Transport(e) => Self::UpstreamError(e.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("verification task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use xidauth_verify::TransportError;

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (AppError::Validation("x".into()), StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            (AppError::BadRequest("x".into()), StatusCode::UNPROCESSABLE_ENTITY, "BAD_REQUEST"),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            (AppError::UpstreamError("x".into()), StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            (
                AppError::NotUpToDate { state: "catching-up".into() },
                StatusCode::SERVICE_UNAVAILABLE,
                "NOT_UP_TO_DATE",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_and_code(), (status, code), "{err}");
        }
    }

    #[test]
    fn test_verify_error_mapping() {
        let err = AppError::from(VerifyError::UnknownServer("chat.example".into()));
        assert!(matches!(err, AppError::NotFound(ref m) if m.contains("chat.example")));

        let err = AppError::from(VerifyError::NotUpToDate {
            state: "catching-up".into(),
        });
        assert!(matches!(err, AppError::NotUpToDate { ref state } if state == "catching-up"));

        let err = AppError::from(VerifyError::Transport(TransportError::Timeout {
            endpoint: "http://node".into(),
        }));
        assert!(matches!(err, AppError::UpstreamError(_)));
    }

    #[tokio::test]
    async fn test_upstream_hides_details() {
        let (status, body) =
            response_parts(AppError::UpstreamError("http://secret-node:8545 refused".into())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!body.error.message.contains("secret-node"));
        assert!(body.error.details.is_none());
    }

    #[tokio::test]
    async fn test_internal_hides_details() {
        let (status, body) = response_parts(AppError::Internal("panicked".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.message, "An internal error occurred");
    }

    #[tokio::test]
    async fn test_not_up_to_date_carries_decision() {
        let (status, body) = response_parts(AppError::NotUpToDate {
            state: "catching-up".into(),
        })
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.error.message.contains("catching-up"));
        let details = body.error.details.unwrap();
        assert_eq!(details["valid"], false);
        assert_eq!(details["state"], "not-up-to-date");
    }

    #[tokio::test]
    async fn test_not_found_message() {
        let (status, body) = response_parts(AppError::NotFound("server x".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.error.message.contains("server x"));
    }
}
