//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps hub errors to HTTP status codes and JSON bodies of the form
//! `{"status": "error", "error": {"code", "message"}}`. Internal error
//! details are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use zvonek_core::{Unauthorized, ZvonekError};

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Always `"error"`.
    pub status: String,
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "UNAUTHORIZED", "RATE_LIMITED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorBody {
    /// Build an error body.
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            error: ErrorDetail {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Credential rejected by the capability gate (401).
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] Unauthorized),

    /// Request could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Caller is not allowed to use this endpoint (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Too many requests from this client in the current window (429).
    #[error("rate limit exceeded")]
    RateLimited,

    /// No camera source is configured (500).
    #[error("Camera not initialized")]
    CameraNotInitialized,

    /// A collaborator is not ready (503).
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            Self::CameraNotInitialized => (StatusCode::INTERNAL_SERVER_ERROR, "CAMERA_UNAVAILABLE"),
            Self::UpstreamUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "UPSTREAM_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        (status, Json(ErrorBody::new(code, message))).into_response()
    }
}

impl From<ZvonekError> for AppError {
    fn from(err: ZvonekError) -> Self {
        match err {
            ZvonekError::UpstreamUnavailable(what) => Self::UpstreamUnavailable(what),
            other => Self::Internal(other.to_string()),
        }
    }
}
