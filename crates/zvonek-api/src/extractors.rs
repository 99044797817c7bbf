//! # Custom Extractors
//!
//! [`AuthorizationHeader`] hands the raw bearer header to the capability
//! gate; [`extract_json`] maps body rejections to [`AppError::BadRequest`].

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;

use zvonek_core::Unauthorized;

use crate::error::AppError;

/// Raw `Authorization` header value, `None` when absent.
///
/// Verification is left to the coordinator so that rejection happens before
/// any state is touched. A header that is not visible ASCII is rejected here
/// as malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationHeader(pub Option<String>);

impl AuthorizationHeader {
    /// Header value as passed to the capability gate.
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthorizationHeader {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.headers.get(AUTHORIZATION) {
            None => Ok(Self(None)),
            Some(value) => value
                .to_str()
                .map(|v| Self(Some(v.to_string())))
                .map_err(|_| {
                    tracing::warn!(reason = %Unauthorized::MalformedHeader, "authorization rejected");
                    AppError::Unauthorized(Unauthorized::MalformedHeader)
                }),
        }
    }
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}
