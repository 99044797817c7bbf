//! # Pairing Accessors
//!
//! Read-only pass-throughs into what the pairing collaborator has published.
//!
//! Routes:
//! - GET /api/homekit-qr     — pre-rendered QR image, or `{error}` if not generated yet
//! - GET /api/homekit-code   — `{pincode, setup_uri}`, or `{error}` if not generated yet
//! - GET /api/homekit-status — `{homekit_connected}`, true once a controller has paired

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::state::AppState;

/// Body returned when the collaborator has not produced something yet.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotReady {
    pub error: String,
}

impl NotReady {
    fn new(what: &str) -> Json<Self> {
        Json(Self {
            error: format!("{what} not generated yet"),
        })
    }
}

/// Pairing code response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PairingCode {
    pub pincode: String,
    /// Payload encoded in the pairing QR code.
    pub setup_uri: String,
}

/// Pairing status response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PairingStatus {
    pub homekit_connected: bool,
}

/// Build the pairing router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/homekit-qr", get(homekit_qr))
        .route("/api/homekit-code", get(homekit_code))
        .route("/api/homekit-status", get(homekit_status))
}

/// GET /api/homekit-qr — Pairing QR code image.
#[utoipa::path(
    get,
    path = "/api/homekit-qr",
    responses(
        (status = 200, description = "PNG image, or a not-ready body when no QR code exists yet"),
        (status = 503, description = "QR image exists but could not be read", body = crate::error::ErrorBody),
    ),
    tag = "homekit"
)]
pub(crate) async fn homekit_qr(State(state): State<AppState>) -> Result<Response, AppError> {
    Ok(match state.pairing.qr_image().await? {
        Some(png) => ([(CONTENT_TYPE, "image/png")], png).into_response(),
        None => NotReady::new("QR Code").into_response(),
    })
}

/// GET /api/homekit-code — Pairing pincode.
#[utoipa::path(
    get,
    path = "/api/homekit-code",
    responses(
        (status = 200, description = "Pincode, or a not-ready body when none is published", body = PairingCode),
    ),
    tag = "homekit"
)]
pub(crate) async fn homekit_code(State(state): State<AppState>) -> Response {
    match state.pairing.info() {
        Some(info) => Json(PairingCode {
            setup_uri: info.setup_uri(),
            pincode: info.pincode,
        })
        .into_response(),
        None => NotReady::new("HomeKit Code").into_response(),
    }
}

/// GET /api/homekit-status — Whether a controller has paired.
#[utoipa::path(
    get,
    path = "/api/homekit-status",
    responses(
        (status = 200, description = "Pairing status", body = PairingStatus),
    ),
    tag = "homekit"
)]
pub(crate) async fn homekit_status(State(state): State<AppState>) -> Json<PairingStatus> {
    Json(PairingStatus {
        homekit_connected: state.pairing.is_paired(),
    })
}
