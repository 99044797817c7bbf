//! # Door Actuation API
//!
//! Routes:
//! - GET  /api/open-door — unlock (bearer token required)
//! - GET  /api/lock-door — lock (bearer token required)
//! - POST /api/ring      — doorbell press (public, rate limited)
//!
//! Handlers delegate to the [`ActuationCoordinator`](zvonek_hub::ActuationCoordinator);
//! a rejected credential never reaches the state store.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use zvonek_core::{LockState, Snapshot};

use crate::error::AppError;
use crate::extractors::AuthorizationHeader;
use crate::state::AppState;

/// Status snapshot as returned over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusView {
    pub homekit_connected: bool,
    pub locked: bool,
    pub door_open: bool,
}

impl From<Snapshot> for StatusView {
    fn from(s: Snapshot) -> Self {
        Self {
            homekit_connected: s.homekit_connected(),
            locked: s.locked(),
            door_open: s.door_open(),
        }
    }
}

/// Outcome of an actuation or ring request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActionResponse {
    /// `"success"`.
    pub status: String,
    pub message: String,
    /// State after the request was applied.
    pub snapshot: StatusView,
}

impl ActionResponse {
    fn success(message: &str, snapshot: Snapshot) -> Json<Self> {
        Json(Self {
            status: "success".to_string(),
            message: message.to_string(),
            snapshot: snapshot.into(),
        })
    }
}

/// Build the lock actuation router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/open-door", get(open_door))
        .route("/api/lock-door", get(lock_door))
}

/// Build the doorbell router. Mounted separately so only it is rate limited.
pub fn ring_router() -> Router<AppState> {
    Router::new().route("/api/ring", post(ring))
}

/// GET /api/open-door — Unlock the door.
#[utoipa::path(
    get,
    path = "/api/open-door",
    responses(
        (status = 200, description = "Door unlocked", body = ActionResponse),
        (status = 401, description = "Missing, malformed, or invalid bearer token", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "door"
)]
pub(crate) async fn open_door(
    State(state): State<AppState>,
    auth: AuthorizationHeader,
) -> Result<Json<ActionResponse>, AppError> {
    let snapshot = state
        .coordinator
        .request_lock_change(auth.as_deref(), LockState::Unlocked)?;
    Ok(ActionResponse::success("Door opened", snapshot))
}

/// GET /api/lock-door — Lock the door.
#[utoipa::path(
    get,
    path = "/api/lock-door",
    responses(
        (status = 200, description = "Door locked", body = ActionResponse),
        (status = 401, description = "Missing, malformed, or invalid bearer token", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "door"
)]
pub(crate) async fn lock_door(
    State(state): State<AppState>,
    auth: AuthorizationHeader,
) -> Result<Json<ActionResponse>, AppError> {
    let snapshot = state
        .coordinator
        .request_lock_change(auth.as_deref(), LockState::Locked)?;
    Ok(ActionResponse::success("Door locked", snapshot))
}

/// POST /api/ring — Ring the doorbell.
#[utoipa::path(
    post,
    path = "/api/ring",
    responses(
        (status = 200, description = "Ring broadcast to all observers", body = ActionResponse),
        (status = 429, description = "Too many rings from this client", body = crate::error::ErrorBody),
    ),
    tag = "door"
)]
pub(crate) async fn ring(State(state): State<AppState>) -> Json<ActionResponse> {
    ActionResponse::success("Doorbell event sent", state.coordinator.request_ring())
}
