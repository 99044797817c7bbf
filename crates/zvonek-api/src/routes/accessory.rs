//! # Accessory Hook
//!
//! The pairing collaborator runs as its own process next to the hub. It
//! reads and writes the lock-mechanism characteristic through these routes,
//! which forward into the [`LockAccessory`] adapter. Only loopback peers are
//! accepted; the pairing protocol authenticates the controller.
//!
//! Routes:
//! - GET /internal/accessory/lock — current characteristic value
//! - PUT /internal/accessory/lock — apply a characteristic value (0 unsecured, 1 secured)

use std::net::SocketAddr;

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use zvonek_core::LockState;
use zvonek_hub::LockAccessory;

use crate::error::AppError;
use crate::extractors::extract_json;
use crate::routes::door::StatusView;
use crate::state::AppState;

/// Lock-mechanism characteristic.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Characteristic {
    /// 1 = secured, 0 = unsecured.
    pub value: u8,
}

/// Result of an accessory write.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccessoryWrite {
    pub value: u8,
    pub snapshot: StatusView,
}

/// Build the accessory hook router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/internal/accessory/lock",
        get(read_characteristic).put(write_characteristic),
    )
}

fn require_loopback(peer: SocketAddr) -> Result<(), AppError> {
    if peer.ip().is_loopback() {
        Ok(())
    } else {
        tracing::warn!(%peer, "accessory hook called from non-loopback peer");
        Err(AppError::Forbidden("accessory hook is loopback-only".to_string()))
    }
}

/// GET /internal/accessory/lock — Read the lock characteristic.
#[utoipa::path(
    get,
    path = "/internal/accessory/lock",
    responses(
        (status = 200, description = "Current characteristic", body = Characteristic),
        (status = 403, description = "Caller is not on loopback", body = crate::error::ErrorBody),
    ),
    tag = "accessory"
)]
pub(crate) async fn read_characteristic(
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> Result<Json<Characteristic>, AppError> {
    require_loopback(peer)?;
    Ok(Json(Characteristic {
        value: state.accessory.characteristic(),
    }))
}

/// PUT /internal/accessory/lock — Apply a lock characteristic from a paired controller.
#[utoipa::path(
    put,
    path = "/internal/accessory/lock",
    request_body = Characteristic,
    responses(
        (status = 200, description = "Applied", body = AccessoryWrite),
        (status = 400, description = "Value is not 0 or 1", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not on loopback", body = crate::error::ErrorBody),
    ),
    tag = "accessory"
)]
pub(crate) async fn write_characteristic(
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
    body: Result<Json<Characteristic>, JsonRejection>,
) -> Result<Json<AccessoryWrite>, AppError> {
    require_loopback(peer)?;
    let Characteristic { value } = extract_json(body)?;
    if value > 1 {
        return Err(AppError::BadRequest(format!(
            "characteristic value must be 0 or 1, got {value}"
        )));
    }

    let snapshot = state.accessory.set_lock_state(LockState::from_characteristic(value));
    Ok(Json(AccessoryWrite {
        value: snapshot.lock_state().as_characteristic(),
        snapshot: snapshot.into(),
    }))
}
