//! # Metrics Endpoint
//!
//! `GET /metrics` — request counters plus live hub gauges as JSON.

use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::middleware::metrics::ApiMetrics;
use crate::state::AppState;

/// Metrics snapshot.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MetricsReport {
    pub requests: u64,
    pub errors: u64,
    /// Actuation attempts refused for a bad or missing token.
    pub unauthorized: u64,
    /// Doorbell rings refused by the rate limiter.
    pub rate_limited: u64,
    /// Observers currently attached to the status socket.
    pub subscribers: usize,
    /// Events dropped because an observer's queue was full.
    pub events_dropped: u64,
    /// Whether a camera acquisition session is running.
    pub camera_active: bool,
}

/// Build the metrics router.
pub fn router() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics))
}

/// GET /metrics — Request counters and hub gauges.
#[utoipa::path(
    get,
    path = "/metrics",
    responses(
        (status = 200, description = "Metrics snapshot", body = MetricsReport),
    ),
    tag = "operations"
)]
pub(crate) async fn metrics(
    State(state): State<AppState>,
    Extension(counters): Extension<ApiMetrics>,
) -> Json<MetricsReport> {
    Json(MetricsReport {
        requests: counters.requests(),
        errors: counters.errors(),
        unauthorized: counters.unauthorized(),
        rate_limited: counters.rate_limited(),
        subscribers: state.broadcaster.subscriber_count(),
        events_dropped: state.broadcaster.dropped_total(),
        camera_active: state.frames.as_ref().is_some_and(|f| f.is_active()),
    })
}
