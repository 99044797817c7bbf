//! # zvonek-api — Axum API Services for the Zvonek Door Hub
//!
//! HTTP and WebSocket surface over the hub in `zvonek-hub`. Handlers hold no
//! business logic; they translate requests into coordinator, broadcaster,
//! multiplexer, and pairing-registry calls.
//!
//! ## API Surface
//!
//! | Route                          | Module                     | Auth          |
//! |--------------------------------|----------------------------|---------------|
//! | `GET /api/open-door`           | [`routes::door`]           | Bearer        |
//! | `GET /api/lock-door`           | [`routes::door`]           | Bearer        |
//! | `POST /api/ring`               | [`routes::door`]           | rate limited  |
//! | `WS /ws/status`                | [`routes::status_ws`]      | none          |
//! | `GET /api/camera-stream`       | [`routes::camera`]         | none          |
//! | `GET /api/homekit-*`           | [`routes::homekit`]        | none          |
//! | `GET/PUT /internal/accessory/lock` | [`routes::accessory`]  | loopback only |
//! | `GET /metrics`                 | [`routes::metrics`]        | none          |
//! | `GET /openapi.json`            | [`openapi`]                | none          |
//! | `GET /health/*`                | this module                | none          |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! CorsLayer → TraceLayer → MetricsMiddleware → [RateLimitMiddleware on /api/ring] → Handler
//! ```

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::metrics::ApiMetrics;
use crate::middleware::rate_limit::{RateLimitConfig, RateLimiter};

pub use error::AppError;
pub use state::{AppConfig, AppState};

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) are mounted outside the middleware stack.
/// The accessory hook needs the peer address, so serve the router with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn app(state: AppState) -> Router {
    let metrics = ApiMetrics::new();
    let limiter = RateLimiter::new(RateLimitConfig {
        max_requests: state.config.ring_rate_limit,
        ..RateLimitConfig::default()
    });
    let metrics_enabled = state.config.metrics_enabled;

    let ring = routes::door::ring_router()
        .layer(from_fn(middleware::rate_limit::rate_limit_middleware))
        .layer(axum::Extension(limiter));

    let mut api = Router::new()
        .merge(routes::door::router())
        .merge(ring)
        .merge(routes::status_ws::router())
        .merge(routes::camera::router())
        .merge(routes::homekit::router())
        .merge(routes::accessory::router())
        .merge(openapi::router());

    if metrics_enabled {
        api = api
            .merge(routes::metrics::router())
            .layer(from_fn(middleware::metrics::metrics_middleware))
            .layer(axum::Extension(metrics));
    }

    let api = api
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Unauthenticated health probes.
    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}
