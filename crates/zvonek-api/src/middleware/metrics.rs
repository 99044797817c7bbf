//! # Request Metrics
//!
//! Atomic request counters, exposed as JSON at `/metrics` together with live
//! hub gauges. Besides totals, the hub cares about two rejection classes:
//! actuation attempts refused by the capability gate (401) and doorbell
//! rings refused by the rate limiter (429).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

#[derive(Debug, Default)]
struct Counters {
    requests: AtomicU64,
    errors: AtomicU64,
    unauthorized: AtomicU64,
    rate_limited: AtomicU64,
}

/// Shared, cloneable request counters.
#[derive(Debug, Clone, Default)]
pub struct ApiMetrics {
    counters: Arc<Counters>,
}

impl ApiMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one finished request by its response status.
    pub fn record(&self, status: StatusCode) {
        let c = &self.counters;
        c.requests.fetch_add(1, Ordering::Relaxed);
        if status.is_client_error() || status.is_server_error() {
            c.errors.fetch_add(1, Ordering::Relaxed);
        }
        match status {
            StatusCode::UNAUTHORIZED => {
                c.unauthorized.fetch_add(1, Ordering::Relaxed);
            }
            StatusCode::TOO_MANY_REQUESTS => {
                c.rate_limited.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    /// Requests served.
    pub fn requests(&self) -> u64 {
        self.counters.requests.load(Ordering::Relaxed)
    }

    /// Requests answered with a 4xx or 5xx status.
    pub fn errors(&self) -> u64 {
        self.counters.errors.load(Ordering::Relaxed)
    }

    /// Actuation attempts the capability gate refused.
    pub fn unauthorized(&self) -> u64 {
        self.counters.unauthorized.load(Ordering::Relaxed)
    }

    /// Rings refused by the rate limiter.
    pub fn rate_limited(&self) -> u64 {
        self.counters.rate_limited.load(Ordering::Relaxed)
    }
}

/// Middleware that records every response in the [`ApiMetrics`] extension.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let response = next.run(request).await;
    if let Some(metrics) = metrics {
        metrics.record(response.status());
    }
    response
}
