//! # Per-Client Rate Limiting
//!
//! Fixed-window rate limiter for the public doorbell endpoint, keyed by the
//! TCP peer address. Client-supplied headers are ignored: the hub is served
//! directly, with no proxy in front to vouch for them. In-memory only, and
//! the number of tracked clients is bounded.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use parking_lot::Mutex;

use crate::error::AppError;

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u64,
    /// Window length.
    pub window: Duration,
    /// Upper bound on distinct clients tracked at once.
    pub max_clients: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window: Duration::from_secs(60),
            max_clients: 1024,
        }
    }
}

/// Per-key rate limit state.
#[derive(Debug, Clone)]
struct BucketState {
    count: u64,
    window_start: Instant,
}

/// Shared rate limiter state.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Arc<Mutex<HashMap<ClientKey, BucketState>>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given config.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Check if a request from the given client should be allowed.
    pub fn check(&self, key: ClientKey) -> bool {
        let mut buckets = self.buckets.lock();
        let now = Instant::now();

        if !buckets.contains_key(&key) && buckets.len() >= self.config.max_clients {
            let window = self.config.window;
            buckets.retain(|_, b| now.duration_since(b.window_start) < window);
            // Still full: evict the client whose window started first.
            if buckets.len() >= self.config.max_clients {
                let oldest = buckets
                    .iter()
                    .min_by_key(|(_, b)| b.window_start)
                    .map(|(k, _)| *k);
                if let Some(oldest) = oldest {
                    buckets.remove(&oldest);
                }
            }
        }

        let bucket = buckets.entry(key).or_insert(BucketState {
            count: 0,
            window_start: now,
        });

        if now.duration_since(bucket.window_start) >= self.config.window {
            bucket.count = 0;
            bucket.window_start = now;
        }

        if bucket.count >= self.config.max_requests {
            false
        } else {
            bucket.count += 1;
            true
        }
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.buckets.lock().len()
    }
}

/// Identity a request is counted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientKey {
    /// The TCP peer's IP address.
    Peer(IpAddr),
    /// No connection info was attached to the request.
    Unknown,
}

impl std::fmt::Display for ClientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Peer(ip) => write!(f, "{ip}"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Rate limit key for a request: the peer IP from `ConnectInfo`.
fn client_key(request: &Request) -> ClientKey {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| ClientKey::Peer(addr.ip()))
        .unwrap_or(ClientKey::Unknown)
}

/// Middleware that enforces per-client rate limits.
pub async fn rate_limit_middleware(request: Request, next: Next) -> Response {
    let limiter = request.extensions().get::<RateLimiter>().cloned();

    if let Some(limiter) = limiter {
        let key = client_key(&request);
        if !limiter.check(key) {
            tracing::warn!(client = %key, path = %request.uri().path(), "rate limit exceeded");
            return AppError::RateLimited.into_response();
        }
    }

    next.run(request).await
}
