//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor, plus the environment-driven [`AppConfig`].
//!
//! AppState holds handles only; every handle is cheap to clone and shares
//! the same underlying hub:
//! - **StateStore** — the authoritative lock record
//! - **EventBroadcaster** — live observer set for `/ws/status`
//! - **ActuationCoordinator** — gated lock changes and rings
//! - **FrameMultiplexer** — camera fan-out, absent when no camera is configured
//! - **PairingRegistry** — what the pairing collaborator has published

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use zvonek_core::{CapabilityGate, ConfigError, SigningSecret, StateStore};
use zvonek_hub::{
    AccessoryAdapter, ActuationCoordinator, BroadcasterConfig, EventBroadcaster, FrameMultiplexer,
    FrameSource, MultiplexerConfig, PairingInfo, PairingRegistry,
};

pub use zvonek_core::DEV_SECRET;

const SECRET_VAR: &str = "ZVONEK_JWT_SECRET";

/// Application configuration.
///
/// Custom `Debug` redacts the signing secret to prevent credential leakage in logs.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// HS256 secret for bearer tokens.
    pub jwt_secret: SigningSecret,
    /// Whether `jwt_secret` is the built-in development fallback.
    pub using_dev_secret: bool,
    /// Period of the status snapshot pushed to observers.
    pub status_interval: Duration,
    /// Per-observer event queue capacity.
    pub subscriber_queue: usize,
    /// Minimum spacing between camera captures.
    pub frame_interval: Duration,
    /// JPEG served as a still camera, if any.
    pub camera_still: Option<PathBuf>,
    /// Pre-rendered pairing QR image.
    pub qr_path: PathBuf,
    /// Pairing credential file; its existence means a controller has paired.
    pub accessory_state_path: PathBuf,
    /// Pincode published by the pairing collaborator.
    pub homekit_pincode: Option<String>,
    /// Setup id published by the pairing collaborator.
    pub homekit_setup_id: Option<String>,
    /// Public ring requests allowed per client per minute.
    pub ring_rate_limit: u64,
    /// Whether request counters and `/metrics` are enabled.
    pub metrics_enabled: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("jwt_secret", &"[REDACTED]")
            .field("using_dev_secret", &self.using_dev_secret)
            .field("status_interval", &self.status_interval)
            .field("subscriber_queue", &self.subscriber_queue)
            .field("frame_interval", &self.frame_interval)
            .field("camera_still", &self.camera_still)
            .field("qr_path", &self.qr_path)
            .field("accessory_state_path", &self.accessory_state_path)
            .field("homekit_pincode", &self.homekit_pincode.as_ref().map(|_| "[REDACTED]"))
            .field("homekit_setup_id", &self.homekit_setup_id)
            .field("ring_rate_limit", &self.ring_rate_limit)
            .field("metrics_enabled", &self.metrics_enabled)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            jwt_secret: SigningSecret::new(DEV_SECRET),
            using_dev_secret: true,
            status_interval: Duration::from_millis(2000),
            subscriber_queue: 32,
            frame_interval: Duration::from_millis(33),
            camera_still: None,
            qr_path: PathBuf::from("homekit_qr.png"),
            accessory_state_path: PathBuf::from("accessory.state"),
            homekit_pincode: None,
            homekit_setup_id: None,
            ring_rate_limit: 30,
            metrics_enabled: true,
        }
    }
}

impl AppConfig {
    /// Build configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Unset variables take their defaults. A set-but-empty secret and any
    /// unparsable value are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let (jwt_secret, using_dev_secret) = match lookup(SECRET_VAR) {
            Some(secret) if secret.is_empty() => {
                return Err(ConfigError::EmptySecret { var: SECRET_VAR })
            }
            Some(secret) => (SigningSecret::new(secret), false),
            None => (defaults.jwt_secret, true),
        };

        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        Ok(Self {
            port: parse_or(&lookup, "PORT", defaults.port)?,
            jwt_secret,
            using_dev_secret,
            status_interval: Duration::from_millis(positive_or(
                &lookup,
                "ZVONEK_STATUS_INTERVAL_MS",
                2000,
            )?),
            subscriber_queue: positive_or(&lookup, "ZVONEK_SUBSCRIBER_QUEUE", 32)?,
            frame_interval: Duration::from_millis(positive_or(
                &lookup,
                "ZVONEK_FRAME_INTERVAL_MS",
                33,
            )?),
            camera_still: non_empty("ZVONEK_CAMERA_STILL").map(PathBuf::from),
            qr_path: non_empty("ZVONEK_QR_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.qr_path),
            accessory_state_path: non_empty("ZVONEK_ACCESSORY_STATE")
                .map(PathBuf::from)
                .unwrap_or(defaults.accessory_state_path),
            homekit_pincode: non_empty("ZVONEK_HOMEKIT_PINCODE"),
            homekit_setup_id: non_empty("ZVONEK_HOMEKIT_SETUP_ID"),
            ring_rate_limit: positive_or(&lookup, "ZVONEK_RING_RATE_LIMIT", defaults.ring_rate_limit)?,
            metrics_enabled: parse_or(&lookup, "ZVONEK_METRICS_ENABLED", defaults.metrics_enabled)?,
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|err: T::Err| ConfigError::InvalidValue {
            var,
            value: raw.clone(),
            reason: err.to_string(),
        }),
    }
}

fn positive_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + PartialEq + Default + Copy + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    let value = parse_or(lookup, var, default)?;
    if value == T::default() {
        return Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

/// Shared application state passed to all route handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: StateStore,
    pub broadcaster: EventBroadcaster,
    pub coordinator: ActuationCoordinator,
    pub accessory: AccessoryAdapter,
    pub frames: Option<FrameMultiplexer>,
    pub pairing: PairingRegistry,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// State with default configuration and no camera.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    /// Wire the hub from `config`, optionally with a camera source.
    pub fn with_config(config: AppConfig, camera: Option<Arc<dyn FrameSource>>) -> Self {
        let store = StateStore::new();
        let gate = CapabilityGate::new(&config.jwt_secret);
        let broadcaster = EventBroadcaster::new(
            store.clone(),
            BroadcasterConfig {
                queue_capacity: config.subscriber_queue,
                status_interval: config.status_interval,
            },
        );
        let coordinator = ActuationCoordinator::new(store.clone(), gate, broadcaster.clone());
        let frames = camera.map(|source| {
            FrameMultiplexer::new(
                source,
                MultiplexerConfig {
                    frame_interval: config.frame_interval,
                    ..MultiplexerConfig::default()
                },
            )
        });

        let pairing = PairingRegistry::new(&config.accessory_state_path, &config.qr_path);
        if let Some(pincode) = &config.homekit_pincode {
            let info = PairingInfo::new(pincode.clone());
            let info = match &config.homekit_setup_id {
                Some(setup_id) => info.with_setup_id(setup_id.clone()),
                None => info,
            };
            pairing.publish(info);
        }

        Self {
            store,
            broadcaster,
            accessory: AccessoryAdapter::new(coordinator.clone()),
            coordinator,
            frames,
            pairing,
            config: Arc::new(config),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
