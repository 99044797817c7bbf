//! # Error Hierarchy
//!
//! Structured error types for the door hub, built with `thiserror`.
//!
//! Three failure classes exist at runtime:
//!
//! - [`Unauthorized`]: a bad, missing, or expired credential. Surfaced to
//!   the caller as 401 and never escalated further.
//! - `UpstreamUnavailable`: the camera or pairing collaborator is not
//!   ready. Surfaced as a degraded response.
//! - Delivery failures: a subscriber's channel broke or filled up. These
//!   are handled inside the broadcaster and never reach a caller, so they
//!   have no variant here.
//!
//! [`ZvonekError`] is what startup and collaborator reads return.
//! [`ConfigError`] is the only class allowed to abort process startup.

use thiserror::Error;

/// Top-level error type for the door hub.
#[derive(Error, Debug)]
pub enum ZvonekError {
    /// Startup configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An external collaborator (camera, pairing subsystem) is not ready.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons a presented credential was rejected by the capability gate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Unauthorized {
    /// No `Authorization` header was sent.
    #[error("missing authorization header")]
    MissingHeader,

    /// The header used a scheme other than `Bearer`.
    #[error("authorization header must use Bearer scheme")]
    WrongScheme,

    /// The header was not valid visible ASCII, or the token was empty.
    #[error("malformed authorization header")]
    MalformedHeader,

    /// The token signature was valid but its `exp` claim has passed.
    #[error("token expired")]
    Expired,

    /// The token failed decoding or signature verification.
    #[error("invalid bearer token: {0}")]
    InvalidToken(String),
}

/// Invalid startup configuration.
///
/// Carries the offending variable name so operators can fix the deployment
/// without reading source.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The signing secret was provided but is empty.
    #[error("{var} is set but empty; a non-empty signing secret is required")]
    EmptySecret {
        /// Environment variable that held the secret.
        var: &'static str,
    },

    /// A variable could not be parsed into its expected type.
    #[error("{var}={value:?} is invalid: {reason}")]
    InvalidValue {
        /// Environment variable name.
        var: &'static str,
        /// The raw value found.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}
