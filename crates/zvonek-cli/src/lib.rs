//! # zvonek-cli — Operator CLI for the Zvonek Door Hub
//!
//! Provides the `zvonek` command-line interface.
//!
//! ## Subcommands
//!
//! - `zvonek token issue` — Mint an HS256 bearer token for the actuation endpoints.
//! - `zvonek token verify` — Check a token against the shared secret.
//! - `zvonek pairing uri` — Print the setup URI a pairing QR code encodes.
//!
//! ```bash
//! ZVONEK_JWT_SECRET=... zvonek token issue --subject 42 --surname Novak --ttl-secs 7200
//! curl -H "Authorization: Bearer $(zvonek token issue)" http://door.local:8000/api/open-door
//! ```

pub mod pairing;
pub mod token;

use zvonek_core::{SigningSecret, DEV_SECRET};

/// Resolve the signing secret from `--secret` / `ZVONEK_JWT_SECRET`.
///
/// Falls back to the development secret with a warning, matching the server.
pub fn resolve_secret(secret: Option<&str>) -> anyhow::Result<SigningSecret> {
    match secret {
        Some("") => anyhow::bail!("ZVONEK_JWT_SECRET is set but empty"),
        Some(secret) => Ok(SigningSecret::new(secret)),
        None => {
            tracing::warn!("no secret given; using the development secret");
            Ok(SigningSecret::new(DEV_SECRET))
        }
    }
}
