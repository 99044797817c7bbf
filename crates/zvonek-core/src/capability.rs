//! # Capability Gate
//!
//! Stateless bearer-token check guarding every state-mutating request.
//!
//! ## Token Format
//!
//! ```text
//! Authorization: Bearer <JWT>       — HS256, signed with the shared secret
//! ```
//!
//! The JWT must carry an `exp` claim. `sub` and `surname` are optional and
//! only used for log attribution. There is no session, no revocation list,
//! and no refresh: a token is valid exactly while its signature checks out
//! and it has not expired.
//!
//! The shared secret is a single process-wide value. It is held in a
//! zeroizing buffer and redacted from `Debug` output.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::Unauthorized;

const BEARER_PREFIX: &str = "Bearer ";

/// Development fallback secret, used only when no secret is configured.
pub const DEV_SECRET: &str = "dev-secret";

/// Claims carried by an actuation token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Expiry, seconds since the Unix epoch.
    pub exp: u64,
    /// Issued-at, seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    /// Subject identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Household surname the token was issued to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
}

impl Claims {
    /// Claims issued now and expiring after `ttl`. An expiry past the
    /// representable range saturates.
    pub fn expiring_in(ttl: chrono::Duration) -> Self {
        Self::try_expiring_in(ttl).unwrap_or_else(|| {
            let bound = if ttl < chrono::Duration::zero() {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            };
            Self::at(Utc::now(), bound)
        })
    }

    /// Claims issued now and expiring after `ttl`, or `None` if the expiry
    /// is not a representable time.
    pub fn try_expiring_in(ttl: chrono::Duration) -> Option<Self> {
        let now = Utc::now();
        let exp = now.checked_add_signed(ttl)?;
        Some(Self::at(now, exp))
    }

    fn at(issued: DateTime<Utc>, expires: DateTime<Utc>) -> Self {
        Self {
            exp: unix_seconds(expires),
            iat: Some(unix_seconds(issued)),
            sub: None,
            surname: None,
        }
    }

    /// Set the subject.
    pub fn with_subject(mut self, sub: impl Into<String>) -> Self {
        self.sub = Some(sub.into());
        self
    }

    /// Set the surname.
    pub fn with_surname(mut self, surname: impl Into<String>) -> Self {
        self.surname = Some(surname.into());
        self
    }
}

fn unix_seconds(at: DateTime<Utc>) -> u64 {
    u64::try_from(at.timestamp()).unwrap_or(0)
}

/// Shared HMAC secret.
///
/// Custom `Debug` redacts the value to prevent credential leakage in logs.
#[derive(Clone)]
pub struct SigningSecret(Zeroizing<Vec<u8>>);

impl SigningSecret {
    /// Wrap raw secret bytes.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    /// Whether the secret has zero length.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningSecret([REDACTED])")
    }
}

/// Verifies bearer credentials against the shared secret.
///
/// Cheap to clone; keys are derived once at construction.
#[derive(Clone)]
pub struct CapabilityGate {
    decoding: DecodingKey,
    encoding: EncodingKey,
    validation: Validation,
}

impl std::fmt::Debug for CapabilityGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityGate")
            .field("algorithm", &"HS256")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl CapabilityGate {
    /// Build a gate for the given secret.
    pub fn new(secret: &SigningSecret) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify the raw value of an `Authorization` header.
    ///
    /// `None` means the header was absent.
    pub fn verify(&self, authorization: Option<&str>) -> Result<Claims, Unauthorized> {
        let header = authorization.ok_or(Unauthorized::MissingHeader)?;
        let token = header
            .strip_prefix(BEARER_PREFIX)
            .ok_or(Unauthorized::WrongScheme)?
            .trim();
        if token.is_empty() || token.contains(char::is_whitespace) {
            return Err(Unauthorized::MalformedHeader);
        }
        self.verify_token(token)
    }

    /// Verify a bare token (no scheme prefix).
    pub fn verify_token(&self, token: &str) -> Result<Claims, Unauthorized> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => Unauthorized::Expired,
                _ => Unauthorized::InvalidToken(err.to_string()),
            })
    }

    /// Mint an HS256 token for the given claims.
    pub fn issue(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
    }
}
