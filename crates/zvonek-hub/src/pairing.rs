//! # Pairing Registry
//!
//! Holds what the pairing collaborator publishes about the accessory: the
//! setup pincode, the optional setup id, and whether a controller has ever
//! paired (the collaborator's persisted accessory state file exists).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use zvonek_core::ZvonekError;

/// Pairing material published by the accessory server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairingInfo {
    /// Setup code in `XXX-XX-XXX` form.
    pub pincode: String,
    /// Four-character setup id, if the accessory has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_id: Option<String>,
}

impl PairingInfo {
    /// Pairing info with no setup id.
    pub fn new(pincode: impl Into<String>) -> Self {
        Self {
            pincode: pincode.into(),
            setup_id: None,
        }
    }

    /// Attach a setup id.
    pub fn with_setup_id(mut self, setup_id: impl Into<String>) -> Self {
        self.setup_id = Some(setup_id.into());
        self
    }

    /// Setup URI encoded in the pairing QR code: `X-HM://{setup_id}{digits}`.
    pub fn setup_uri(&self) -> String {
        let digits: String = self.pincode.chars().filter(|c| *c != '-').collect();
        format!(
            "X-HM://{}{}",
            self.setup_id.as_deref().unwrap_or_default(),
            digits
        )
    }
}

#[derive(Debug)]
struct Registry {
    info: RwLock<Option<PairingInfo>>,
    accessory_state_path: PathBuf,
    qr_path: PathBuf,
}

/// Shared view of the pairing collaborator's published state.
#[derive(Debug, Clone)]
pub struct PairingRegistry {
    inner: Arc<Registry>,
}

impl PairingRegistry {
    /// Registry watching `accessory_state_path` for pairing and serving the
    /// QR image at `qr_path`.
    pub fn new(accessory_state_path: impl Into<PathBuf>, qr_path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Registry {
                info: RwLock::new(None),
                accessory_state_path: accessory_state_path.into(),
                qr_path: qr_path.into(),
            }),
        }
    }

    /// Record newly generated pairing material, replacing any previous one.
    pub fn publish(&self, info: PairingInfo) {
        tracing::info!(setup_id = info.setup_id.as_deref().unwrap_or("-"), "pairing code published");
        *self.inner.info.write() = Some(info);
    }

    /// Current pairing material, if generated.
    pub fn info(&self) -> Option<PairingInfo> {
        self.inner.info.read().clone()
    }

    /// Current pincode, if generated.
    pub fn pincode(&self) -> Option<String> {
        self.inner.info.read().as_ref().map(|i| i.pincode.clone())
    }

    /// Whether a controller has paired.
    pub fn is_paired(&self) -> bool {
        self.inner.accessory_state_path.exists()
    }

    /// Location of the pairing QR image.
    pub fn qr_path(&self) -> &Path {
        &self.inner.qr_path
    }

    /// The rendered QR image, or `None` if the collaborator has not written
    /// one yet. An image that exists but cannot be read is an upstream fault.
    pub async fn qr_image(&self) -> Result<Option<Vec<u8>>, ZvonekError> {
        match tokio::fs::read(self.qr_path()).await {
            Ok(png) => Ok(Some(png)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => {
                tracing::warn!(path = %self.qr_path().display(), error = %err, "pairing QR image unreadable");
                Err(ZvonekError::UpstreamUnavailable(
                    "pairing QR image unreadable".to_string(),
                ))
            }
        }
    }
}
