//! # Actuation Coordinator
//!
//! Validates and serializes every lock mutation:
//!
//! ```text
//! verify credential ─→ (commit lock) ─→ StateStore::set_locked ─→ publish LockStateChanged
//! ```
//!
//! The credential check happens before the commit lock is taken and before
//! any state is touched. The write and the publish run under one mutex, so
//! the order in which observers see `LockStateChanged` events is the order
//! in which states were committed, and the last committed request wins.
//!
//! Two mutation paths exist:
//!
//! - [`ActuationCoordinator::request_lock_change`]: HTTP path, bearer token
//!   required, origin [`MutationOrigin::Api`].
//! - [`ActuationCoordinator::apply_accessory_change`]: trusted path used by
//!   the pairing subsystem adapter, origin [`MutationOrigin::Accessory`].

use std::sync::Arc;

use parking_lot::Mutex;

use zvonek_core::{
    CapabilityGate, DoorEvent, LockState, MutationOrigin, Snapshot, StateStore, Unauthorized,
};

use crate::broadcaster::EventBroadcaster;

/// Serializes lock actuation and doorbell rings onto the hub.
#[derive(Debug, Clone)]
pub struct ActuationCoordinator {
    store: StateStore,
    gate: CapabilityGate,
    broadcaster: EventBroadcaster,
    commit: Arc<Mutex<()>>,
}

impl ActuationCoordinator {
    /// Wire a coordinator over the shared store, gate, and broadcaster.
    pub fn new(store: StateStore, gate: CapabilityGate, broadcaster: EventBroadcaster) -> Self {
        Self {
            store,
            gate,
            broadcaster,
            commit: Arc::new(Mutex::new(())),
        }
    }

    /// Token-gated lock change.
    ///
    /// `authorization` is the raw `Authorization` header value, if any. On
    /// rejection nothing is mutated and nothing is published.
    pub fn request_lock_change(
        &self,
        authorization: Option<&str>,
        target: LockState,
    ) -> Result<Snapshot, Unauthorized> {
        let claims = self.gate.verify(authorization).map_err(|reason| {
            tracing::warn!(%reason, requested = %target, "lock change rejected");
            reason
        })?;

        let snapshot = self.commit(target, MutationOrigin::Api);
        tracing::info!(
            requested = %target,
            subject = claims.sub.as_deref().unwrap_or("-"),
            surname = claims.surname.as_deref().unwrap_or("-"),
            "lock changed via API"
        );
        Ok(snapshot)
    }

    /// Lock change requested by the paired accessory controller.
    ///
    /// The pairing protocol has already authenticated the controller, so no
    /// bearer check applies.
    pub fn apply_accessory_change(&self, target: LockState) -> Snapshot {
        let snapshot = self.commit(target, MutationOrigin::Accessory);
        tracing::info!(requested = %target, "lock changed via accessory controller");
        snapshot
    }

    /// Doorbell press. Public; never alters lock state.
    pub fn request_ring(&self) -> Snapshot {
        let report = self.broadcaster.publish(DoorEvent::DoorbellRang);
        tracing::info!(
            delivered = report.delivered,
            dropped = report.dropped,
            "doorbell rang"
        );
        self.store.read()
    }

    /// Current state.
    pub fn snapshot(&self) -> Snapshot {
        self.store.read()
    }

    fn commit(&self, target: LockState, origin: MutationOrigin) -> Snapshot {
        let _guard = self.commit.lock();
        let snapshot = self.store.set_locked(target.is_locked(), origin);
        self.broadcaster.publish(DoorEvent::lock_changed(&snapshot));
        tracing::debug!(origin = origin.as_str(), state = %snapshot.lock_state(), "lock committed");
        snapshot
    }
}
