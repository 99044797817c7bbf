//! # Accessory Adapter
//!
//! The pairing subsystem (HomeKit accessory server) is an external
//! collaborator. It only needs two hooks on the lock service: read the
//! current lock characteristic and write a new target. [`LockAccessory`]
//! is that seam; [`AccessoryAdapter`] routes both hooks through the
//! [`ActuationCoordinator`] so accessory-originated changes are serialized
//! and broadcast exactly like API-originated ones.

use zvonek_core::{LockState, Snapshot};

use crate::coordinator::ActuationCoordinator;

/// Lock-mechanism hooks exposed to the pairing subsystem.
pub trait LockAccessory: Send + Sync {
    /// Current lock state.
    fn lock_state(&self) -> LockState;

    /// Apply a lock state requested by a paired controller.
    fn set_lock_state(&self, target: LockState) -> Snapshot;

    /// Current state as a lock-mechanism characteristic value (1 secured, 0 unsecured).
    fn characteristic(&self) -> u8 {
        self.lock_state().as_characteristic()
    }

    /// Apply a raw characteristic value. Anything other than 1 unlocks.
    fn set_characteristic(&self, value: u8) -> Snapshot {
        self.set_lock_state(LockState::from_characteristic(value))
    }
}

/// [`LockAccessory`] backed by the hub's coordinator.
#[derive(Debug, Clone)]
pub struct AccessoryAdapter {
    coordinator: ActuationCoordinator,
}

impl AccessoryAdapter {
    /// Adapter forwarding into `coordinator`.
    pub fn new(coordinator: ActuationCoordinator) -> Self {
        Self { coordinator }
    }
}

impl LockAccessory for AccessoryAdapter {
    fn lock_state(&self) -> LockState {
        self.coordinator.snapshot().lock_state()
    }

    fn set_lock_state(&self, target: LockState) -> Snapshot {
        self.coordinator.apply_accessory_change(target)
    }
}
