//! # Door Events and Hub Messages
//!
//! [`DoorEvent`] is a discrete, ephemeral notification. [`HubMessage`] is
//! what an observer actually receives: either a periodic [`Snapshot`] or a
//! discrete event.
//!
//! ## Wire Format
//!
//! ```text
//! {"homekit_connected":false,"locked":true,"door_open":false}   status
//! {"event":"doorbell"}                                           ring
//! {"event":"lock_state_changed","state":"unlocked",
//!  "homekit_connected":true,"locked":false,"door_open":true}     lock change
//! ```
//!
//! Panel clients apply `locked`, `door_open` and `homekit_connected` from
//! every frame they receive, so a lock change carries the full status
//! alongside its `state`.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::lock::{LockState, Snapshot};

/// A discrete event fanned out to every attached observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorEvent {
    /// Someone pressed the doorbell.
    DoorbellRang,
    /// The lock was committed to a new state.
    LockStateChanged {
        /// The state after the change.
        state: LockState,
        /// Connection flag as of the commit.
        homekit_connected: bool,
    },
}

impl DoorEvent {
    /// Lock change event for a committed snapshot.
    pub fn lock_changed(snapshot: &Snapshot) -> Self {
        Self::LockStateChanged {
            state: snapshot.lock_state(),
            homekit_connected: snapshot.homekit_connected(),
        }
    }

    /// Short name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DoorbellRang => "doorbell",
            Self::LockStateChanged { .. } => "lock_state_changed",
        }
    }
}

impl Serialize for DoorEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Self::DoorbellRang => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("event", self.kind())?;
                map.end()
            }
            Self::LockStateChanged {
                state,
                homekit_connected,
            } => {
                let snapshot = Snapshot::new(state, homekit_connected);
                let mut map = serializer.serialize_map(Some(5))?;
                map.serialize_entry("event", self.kind())?;
                map.serialize_entry("state", &state)?;
                map.serialize_entry("homekit_connected", &snapshot.homekit_connected())?;
                map.serialize_entry("locked", &snapshot.locked())?;
                map.serialize_entry("door_open", &snapshot.door_open())?;
                map.end()
            }
        }
    }
}

/// One unit of delivery to an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum HubMessage {
    /// Periodic full status.
    Status(Snapshot),
    /// A discrete event.
    Event(DoorEvent),
}

impl HubMessage {
    /// Serialize to the JSON text sent over the status socket.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<DoorEvent> for HubMessage {
    fn from(event: DoorEvent) -> Self {
        Self::Event(event)
    }
}

impl From<Snapshot> for HubMessage {
    fn from(snapshot: Snapshot) -> Self {
        Self::Status(snapshot)
    }
}
