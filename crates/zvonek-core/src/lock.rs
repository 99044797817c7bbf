//! # Lock State and Status Snapshots

use serde::{Deserialize, Serialize};

/// Physical state of the door lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    /// Bolt engaged. The process starts here.
    #[default]
    Locked,
    /// Bolt released; the door can be opened.
    Unlocked,
}

impl LockState {
    /// Return the string representation of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
        }
    }

    /// Whether the bolt is engaged.
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked)
    }

    /// Build from a boolean `locked` flag.
    pub fn from_locked(locked: bool) -> Self {
        if locked {
            Self::Locked
        } else {
            Self::Unlocked
        }
    }

    /// HomeKit `LockCurrentState` / `LockTargetState` characteristic value.
    pub fn as_characteristic(&self) -> u8 {
        match self {
            Self::Locked => 1,
            Self::Unlocked => 0,
        }
    }

    /// Decode a characteristic value. Anything other than `1` unlocks, which
    /// matches how accessory controllers write the target state.
    pub fn from_characteristic(value: u8) -> Self {
        Self::from_locked(value == 1)
    }
}

impl std::fmt::Display for LockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a lock mutation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationOrigin {
    /// The paired accessory controller (pairing subsystem).
    Accessory,
    /// A token-gated HTTP actuation request.
    Api,
}

impl MutationOrigin {
    /// Return the string representation of this origin.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accessory => "accessory",
            Self::Api => "api",
        }
    }
}

/// Immutable view of the hub state at one instant.
///
/// Fields are private so that `door_open` can only ever be derived from
/// `locked` through [`Snapshot::new`]. Serialize-only for the same reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    homekit_connected: bool,
    locked: bool,
    door_open: bool,
}

impl Snapshot {
    /// Build a snapshot, deriving `door_open` from the lock state.
    pub fn new(lock: LockState, homekit_connected: bool) -> Self {
        let locked = lock.is_locked();
        Self {
            homekit_connected,
            locked,
            door_open: !locked,
        }
    }

    /// Whether a privileged controller has ever engaged the lock.
    pub fn homekit_connected(&self) -> bool {
        self.homekit_connected
    }

    /// Whether the bolt is engaged.
    pub fn locked(&self) -> bool {
        self.locked
    }

    /// Whether the door is released. Always `!locked`.
    pub fn door_open(&self) -> bool {
        self.door_open
    }

    /// The lock state this snapshot was taken from.
    pub fn lock_state(&self) -> LockState {
        LockState::from_locked(self.locked)
    }
}
