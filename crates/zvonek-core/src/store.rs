//! # Authoritative State Store
//!
//! Holds the single process-wide lock record. All operations are
//! synchronous: the lock is `parking_lot`, never held across `.await`, and
//! non-poisonable, so a panicking writer cannot wedge the hub.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::lock::{LockState, MutationOrigin, Snapshot};

#[derive(Debug, Default)]
struct LockRecord {
    state: LockState,
    homekit_connected: bool,
}

/// Thread-safe, cloneable handle to the authoritative lock record.
///
/// Cloning shares the record; construct exactly one per process and pass
/// clones to the components that need it.
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    record: Arc<RwLock<LockRecord>>,
}

impl StateStore {
    /// Create a store in the initial state: locked, never connected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the current state. Never fails and never observes a partial
    /// update.
    pub fn read(&self) -> Snapshot {
        let record = self.record.read();
        Snapshot::new(record.state, record.homekit_connected)
    }

    /// Current lock state.
    pub fn lock_state(&self) -> LockState {
        self.record.read().state
    }

    /// Unconditionally set the lock and return the resulting snapshot.
    ///
    /// Every committed mutation goes through the accessory lock mechanism,
    /// so the first one from either origin marks the lock as connected. The
    /// flag is never cleared.
    pub fn set_locked(&self, locked: bool, origin: MutationOrigin) -> Snapshot {
        let mut record = self.record.write();
        if !record.homekit_connected {
            record.homekit_connected = true;
            tracing::info!(
                origin = origin.as_str(),
                "lock mechanism engaged for the first time"
            );
        }
        record.state = LockState::from_locked(locked);
        Snapshot::new(record.state, record.homekit_connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_store_is_locked_and_disconnected() {
        let store = StateStore::new();
        let s = store.read();
        assert!(s.locked());
        assert!(!s.door_open());
        assert!(!s.homekit_connected());
    }

    #[test]
    fn api_mutation_marks_connected_permanently() {
        let store = StateStore::new();
        let s = store.set_locked(false, MutationOrigin::Api);
        assert!(!s.locked());
        assert!(s.door_open());
        assert!(s.homekit_connected());
        let s = store.set_locked(true, MutationOrigin::Api);
        assert!(s.locked());
        assert!(s.homekit_connected());
    }

    #[test]
    fn accessory_mutation_marks_connected_permanently() {
        let store = StateStore::new();
        store.set_locked(false, MutationOrigin::Accessory);
        assert!(store.read().homekit_connected());
        store.set_locked(true, MutationOrigin::Api);
        store.set_locked(true, MutationOrigin::Accessory);
        let s = store.read();
        assert!(s.homekit_connected());
        assert!(s.locked());
    }

    #[test]
    fn clones_share_the_record() {
        let a = StateStore::new();
        let b = a.clone();
        a.set_locked(false, MutationOrigin::Api);
        assert_eq!(b.lock_state(), LockState::Unlocked);
    }

    #[test]
    fn concurrent_readers_never_see_torn_snapshot() {
        let store = StateStore::new();
        let writer = {
            let store = store.clone();
            std::thread::spawn(move || {
                for i in 0..2_000 {
                    store.set_locked(i % 2 == 0, MutationOrigin::Api);
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..2_000 {
                        let s = store.read();
                        assert_eq!(s.door_open(), !s.locked());
                    }
                })
            })
            .collect();
        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
    }
}
