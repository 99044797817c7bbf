#![deny(missing_docs)]

//! # zvonek-core — Foundational Types for the Zvonek Door Hub
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It has no internal crate dependencies.
//!
//! ## Design Principles
//!
//! 1. **One authoritative lock record.** [`StateStore`] owns the only mutable
//!    [`LockState`] and connection flag in the process. Everything else sees
//!    immutable [`Snapshot`] values.
//!
//! 2. **Derived fields are derived together.** `door_open` is never stored;
//!    it is computed from `locked` inside [`Snapshot`] construction, so no
//!    observer can see the two disagree.
//!
//! 3. **Stateless capability checks.** [`CapabilityGate`] verifies an HS256
//!    bearer token per request. No sessions, no revocation list.
//!
//! 4. **[`ZvonekError`] hierarchy.** Structured errors with `thiserror`, no
//!    `Box<dyn Error>`, no `.unwrap()` outside tests.

pub mod capability;
pub mod error;
pub mod event;
pub mod lock;
pub mod store;

// Re-export primary types at crate root for ergonomic imports.
pub use capability::{CapabilityGate, Claims, SigningSecret, DEV_SECRET};
pub use error::{ConfigError, Unauthorized, ZvonekError};
pub use event::{DoorEvent, HubMessage};
pub use lock::{LockState, MutationOrigin, Snapshot};
pub use store::StateStore;
