//! # zvonek-hub — Real-Time State-and-Event Hub
//!
//! Fans the authoritative lock state and discrete door events out to an
//! open-ended set of observers, serializes lock actuation, and shares one
//! camera acquisition among any number of stream consumers.
//!
//! ## Components
//!
//! | Type                      | Role                                                        |
//! |---------------------------|-------------------------------------------------------------|
//! | [`EventBroadcaster`]      | Subscriber set; per-subscriber bounded queue; periodic status |
//! | [`ActuationCoordinator`]  | Capability check → commit → publish, one request at a time  |
//! | [`FrameMultiplexer`]      | One camera session shared by every stream consumer          |
//! | [`AccessoryAdapter`]      | Pairing-subsystem get/set hooks forwarded into the coordinator |
//! | [`PairingRegistry`]       | Pairing pincode/setup id published by the collaborator       |
//!
//! ## Control Flow
//!
//! ```text
//! HTTP actuation ─→ CapabilityGate ─→ ActuationCoordinator ─→ StateStore
//!                                              │
//!                                              └─→ EventBroadcaster ─→ Subscription (per observer)
//!
//! FrameSource ─→ FrameMultiplexer ─→ frame stream (per consumer)
//! ```

pub mod accessory;
pub mod broadcaster;
pub mod camera;
pub mod coordinator;
pub mod frames;
pub mod pairing;

pub use accessory::{AccessoryAdapter, LockAccessory};
pub use broadcaster::{
    BroadcasterConfig, EventBroadcaster, PublishReport, SubscriberId, Subscription,
};
pub use camera::{
    CameraError, EncodedFrame, FrameSource, StillImageSource, MULTIPART_BOUNDARY,
    MULTIPART_CONTENT_TYPE,
};
pub use coordinator::ActuationCoordinator;
pub use frames::{FrameMultiplexer, MultiplexerConfig};
pub use pairing::{PairingInfo, PairingRegistry};
