//! # Route Modules
//!
//! Each module defines an Axum Router for one API surface area.
//! Routers are assembled in [`crate::app`].

pub mod accessory;
pub mod camera;
pub mod door;
pub mod homekit;
pub mod metrics;
pub mod status_ws;
