//! Shared domain types for panelbus.
//!
//! This crate contains the types exchanged between the bus core, its
//! transports and the server binary: bundle and message names, qualified
//! message ids, wire frames, bundle descriptors, configuration, and the
//! argument error raised by the public API.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, semver, thiserror.

pub mod bundle;
pub mod config;
pub mod error;
pub mod message;
pub mod name;
