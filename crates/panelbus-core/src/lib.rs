//! Core of the panelbus message bus.
//!
//! A server and many client contexts exchange named messages through a
//! [`bus::MessageBus`] per context. Each context owns its registration table,
//! delivers inbound envelopes to every matching handler on its own event loop,
//! and talks to the opposite side through a [`transport::Transport`].
//!
//! This crate depends only on `panelbus-types` -- never on `panelbus-infra`
//! or any network/IO crate.

pub mod bundle;
pub mod bus;
pub mod transport;
