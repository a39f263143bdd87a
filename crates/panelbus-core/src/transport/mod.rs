//! Transport adapters between bus contexts.
//!
//! A transport moves [`Frame`]s to the opposite side and feeds inbound frames
//! and connection events into the owning context as [`Inbound`] items. Within
//! one connected session it preserves per-sender order and never duplicates.
//!
//! - `hub` -- `ServerHub`, the server-side adapter fanning out to attached peers
//! - `local` -- `LocalLink`, an in-process client adapter with a connection
//!   state machine and a configurable disconnected-send policy

pub mod hub;
pub mod local;

use std::fmt;

use panelbus_types::message::{Frame, PeerId};
use thiserror::Error;

pub use hub::ServerHub;
pub use local::LocalLink;

/// Where an outbound frame goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Every context on the opposite side (all clients, or the server).
    Broadcast,
    /// One specific peer.
    Peer(PeerId),
}

/// Connection lifecycle: `Disconnected -> Connecting -> Connected -> Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        f.write_str(s)
    }
}

/// Item delivered by a transport to the owning context's event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Frame { from: PeerId, frame: Frame },
    Connected { peer: PeerId },
    Disconnected { peer: PeerId },
}

/// Failures reported by a transport when handing off a frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The link is down and its policy drops frames.
    #[error("transport is disconnected")]
    Disconnected,

    /// The addressed peer is not attached.
    #[error("no route to peer {0}")]
    NoRoute(PeerId),

    /// The peer's outbound buffer is full.
    #[error("outbound buffer full for peer {0}")]
    ChannelFull(PeerId),

    /// The receiving side has shut down.
    #[error("transport closed")]
    Closed,
}

/// A duplex channel from one context to the opposite side.
///
/// `send` hands a frame off without waiting for the remote side. Inbound
/// traffic arrives separately, on the receiver handed out when the adapter
/// is built.
pub trait Transport: Send + Sync {
    fn send(&self, route: Route, frame: Frame) -> Result<(), TransportError>;

    fn state(&self) -> ConnectionState;
}
