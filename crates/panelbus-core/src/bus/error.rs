use std::time::Duration;

use panelbus_types::error::ArgumentError;
use panelbus_types::message::PeerId;
use thiserror::Error;

use crate::transport::TransportError;

/// Transport-level reason an envelope or its acknowledgment never arrived.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryFailure {
    /// The remote side disconnected, or the link was down and dropped the frame.
    #[error("remote side disconnected")]
    Disconnected,

    /// The addressed peer is not attached.
    #[error("no route to peer {0}")]
    NoRoute(PeerId),

    /// The peer's outbound buffer was full.
    #[error("outbound buffer full for peer {0}")]
    Backpressure(PeerId),

    /// The transport has shut down.
    #[error("transport closed")]
    Closed,
}

impl From<TransportError> for DeliveryFailure {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Disconnected => DeliveryFailure::Disconnected,
            TransportError::NoRoute(peer) => DeliveryFailure::NoRoute(peer),
            TransportError::ChannelFull(peer) => DeliveryFailure::Backpressure(peer),
            TransportError::Closed => DeliveryFailure::Closed,
        }
    }
}

/// Errors surfaced by the bus facade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// Malformed call, rejected before anything was registered or sent.
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// The transport reported that delivery failed.
    #[error("delivery failed: {0}")]
    Delivery(#[from] DeliveryFailure),

    /// The remote handler acknowledged with an error.
    #[error("remote handler failed: {0}")]
    Remote(String),

    /// No acknowledgment within the configured timeout.
    #[error("acknowledgment timed out after {0:?}")]
    Timeout(Duration),

    /// The owning context shut down while the acknowledgment was pending.
    #[error("message bus closed")]
    Closed,
}
