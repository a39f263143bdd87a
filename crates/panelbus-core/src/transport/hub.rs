//! Server-side transport: one hub, many attached client peers.
//!
//! Each attached peer gets a bounded `mpsc` outbox of frames; whatever serves
//! that peer (a WebSocket writer, an in-process link) drains it. Frames coming
//! from peers are pushed into the server context's inbound queue in arrival
//! order.

use std::sync::Arc;

use dashmap::DashMap;
use panelbus_types::message::{Frame, PeerId};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{ConnectionState, Inbound, Route, Transport, TransportError};

/// Buffer size for each peer's outbox.
const PEER_BUFFER: usize = 256;

/// Server-side transport adapter.
pub struct ServerHub {
    /// Attached peers (peer_id -> outbox sender).
    peers: DashMap<PeerId, mpsc::Sender<Frame>>,
    /// Inbound queue of the server context.
    inbound: mpsc::UnboundedSender<Inbound>,
}

impl ServerHub {
    /// Create a hub and the inbound receiver the server context consumes.
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Inbound>) {
        let (inbound, rx) = mpsc::unbounded_channel();
        let hub = Arc::new(Self {
            peers: DashMap::new(),
            inbound,
        });
        (hub, rx)
    }

    /// Attach a peer and return its outbox.
    ///
    /// Re-attaching an id replaces the previous outbox (a reconnect).
    pub fn attach(&self, peer: PeerId) -> mpsc::Receiver<Frame> {
        let (tx, rx) = mpsc::channel(PEER_BUFFER);
        self.peers.insert(peer, tx);
        debug!(%peer, peers = self.peers.len(), "peer attached to hub");
        let _ = self.inbound.send(Inbound::Connected { peer });
        rx
    }

    /// Detach a peer, dropping its outbox sender.
    ///
    /// Returns `true` if the peer was attached.
    pub fn detach(&self, peer: &PeerId) -> bool {
        let removed = self.peers.remove(peer).is_some();
        if removed {
            debug!(%peer, peers = self.peers.len(), "peer detached from hub");
            let _ = self.inbound.send(Inbound::Disconnected { peer: *peer });
        }
        removed
    }

    /// Hand a frame received from `from` to the server context.
    pub fn receive(&self, from: PeerId, frame: Frame) -> Result<(), TransportError> {
        self.inbound
            .send(Inbound::Frame { from, frame })
            .map_err(|_| TransportError::Closed)
    }

    pub fn is_attached(&self, peer: &PeerId) -> bool {
        self.peers.contains_key(peer)
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    fn send_to(&self, peer: PeerId, tx: &mpsc::Sender<Frame>, frame: Frame) -> Result<(), TransportError> {
        tx.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::ChannelFull(peer),
            mpsc::error::TrySendError::Closed(_) => TransportError::NoRoute(peer),
        })
    }
}

impl Transport for ServerHub {
    fn send(&self, route: Route, frame: Frame) -> Result<(), TransportError> {
        match route {
            Route::Peer(peer) => {
                let tx = self.peers.get(&peer).ok_or(TransportError::NoRoute(peer))?;
                self.send_to(peer, tx.value(), frame)
            }
            Route::Broadcast => {
                // A slow or closing peer must not block the others.
                let mut reached = 0;
                let mut last_err = TransportError::Disconnected;
                for entry in self.peers.iter() {
                    match self.send_to(*entry.key(), entry.value(), frame.clone()) {
                        Ok(()) => reached += 1,
                        Err(err) => {
                            warn!(peer = %entry.key(), error = %err, "broadcast skipped peer");
                            last_err = err;
                        }
                    }
                }
                if reached == 0 {
                    return Err(last_err);
                }
                Ok(())
            }
        }
    }

    fn state(&self) -> ConnectionState {
        if self.peers.is_empty() {
            ConnectionState::Disconnected
        } else {
            ConnectionState::Connected
        }
    }
}

impl std::fmt::Debug for ServerHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerHub")
            .field("peers", &self.peers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panelbus_types::message::Envelope;
    use panelbus_types::name::{BundleName, MessageName, QualifiedMessageId};
    use serde_json::Value;

    fn frame(message: &str) -> Frame {
        Frame::Message(Envelope::new(
            QualifiedMessageId::new(
                BundleName::new("test").unwrap(),
                MessageName::new(message).unwrap(),
            ),
            Value::Null,
        ))
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_peer() {
        let (hub, _inbound) = ServerHub::new();
        let a = PeerId::new();
        let b = PeerId::new();
        let mut rx_a = hub.attach(a);
        let mut rx_b = hub.attach(b);

        hub.send(Route::Broadcast, frame("hello")).unwrap();

        assert_eq!(rx_a.recv().await.unwrap(), frame("hello"));
        assert_eq!(rx_b.recv().await.unwrap(), frame("hello"));
    }

    #[tokio::test]
    async fn test_peer_route_reaches_only_that_peer() {
        let (hub, _inbound) = ServerHub::new();
        let a = PeerId::new();
        let b = PeerId::new();
        let mut rx_a = hub.attach(a);
        let mut rx_b = hub.attach(b);

        hub.send(Route::Peer(a), frame("direct")).unwrap();

        assert_eq!(rx_a.recv().await.unwrap(), frame("direct"));
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unknown_peer_is_no_route() {
        let (hub, _inbound) = ServerHub::new();
        let ghost = PeerId::new();
        let result = hub.send(Route::Peer(ghost), frame("x"));
        assert_eq!(result, Err(TransportError::NoRoute(ghost)));
    }

    #[tokio::test]
    async fn test_broadcast_with_no_peers_is_disconnected() {
        let (hub, _inbound) = ServerHub::new();
        assert_eq!(hub.state(), ConnectionState::Disconnected);
        assert_eq!(
            hub.send(Route::Broadcast, frame("nobody")),
            Err(TransportError::Disconnected)
        );
    }

    #[test]
    fn test_broadcast_reaching_no_peer_reports_failure() {
        let (hub, _inbound) = ServerHub::new();
        let peer = PeerId::new();
        let _rx = hub.attach(peer);

        for _ in 0..PEER_BUFFER {
            hub.send(Route::Broadcast, frame("fill")).unwrap();
        }
        assert_eq!(
            hub.send(Route::Broadcast, frame("overflow")),
            Err(TransportError::ChannelFull(peer))
        );
    }

    #[tokio::test]
    async fn test_broadcast_succeeds_if_any_peer_is_reached() {
        let (hub, _inbound) = ServerHub::new();
        let gone = PeerId::new();
        let live = PeerId::new();
        drop(hub.attach(gone));
        let mut rx = hub.attach(live);

        hub.send(Route::Broadcast, frame("partial")).unwrap();
        assert_eq!(rx.recv().await.unwrap(), frame("partial"));
    }

    #[tokio::test]
    async fn test_attach_detach_emit_connection_events() {
        let (hub, mut inbound) = ServerHub::new();
        let peer = PeerId::new();

        let _rx = hub.attach(peer);
        assert_eq!(hub.state(), ConnectionState::Connected);
        assert!(hub.detach(&peer));
        assert!(!hub.detach(&peer));

        assert_eq!(inbound.recv().await.unwrap(), Inbound::Connected { peer });
        assert_eq!(inbound.recv().await.unwrap(), Inbound::Disconnected { peer });
        assert!(!hub.is_attached(&peer));
    }

    #[tokio::test]
    async fn test_received_frames_keep_arrival_order() {
        let (hub, mut inbound) = ServerHub::new();
        let peer = PeerId::new();

        for name in ["one", "two", "three"] {
            hub.receive(peer, frame(name)).unwrap();
        }

        for name in ["one", "two", "three"] {
            assert_eq!(
                inbound.recv().await.unwrap(),
                Inbound::Frame { from: peer, frame: frame(name) }
            );
        }
    }

    #[test]
    fn test_full_outbox_reports_channel_full() {
        let (hub, _inbound) = ServerHub::new();
        let peer = PeerId::new();
        let _rx = hub.attach(peer);

        for _ in 0..PEER_BUFFER {
            hub.send(Route::Peer(peer), frame("fill")).unwrap();
        }
        let result = hub.send(Route::Peer(peer), frame("overflow"));
        assert_eq!(result, Err(TransportError::ChannelFull(peer)));
    }
}
