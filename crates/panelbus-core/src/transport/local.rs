//! In-process client transport attached to a [`ServerHub`].
//!
//! A `LocalLink` plays the role of a dashboard panel's socket: it connects to
//! and disconnects from the hub, publishes its connection state on a `watch`
//! channel, and applies the configured [`DisconnectedPolicy`] to frames sent
//! while it is down. Queued frames are flushed in order on reconnect.
//!
//! `connect` spawns a forwarding task and must be called inside a tokio runtime.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use panelbus_types::config::{BusConfig, DisconnectedPolicy};
use panelbus_types::message::{Frame, PeerId};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{ConnectionState, Inbound, Route, ServerHub, Transport, TransportError};

/// Client-side in-process transport.
pub struct LocalLink {
    hub: Arc<ServerHub>,
    /// This link's identity at the hub. Stable across reconnects.
    peer: PeerId,
    /// Identity the client context sees the server under.
    server: PeerId,
    policy: DisconnectedPolicy,
    queue_capacity: usize,
    inner: Mutex<LinkInner>,
    state_tx: watch::Sender<ConnectionState>,
    inbound: mpsc::UnboundedSender<Inbound>,
}

struct LinkInner {
    state: ConnectionState,
    queue: VecDeque<Frame>,
    forwarder: Option<JoinHandle<()>>,
}

impl LocalLink {
    /// Create a disconnected link and the inbound receiver for the client context.
    pub fn new(hub: Arc<ServerHub>, config: &BusConfig) -> (Arc<Self>, mpsc::UnboundedReceiver<Inbound>) {
        let (inbound, rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let link = Arc::new(Self {
            hub,
            peer: PeerId::new(),
            server: PeerId::new(),
            policy: config.disconnected_policy,
            queue_capacity: config.queue_capacity.max(1),
            inner: Mutex::new(LinkInner {
                state: ConnectionState::Disconnected,
                queue: VecDeque::new(),
                forwarder: None,
            }),
            state_tx,
            inbound,
        });
        (link, rx)
    }

    pub fn peer_id(&self) -> PeerId {
        self.peer
    }

    /// Identity under which frames from the server arrive.
    pub fn server_id(&self) -> PeerId {
        self.server
    }

    /// Subscribe to connection state changes.
    pub fn state_events(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Number of frames waiting for a reconnect.
    pub fn queued(&self) -> usize {
        self.inner.lock().expect("local link lock poisoned").queue.len()
    }

    /// Attach to the hub and flush any queued frames. No-op unless disconnected.
    pub fn connect(&self) {
        let mut inner = self.inner.lock().expect("local link lock poisoned");
        if inner.state != ConnectionState::Disconnected {
            return;
        }
        self.set_state(&mut inner, ConnectionState::Connecting);

        let mut outbox = self.hub.attach(self.peer);
        let inbound = self.inbound.clone();
        let from = self.server;
        inner.forwarder = Some(tokio::spawn(async move {
            while let Some(frame) = outbox.recv().await {
                if inbound.send(Inbound::Frame { from, frame }).is_err() {
                    break;
                }
            }
        }));

        let queued = inner.queue.len();
        while let Some(frame) = inner.queue.pop_front() {
            if let Err(err) = self.hub.receive(self.peer, frame) {
                warn!(peer = %self.peer, error = %err, "failed to flush queued frame");
            }
        }
        if queued > 0 {
            debug!(peer = %self.peer, queued, "flushed queued frames on connect");
        }

        self.set_state(&mut inner, ConnectionState::Connected);
        let _ = self.inbound.send(Inbound::Connected { peer: self.server });
    }

    /// Detach from the hub. Frames still in flight toward this client are lost.
    pub fn disconnect(&self) {
        let mut inner = self.inner.lock().expect("local link lock poisoned");
        if inner.state == ConnectionState::Disconnected {
            return;
        }
        if let Some(forwarder) = inner.forwarder.take() {
            forwarder.abort();
        }
        self.hub.detach(&self.peer);
        self.set_state(&mut inner, ConnectionState::Disconnected);
        let _ = self.inbound.send(Inbound::Disconnected { peer: self.server });
    }

    fn set_state(&self, inner: &mut LinkInner, state: ConnectionState) {
        debug!(peer = %self.peer, from = %inner.state, to = %state, "link state change");
        inner.state = state;
        self.state_tx.send_replace(state);
    }
}

impl Transport for LocalLink {
    /// The route is ignored: a client's only counterpart is the server.
    fn send(&self, _route: Route, frame: Frame) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().expect("local link lock poisoned");
        if inner.state == ConnectionState::Connected {
            return self.hub.receive(self.peer, frame);
        }

        match self.policy {
            DisconnectedPolicy::Queue => {
                if inner.queue.len() >= self.queue_capacity {
                    inner.queue.pop_front();
                    warn!(peer = %self.peer, capacity = self.queue_capacity, "send queue full, dropped oldest frame");
                }
                inner.queue.push_back(frame);
                debug!(peer = %self.peer, queued = inner.queue.len(), "queued frame while disconnected");
                Ok(())
            }
            DisconnectedPolicy::Drop => {
                debug!(peer = %self.peer, "dropped frame while disconnected");
                Err(TransportError::Disconnected)
            }
        }
    }

    fn state(&self) -> ConnectionState {
        self.inner.lock().expect("local link lock poisoned").state
    }
}

impl Drop for LocalLink {
    fn drop(&mut self) {
        if let Ok(inner) = self.inner.get_mut() {
            if let Some(forwarder) = inner.forwarder.take() {
                forwarder.abort();
            }
        }
        self.hub.detach(&self.peer);
    }
}

impl std::fmt::Debug for LocalLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalLink")
            .field("peer", &self.peer)
            .field("state", &*self.state_tx.borrow())
            .field("policy", &self.policy)
            .finish()
    }
}
