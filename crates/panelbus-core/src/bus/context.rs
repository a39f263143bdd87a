//! One execution context of the bus (the server, or one client panel).
//!
//! A `MessageBus` owns its registration table and pending acknowledgments and
//! talks to the opposite side through a single transport. Inbound traffic is
//! processed by [`MessageBus::run`], one item at a time, so handlers of one
//! context never run concurrently with each other.

use std::sync::Arc;

use panelbus_types::config::BusConfig;
use panelbus_types::error::ArgumentError;
use panelbus_types::message::{Envelope, Frame};
use panelbus_types::name::QualifiedMessageId;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::delivery::{DeliveryEngine, DeliveryReport};
use super::error::{BusError, DeliveryFailure};
use super::facade::BundleBus;
use super::handler::Handler;
use super::pending::{PendingAck, PendingAcks};
use super::registry::RegistrationTable;
use super::validate;
use crate::bundle::{BundleMetadata, BundleRegistry};
use crate::transport::{ConnectionState, Inbound, Route, Transport, TransportError};

pub struct MessageBus {
    table: Arc<RegistrationTable>,
    pending: Arc<PendingAcks>,
    transport: Arc<dyn Transport>,
    delivery: DeliveryEngine,
    metadata: Arc<dyn BundleMetadata>,
    config: BusConfig,
}

impl MessageBus {
    /// Create a context with no bundle metadata.
    pub fn new(transport: Arc<dyn Transport>, config: BusConfig) -> Arc<Self> {
        Self::with_metadata(transport, config, Arc::new(BundleRegistry::default()))
    }

    pub fn with_metadata(
        transport: Arc<dyn Transport>,
        config: BusConfig,
        metadata: Arc<dyn BundleMetadata>,
    ) -> Arc<Self> {
        let table = Arc::new(RegistrationTable::new());
        let delivery = DeliveryEngine::new(Arc::clone(&table), Arc::clone(&transport));
        Arc::new(Self {
            table,
            pending: Arc::new(PendingAcks::new()),
            transport,
            delivery,
            metadata,
            config,
        })
    }

    /// The facade for code belonging to `bundle`.
    ///
    /// Names passed to its `listen_for`/`send_message` default to this bundle.
    pub fn bundle(self: &Arc<Self>, bundle: &str) -> Result<BundleBus, ArgumentError> {
        let name = validate::bundle_name(bundle)?;
        Ok(BundleBus::new(Arc::clone(self), name))
    }

    pub fn table(&self) -> &RegistrationTable {
        &self.table
    }

    pub fn metadata(&self) -> &dyn BundleMetadata {
        self.metadata.as_ref()
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    pub fn transport_state(&self) -> ConnectionState {
        self.transport.state()
    }

    /// Number of correlated sends still waiting for an acknowledgment.
    pub fn pending_acks(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn register(&self, id: QualifiedMessageId, handler: Handler) {
        let count = self.table.register(id.clone(), handler);
        debug!(message = %id, handlers = count, "registered handler");
    }

    pub(crate) fn dispatch(&self, envelope: Envelope) -> Result<(), TransportError> {
        self.transport.send(Route::Broadcast, Frame::Message(envelope))
    }

    /// Send a correlated envelope and return its continuation.
    ///
    /// The reply channel is installed before the envelope leaves, so an ack
    /// that arrives immediately is never missed.
    pub(crate) fn dispatch_with_ack(
        &self,
        id: QualifiedMessageId,
        payload: Value,
    ) -> Result<PendingAck, BusError> {
        let envelope = Envelope::expecting_ack(id, payload);
        let correlation_id = envelope.correlation_id().unwrap_or_default();

        let reply = self.pending.insert(correlation_id);
        if let Err(err) = self.dispatch(envelope) {
            self.pending.remove(&correlation_id);
            return Err(BusError::Delivery(err.into()));
        }

        Ok(PendingAck::new(
            correlation_id,
            reply,
            self.config.ack_timeout(),
            Arc::clone(&self.pending),
        ))
    }

    /// Process one inbound item. Returns the delivery report for message frames.
    pub fn handle_inbound(&self, inbound: Inbound) -> Option<DeliveryReport> {
        match inbound {
            Inbound::Frame { from, frame: Frame::Message(envelope) } => {
                Some(self.delivery.deliver(envelope, from))
            }
            Inbound::Frame { frame: Frame::Ack(ack), .. } => {
                self.pending.resolve(ack);
                None
            }
            Inbound::Connected { peer } => {
                info!(%peer, "remote connected");
                None
            }
            Inbound::Disconnected { peer } => {
                info!(%peer, "remote disconnected");
                // Only give up on pending acks once no remote is left to answer them.
                if self.transport.state() == ConnectionState::Disconnected {
                    let failed = self.pending.fail_all(DeliveryFailure::Disconnected);
                    if failed > 0 {
                        debug!(failed, "failed pending acknowledgments after disconnect");
                    }
                }
                None
            }
        }
    }

    /// Drive this context's event loop until the transport closes its inbound queue.
    pub async fn run(self: Arc<Self>, mut inbound: mpsc::UnboundedReceiver<Inbound>) {
        while let Some(item) = inbound.recv().await {
            self.handle_inbound(item);
        }
        let failed = self.pending.fail_all(DeliveryFailure::Closed);
        debug!(failed, "message bus event loop stopped");
    }

    /// Spawn [`MessageBus::run`] on the current tokio runtime.
    pub fn spawn(self: &Arc<Self>, inbound: mpsc::UnboundedReceiver<Inbound>) -> JoinHandle<()> {
        tokio::spawn(Arc::clone(self).run(inbound))
    }
}

impl std::fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBus")
            .field("registered_ids", &self.table.len())
            .field("pending_acks", &self.pending.len())
            .field("transport_state", &self.transport.state())
            .finish()
    }
}
