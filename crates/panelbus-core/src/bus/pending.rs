//! Pending acknowledgments for correlated sends.
//!
//! Each correlated send installs a `oneshot` reply channel keyed by its
//! correlation id before the envelope leaves. The channel resolves when the
//! matching acknowledgment arrives, or fails when the transport reports that
//! the remote side went away.

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use panelbus_types::message::Acknowledgment;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::{BusError, DeliveryFailure};

type AckResult = Result<Value, BusError>;

/// Reply channels for in-flight correlated sends (correlation_id -> sender).
#[derive(Default)]
pub struct PendingAcks {
    entries: DashMap<Uuid, oneshot::Sender<AckResult>>,
}

impl PendingAcks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a reply channel for `correlation_id`.
    pub fn insert(&self, correlation_id: Uuid) -> oneshot::Receiver<AckResult> {
        let (reply, rx) = oneshot::channel();
        self.entries.insert(correlation_id, reply);
        rx
    }

    pub fn remove(&self, correlation_id: &Uuid) -> bool {
        self.entries.remove(correlation_id).is_some()
    }

    /// Resolve the pending send matching `ack`.
    ///
    /// Unknown ids (already resolved, timed out, or never ours) are dropped.
    pub fn resolve(&self, ack: Acknowledgment) -> bool {
        let correlation_id = ack.correlation_id;
        let Some((_, reply)) = self.entries.remove(&correlation_id) else {
            debug!(%correlation_id, "no pending acknowledgment (caller may have timed out)");
            return false;
        };

        let result = ack.outcome.into_result().map_err(BusError::Remote);
        if reply.send(result).is_err() {
            warn!(%correlation_id, "acknowledgment receiver already dropped");
            return false;
        }
        true
    }

    /// Fail every pending send with `failure`. Returns how many failed.
    pub fn fail_all(&self, failure: DeliveryFailure) -> usize {
        let ids: Vec<Uuid> = self.entries.iter().map(|entry| *entry.key()).collect();

        let mut failed = 0;
        for id in ids {
            if let Some((_, reply)) = self.entries.remove(&id) {
                let _ = reply.send(Err(BusError::Delivery(failure.clone())));
                failed += 1;
            }
        }
        failed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Continuation of a correlated send.
///
/// Resolves once, with the acknowledgment's result. Await it directly or via
/// [`PendingAck::wait`]. Dropping it unresolved releases its reply channel.
pub struct PendingAck {
    correlation_id: Uuid,
    reply: oneshot::Receiver<AckResult>,
    timeout: Option<Duration>,
    pending: Arc<PendingAcks>,
}

impl PendingAck {
    pub(crate) fn new(
        correlation_id: Uuid,
        reply: oneshot::Receiver<AckResult>,
        timeout: Option<Duration>,
        pending: Arc<PendingAcks>,
    ) -> Self {
        Self {
            correlation_id,
            reply,
            timeout,
            pending,
        }
    }

    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    /// Wait for the acknowledgment.
    ///
    /// Without a configured timeout this waits until the ack arrives or the
    /// transport reports a failure.
    pub async fn wait(mut self) -> Result<Value, BusError> {
        let Some(timeout) = self.timeout else {
            return (&mut self.reply).await.unwrap_or(Err(BusError::Closed));
        };

        match tokio::time::timeout(timeout, &mut self.reply).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(BusError::Closed),
            Err(_) => Err(BusError::Timeout(timeout)),
        }
    }
}

impl Drop for PendingAck {
    fn drop(&mut self) {
        if self.pending.remove(&self.correlation_id) {
            debug!(correlation_id = %self.correlation_id, "abandoned pending acknowledgment");
        }
    }
}

impl IntoFuture for PendingAck {
    type Output = Result<Value, BusError>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}

impl std::fmt::Debug for PendingAck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingAck")
            .field("correlation_id", &self.correlation_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}
