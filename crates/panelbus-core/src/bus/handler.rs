//! Handlers and acknowledgments.
//!
//! A [`Handler`] is callable by construction; the only place a non-callable
//! value can show up is the dynamic boundary modelled by [`HandlerArg::Dynamic`]
//! (a JSON value arriving where a handler was expected), which validation
//! rejects before registration.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use panelbus_types::message::{AckOutcome, Acknowledgment, Frame};
use panelbus_types::name::QualifiedMessageId;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::transport::{Route, Transport};

type HandlerFn = dyn Fn(Value, Option<Acknowledger>) -> anyhow::Result<()> + Send + Sync;

/// A registered message handler.
///
/// Cloning is cheap and shares the same callable; registering one clone twice
/// still yields two independent registrations.
#[derive(Clone)]
pub struct Handler {
    func: Arc<HandlerFn>,
}

impl Handler {
    /// A handler that only looks at the payload.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(move |payload, _ack| func(payload)),
        }
    }

    /// A handler that also receives the acknowledgment callback.
    ///
    /// The acknowledger is `Some` only when the sender asked for an ack.
    pub fn with_ack<F>(func: F) -> Self
    where
        F: Fn(Value, Option<Acknowledger>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
        }
    }

    pub(crate) fn call(&self, payload: Value, ack: Option<Acknowledger>) -> anyhow::Result<()> {
        (self.func)(payload, ack)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").finish_non_exhaustive()
    }
}

/// The `handler` argument of `listen_for`, as supplied by the caller.
#[derive(Debug, Clone)]
pub enum HandlerArg {
    Callable(Handler),
    /// A value that crossed a dynamic boundary; never callable.
    Dynamic(Value),
}

impl From<Handler> for HandlerArg {
    fn from(handler: Handler) -> Self {
        HandlerArg::Callable(handler)
    }
}

impl From<Value> for HandlerArg {
    fn from(value: Value) -> Self {
        HandlerArg::Dynamic(value)
    }
}

impl From<&str> for HandlerArg {
    fn from(value: &str) -> Self {
        HandlerArg::Dynamic(Value::String(value.to_string()))
    }
}

impl From<String> for HandlerArg {
    fn from(value: String) -> Self {
        HandlerArg::Dynamic(Value::String(value))
    }
}

/// Reply callback bound to one correlated envelope.
///
/// Every handler matching the envelope gets a clone; the first call sends the
/// acknowledgment and later calls are refused with a warning, so the sender's
/// continuation resolves exactly once.
#[derive(Clone)]
pub struct Acknowledger {
    inner: Arc<AckInner>,
}

struct AckInner {
    correlation_id: Uuid,
    message: QualifiedMessageId,
    route: Route,
    transport: Arc<dyn Transport>,
    handled: AtomicBool,
}

impl Acknowledger {
    pub(crate) fn new(
        correlation_id: Uuid,
        message: QualifiedMessageId,
        route: Route,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            inner: Arc::new(AckInner {
                correlation_id,
                message,
                route,
                transport,
                handled: AtomicBool::new(false),
            }),
        }
    }

    pub fn correlation_id(&self) -> Uuid {
        self.inner.correlation_id
    }

    /// Whether an acknowledgment has already been sent for this envelope.
    pub fn is_handled(&self) -> bool {
        self.inner.handled.load(Ordering::SeqCst)
    }

    /// Acknowledge successfully with `result`.
    pub fn ok(&self, result: Value) -> bool {
        self.respond(Ok(result))
    }

    /// Acknowledge with an error, surfaced to the sender as `BusError::Remote`.
    pub fn err(&self, error: impl fmt::Display) -> bool {
        self.respond(Err(error.to_string()))
    }

    /// Send the acknowledgment. Returns `false` if one was already sent or the
    /// transport refused the reply.
    pub fn respond(&self, outcome: Result<Value, String>) -> bool {
        let inner = &self.inner;
        if inner.handled.swap(true, Ordering::SeqCst) {
            warn!(
                message = %inner.message,
                correlation_id = %inner.correlation_id,
                "acknowledgment already handled"
            );
            return false;
        }

        let frame = Frame::Ack(Acknowledgment {
            correlation_id: inner.correlation_id,
            outcome: AckOutcome::from(outcome),
        });
        match inner.transport.send(inner.route, frame) {
            Ok(()) => {
                debug!(message = %inner.message, correlation_id = %inner.correlation_id, "acknowledgment sent");
                true
            }
            Err(err) => {
                warn!(
                    message = %inner.message,
                    correlation_id = %inner.correlation_id,
                    error = %err,
                    "failed to send acknowledgment"
                );
                false
            }
        }
    }
}

impl fmt::Debug for Acknowledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Acknowledger")
            .field("correlation_id", &self.inner.correlation_id)
            .field("message", &self.inner.message)
            .field("handled", &self.is_handled())
            .finish()
    }
}
