//! Fan-out of inbound envelopes to locally registered handlers.
//!
//! Every handler matching the envelope's qualified id is invoked exactly once.
//! A handler that returns an error or panics is reported and skipped; its
//! siblings still run.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use panelbus_types::message::{Envelope, PeerId};
use tracing::{debug, error, warn};

use super::handler::Acknowledger;
use super::registry::RegistrationTable;
use crate::transport::{Route, Transport};

/// Outcome of delivering one envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Handlers registered for the envelope's id.
    pub matched: usize,
    /// Handlers that returned `Ok`.
    pub succeeded: usize,
    /// Handlers that returned an error or panicked.
    pub failed: usize,
}

pub struct DeliveryEngine {
    table: Arc<RegistrationTable>,
    transport: Arc<dyn Transport>,
}

impl DeliveryEngine {
    pub fn new(table: Arc<RegistrationTable>, transport: Arc<dyn Transport>) -> Self {
        Self { table, transport }
    }

    /// Invoke every handler registered for `envelope`'s id.
    ///
    /// `origin` is where acknowledgments are routed.
    pub fn deliver(&self, envelope: Envelope, origin: PeerId) -> DeliveryReport {
        let id = envelope.id().clone();
        let handlers = self.table.handlers(&id);
        let mut report = DeliveryReport {
            matched: handlers.len(),
            ..DeliveryReport::default()
        };

        if handlers.is_empty() {
            debug!(message = %id, from = %origin, "no handlers registered, envelope dropped");
            return report;
        }

        let ack = envelope.correlation_id().map(|correlation_id| {
            Acknowledger::new(
                correlation_id,
                id.clone(),
                Route::Peer(origin),
                Arc::clone(&self.transport),
            )
        });
        let payload = envelope.into_payload();

        for (index, handler) in handlers.iter().enumerate() {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                handler.call(payload.clone(), ack.clone())
            }));
            match outcome {
                Ok(Ok(())) => report.succeeded += 1,
                Ok(Err(err)) => {
                    report.failed += 1;
                    warn!(message = %id, handler = index, error = %err, "handler failed");
                }
                Err(panic) => {
                    report.failed += 1;
                    error!(
                        message = %id,
                        handler = index,
                        panic = %panic_message(panic.as_ref()),
                        "handler panicked"
                    );
                }
            }
        }

        debug!(
            message = %id,
            matched = report.matched,
            failed = report.failed,
            "envelope delivered"
        );
        report
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use panelbus_types::message::{AckOutcome, Acknowledgment, Frame};
    use panelbus_types::name::{BundleName, MessageName, QualifiedMessageId};
    use serde_json::{Value, json};

    use crate::bus::handler::Handler;
    use crate::transport::{ConnectionState, TransportError};

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(Route, Frame)>>,
    }

    impl Transport for RecordingTransport {
        fn send(&self, route: Route, frame: Frame) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push((route, frame));
            Ok(())
        }

        fn state(&self) -> ConnectionState {
            ConnectionState::Connected
        }
    }

    fn qid(message: &str) -> QualifiedMessageId {
        QualifiedMessageId::new(
            BundleName::new("test").unwrap(),
            MessageName::new(message).unwrap(),
        )
    }

    fn counting_handler(counter: &Arc<AtomicUsize>) -> Handler {
        let counter = Arc::clone(counter);
        Handler::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn engine() -> (DeliveryEngine, Arc<RegistrationTable>, Arc<RecordingTransport>) {
        let table = Arc::new(RegistrationTable::new());
        let transport = Arc::new(RecordingTransport::default());
        let engine = DeliveryEngine::new(Arc::clone(&table), transport.clone());
        (engine, table, transport)
    }

    #[test]
    fn test_every_handler_runs_exactly_once() {
        let (engine, table, _) = engine();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        table.register(qid("multi"), counting_handler(&first));
        table.register(qid("multi"), counting_handler(&second));

        let report = engine.deliver(Envelope::new(qid("multi"), Value::Null), PeerId::new());

        assert_eq!(report, DeliveryReport { matched: 2, succeeded: 2, failed: 0 });
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_same_handler_registered_twice_runs_twice() {
        let (engine, table, _) = engine();
        let counter = Arc::new(AtomicUsize::new(0));
        let handler = counting_handler(&counter);
        table.register(qid("twice"), handler.clone());
        table.register(qid("twice"), handler);

        engine.deliver(Envelope::new(qid("twice"), Value::Null), PeerId::new());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failing_and_panicking_handlers_are_isolated() {
        let (engine, table, _) = engine();
        let counter = Arc::new(AtomicUsize::new(0));
        table.register(qid("fragile"), Handler::new(|_| anyhow::bail!("handler exploded")));
        table.register(qid("fragile"), Handler::new(|_| panic!("handler panicked")));
        table.register(qid("fragile"), counting_handler(&counter));

        let report = engine.deliver(Envelope::new(qid("fragile"), json!({})), PeerId::new());

        assert_eq!(report.matched, 3);
        assert_eq!(report.failed, 2);
        assert_eq!(report.succeeded, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unmatched_envelope_is_a_no_op() {
        let (engine, _, transport) = engine();
        let report = engine.deliver(Envelope::expecting_ack(qid("ghost"), Value::Null), PeerId::new());
        assert_eq!(report, DeliveryReport::default());
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_handlers_receive_payload() {
        let (engine, table, _) = engine();
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        table.register(
            qid("data"),
            Handler::new(move |payload| {
                *sink.lock().unwrap() = Some(payload);
                Ok(())
            }),
        );

        engine.deliver(Envelope::new(qid("data"), json!({"n": 5})), PeerId::new());
        assert_eq!(*seen.lock().unwrap(), Some(json!({"n": 5})));
    }

    #[test]
    fn test_correlated_envelope_supplies_acknowledger_routed_to_origin() {
        let (engine, table, transport) = engine();
        table.register(
            qid("ask"),
            Handler::with_ack(|payload, ack| {
                let ack = ack.expect("correlated envelope carries an acknowledger");
                ack.ok(json!({"echo": payload}));
                Ok(())
            }),
        );

        let origin = PeerId::new();
        let envelope = Envelope::expecting_ack(qid("ask"), json!(1));
        let correlation_id = envelope.correlation_id().unwrap();
        engine.deliver(envelope, origin);

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, Route::Peer(origin));
        assert_eq!(
            sent[0].1,
            Frame::Ack(Acknowledgment {
                correlation_id,
                outcome: AckOutcome::Ok { result: json!({"echo": 1}) },
            })
        );
    }

    #[test]
    fn test_plain_envelope_supplies_no_acknowledger() {
        let (engine, table, _) = engine();
        let got_ack = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&got_ack);
        table.register(
            qid("plain"),
            Handler::with_ack(move |_, ack| {
                *sink.lock().unwrap() = Some(ack.is_some());
                Ok(())
            }),
        );

        engine.deliver(Envelope::new(qid("plain"), Value::Null), PeerId::new());
        assert_eq!(*got_ack.lock().unwrap(), Some(false));
    }

    #[test]
    fn test_only_first_of_several_acks_is_sent() {
        let (engine, table, transport) = engine();
        for _ in 0..3 {
            table.register(
                qid("race"),
                Handler::with_ack(|_, ack| {
                    if let Some(ack) = ack {
                        ack.ok(Value::Null);
                    }
                    Ok(())
                }),
            );
        }

        engine.deliver(Envelope::expecting_ack(qid("race"), Value::Null), PeerId::new());
        assert_eq!(transport.sent.lock().unwrap().len(), 1);
    }
}
