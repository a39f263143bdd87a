//! Wire-level types for the message bus.
//!
//! An [`Envelope`] carries one named message; an [`Acknowledgment`] answers a
//! correlated envelope. Both travel inside a [`Frame`], the unit a transport
//! moves between contexts (one JSON text frame per `Frame`).

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::name::QualifiedMessageId;

/// Identity of one connected execution context, as seen by a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(Uuid);

impl PeerId {
    /// Allocate a fresh, time-sortable peer id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for PeerId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A named message in flight.
///
/// Fields are read-only once built: the qualified id of a sent envelope
/// never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(flatten)]
    id: QualifiedMessageId,
    #[serde(default)]
    payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    correlation_id: Option<Uuid>,
}

impl Envelope {
    /// Build a fire-and-forget envelope.
    pub fn new(id: QualifiedMessageId, payload: Value) -> Self {
        Self {
            id,
            payload,
            correlation_id: None,
        }
    }

    /// Build an envelope that expects an acknowledgment, with a fresh
    /// UUIDv7 correlation id.
    pub fn expecting_ack(id: QualifiedMessageId, payload: Value) -> Self {
        Self {
            id,
            payload,
            correlation_id: Some(Uuid::now_v7()),
        }
    }

    pub fn id(&self) -> &QualifiedMessageId {
        &self.id
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn correlation_id(&self) -> Option<Uuid> {
        self.correlation_id
    }

    /// Take the payload by value, consuming the envelope.
    pub fn into_payload(self) -> Value {
        self.payload
    }
}

/// Result carried back by an acknowledgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AckOutcome {
    Ok {
        #[serde(default)]
        result: Value,
    },
    Err {
        error: String,
    },
}

impl AckOutcome {
    pub fn into_result(self) -> Result<Value, String> {
        match self {
            AckOutcome::Ok { result } => Ok(result),
            AckOutcome::Err { error } => Err(error),
        }
    }
}

impl From<Result<Value, String>> for AckOutcome {
    fn from(value: Result<Value, String>) -> Self {
        match value {
            Ok(result) => AckOutcome::Ok { result },
            Err(error) => AckOutcome::Err { error },
        }
    }
}

/// Reply to a correlated envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgment {
    pub correlation_id: Uuid,
    #[serde(flatten)]
    pub outcome: AckOutcome,
}

/// Unit of transfer between two contexts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    Message(Envelope),
    Ack(Acknowledgment),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::{BundleName, MessageName};
    use serde_json::json;

    fn qid(bundle: &str, message: &str) -> QualifiedMessageId {
        QualifiedMessageId::new(
            BundleName::new(bundle).unwrap(),
            MessageName::new(message).unwrap(),
        )
    }

    #[test]
    fn test_message_frame_wire_shape() {
        let frame = Frame::Message(Envelope::new(qid("test", "ping"), json!({"n": 1})));
        let json_str = serde_json::to_string(&frame).unwrap();

        assert!(json_str.contains("\"type\":\"message\""));
        assert!(json_str.contains("\"bundle\":\"test\""));
        assert!(json_str.contains("\"message\":\"ping\""));
        // correlation_id is omitted for fire-and-forget sends
        assert!(!json_str.contains("correlation_id"));
    }

    #[test]
    fn test_message_frame_without_payload_parses_as_null() {
        let raw = r#"{"type":"message","bundle":"test","message":"dashboardToServer"}"#;
        let frame: Frame = serde_json::from_str(raw).unwrap();
        match frame {
            Frame::Message(envelope) => {
                assert_eq!(envelope.payload(), &Value::Null);
                assert_eq!(envelope.id(), &qid("test", "dashboardToServer"));
                assert!(envelope.correlation_id().is_none());
            }
            other => panic!("expected message frame, got {other:?}"),
        }
    }

    #[test]
    fn test_expecting_ack_sets_correlation_id() {
        let envelope = Envelope::expecting_ack(qid("test", "x"), Value::Null);
        let correlation_id = envelope.correlation_id().unwrap();

        let json_str = serde_json::to_string(&Frame::Message(envelope)).unwrap();
        assert!(json_str.contains(&correlation_id.to_string()));
    }

    #[test]
    fn test_ack_frame_error_outcome() {
        let ack = Frame::Ack(Acknowledgment {
            correlation_id: Uuid::now_v7(),
            outcome: AckOutcome::Err {
                error: "boom".to_string(),
            },
        });
        let json_str = serde_json::to_string(&ack).unwrap();
        assert!(json_str.contains("\"type\":\"ack\""));
        assert!(json_str.contains("\"status\":\"err\""));

        let parsed: Frame = serde_json::from_str(&json_str).unwrap();
        match parsed {
            Frame::Ack(a) => assert_eq!(a.outcome.into_result(), Err("boom".to_string())),
            other => panic!("expected ack frame, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_frame_with_empty_bundle() {
        let raw = r#"{"type":"message","bundle":"","message":"x"}"#;
        assert!(serde_json::from_str::<Frame>(raw).is_err());
    }
}
