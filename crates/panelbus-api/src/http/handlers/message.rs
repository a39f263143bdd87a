//! Server-side message sends over HTTP.
//!
//! Lets tooling outside the dashboard push a message to every connected
//! panel, optionally waiting for the first acknowledgment.

use std::time::{Duration, Instant};

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

use panelbus_core::bus::BusError;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Upper bound on holding an HTTP request open for an acknowledgment when
/// the bus itself has no ack timeout configured.
const MAX_ACK_WAIT: Duration = Duration::from_secs(30);

#[derive(Debug, Default, Deserialize)]
pub struct SendParams {
    /// Wait for the first acknowledgment and return its result.
    #[serde(default)]
    pub ack: bool,
}

/// POST /api/v1/bundles/{name}/messages/{message}
///
/// The request body, if any, is the JSON payload. An empty body sends no payload.
pub async fn send_message(
    State(state): State<AppState>,
    Path((bundle, message)): Path<(String, String)>,
    Query(params): Query<SendParams>,
    body: Bytes,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let payload = parse_payload(&body)?;
    let bus = state.bus.bundle(&bundle)?;
    let peers = state.hub.peer_count();

    let result = if params.ack {
        let pending = bus.send_message_with_ack(&message, payload)?;
        let wait = state.config.bus.ack_timeout().unwrap_or(MAX_ACK_WAIT);
        let outcome = tokio::time::timeout(wait, pending)
            .await
            .map_err(|_| AppError::Bus(BusError::Timeout(wait)))??;
        Some(outcome)
    } else {
        bus.send_message(&message, payload)?;
        None
    };

    tracing::debug!(%bundle, %message, peers, ack = params.ack, "message sent over HTTP");

    let elapsed = start.elapsed().as_millis() as u64;
    let mut data = json!({
        "bundle": bundle,
        "message": message,
        "peers": peers,
    });
    if let Some(result) = result {
        data["result"] = result;
    }
    Ok(Json(ApiResponse::success(data, request_id, elapsed)))
}

fn parse_payload(body: &[u8]) -> Result<Value, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| AppError::Validation(format!("Invalid JSON payload: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use panelbus_core::bundle::BundleRegistry;
    use panelbus_core::bus::{DeliveryFailure, Handler, MessageBus};
    use panelbus_core::transport::LocalLink;
    use panelbus_types::config::{BusConfig, PanelbusConfig};

    fn state() -> AppState {
        AppState::from_parts(std::env::temp_dir(), PanelbusConfig::default(), BundleRegistry::default())
    }

    #[test]
    fn test_empty_body_is_null_payload() {
        assert_eq!(parse_payload(b"").unwrap(), Value::Null);
        assert_eq!(parse_payload(b"  \n").unwrap(), Value::Null);
        assert_eq!(parse_payload(br#"{"a":1}"#).unwrap(), json!({"a": 1}));
        assert!(matches!(parse_payload(b"{nope"), Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_fire_and_forget_without_clients_succeeds() {
        let Json(resp) = send_message(
            State(state()),
            Path(("test".to_string(), "ping".to_string())),
            Query(SendParams::default()),
            Bytes::new(),
        )
        .await
        .unwrap();

        let data = resp.data.unwrap();
        assert_eq!(data["peers"], 0);
        assert!(data.get("result").is_none());
    }

    #[tokio::test]
    async fn test_empty_message_name_is_rejected() {
        let err = send_message(
            State(state()),
            Path(("test".to_string(), String::new())),
            Query(SendParams::default()),
            Bytes::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Argument(_)));
    }

    #[tokio::test]
    async fn test_ack_returns_client_result() {
        let state = state();
        let (link, client_rx) = LocalLink::new(state.hub.clone(), &state.config.bus);
        let client = MessageBus::new(link.clone(), state.config.bus.clone());
        client.spawn(client_rx);
        link.connect();
        client
            .bundle("test")
            .unwrap()
            .listen_for(
                "status",
                Handler::with_ack(|payload, ack| {
                    if let Some(ack) = ack {
                        ack.ok(json!({"seen": payload}));
                    }
                    Ok(())
                }),
            )
            .unwrap();

        let Json(resp) = send_message(
            State(state),
            Path(("test".to_string(), "status".to_string())),
            Query(SendParams { ack: true }),
            Bytes::from_static(b"7"),
        )
        .await
        .unwrap();

        let data = resp.data.unwrap();
        assert_eq!(data["peers"], 1);
        assert_eq!(data["result"], json!({"seen": 7}));
    }

    #[tokio::test]
    async fn test_timed_out_request_releases_pending_ack() {
        let config = PanelbusConfig {
            bus: BusConfig {
                ack_timeout_ms: Some(50),
                ..BusConfig::default()
            },
            ..PanelbusConfig::default()
        };
        let state = AppState::from_parts(std::env::temp_dir(), config, BundleRegistry::default());
        let (link, client_rx) = LocalLink::new(state.hub.clone(), &state.config.bus);
        let client = MessageBus::new(link.clone(), state.config.bus.clone());
        client.spawn(client_rx);
        link.connect();

        let err = send_message(
            State(state.clone()),
            Path(("test".to_string(), "nobody-answers".to_string())),
            Query(SendParams { ack: true }),
            Bytes::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Bus(BusError::Timeout(_))));
        assert_eq!(state.bus.pending_acks(), 0);
    }

    #[tokio::test]
    async fn test_ack_without_clients_is_unavailable() {
        let err = send_message(
            State(state()),
            Path(("test".to_string(), "ping".to_string())),
            Query(SendParams { ack: true }),
            Bytes::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            AppError::Bus(BusError::Delivery(DeliveryFailure::Disconnected))
        ));
    }

    #[tokio::test]
    async fn test_pending_ack_fails_when_last_client_leaves() {
        let state = state();
        let (link, client_rx) = LocalLink::new(state.hub.clone(), &state.config.bus);
        let client = MessageBus::new(link.clone(), state.config.bus.clone());
        client.spawn(client_rx);
        link.connect();

        let request = tokio::spawn(send_message(
            State(state),
            Path(("test".to_string(), "nobody-answers".to_string())),
            Query(SendParams { ack: true }),
            Bytes::new(),
        ));
        tokio::time::sleep(Duration::from_millis(50)).await;
        link.disconnect();

        let err = request.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            AppError::Bus(BusError::Delivery(DeliveryFailure::Disconnected))
        ));
    }
}
