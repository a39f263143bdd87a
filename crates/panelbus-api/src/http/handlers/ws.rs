//! WebSocket bridge between dashboard panels and the server-side bus.
//!
//! Each socket on `/ws` is one client context. The handler attaches a fresh
//! peer to the [`ServerHub`](panelbus_core::transport::ServerHub), then:
//!
//! - **Forwards outbound frames:** everything the server bus routes to this
//!   peer (broadcasts and acknowledgments) is pushed as a JSON text frame.
//! - **Receives inbound frames:** text frames are parsed as [`Frame`]s and
//!   handed to the hub under this peer's id.
//!
//! The peer is detached when the socket closes, which lets the server bus
//! fail acknowledgments nobody is left to answer.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;

use panelbus_types::message::{Frame, PeerId};

use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    /// Bundle the connecting panel belongs to. Only used for logging.
    pub bundle: Option<String>,
}

/// GET /ws - Upgrade to a bus connection.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state, params.bundle))
}

async fn handle_ws_connection(socket: WebSocket, state: AppState, bundle: Option<String>) {
    let peer = PeerId::new();
    let bundle = bundle.unwrap_or_default();
    let mut outbox = state.hub.attach(peer);
    let (mut ws_sender, mut ws_receiver) = socket.split();

    tracing::info!(%peer, %bundle, "panel connected");

    loop {
        tokio::select! {
            outbound = outbox.recv() => {
                let Some(frame) = outbound else {
                    // Detached by the hub.
                    break;
                };
                match encode_frame(&frame) {
                    Ok(json) => {
                        if ws_sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(%peer, "Failed to serialize frame: {err}");
                    }
                }
            }

            inbound = ws_receiver.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        let Some(frame) = decode_frame(&text) else {
                            continue;
                        };
                        if let Err(err) = state.hub.receive(peer, frame) {
                            tracing::warn!(%peer, error = %err, "server bus is not accepting frames");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(%peer, "WebSocket receive error: {err}");
                        break;
                    }
                    // Binary, ping and pong frames are not part of the bus protocol.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.hub.detach(&peer);
    tracing::info!(%peer, %bundle, "panel disconnected");
}

fn encode_frame(frame: &Frame) -> serde_json::Result<String> {
    serde_json::to_string(frame)
}

/// Parse a text frame. Malformed input is logged and skipped.
fn decode_frame(text: &str) -> Option<Frame> {
    match serde_json::from_str(text) {
        Ok(frame) => Some(frame),
        Err(err) => {
            tracing::warn!(raw = %text, error = %err, "Ignoring malformed bus frame");
            None
        }
    }
}
