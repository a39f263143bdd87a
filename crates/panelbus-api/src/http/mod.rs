//! HTTP/WebSocket layer for the server-side bus.
//!
//! Panels connect on `/ws`; a small REST surface at `/api/v1/` exposes bundle
//! metadata and server-side sends using the envelope response format.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
