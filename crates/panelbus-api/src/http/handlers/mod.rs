//! HTTP and WebSocket request handlers.

pub mod bundle;
pub mod message;
pub mod ws;
