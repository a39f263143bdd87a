//! Named-message bus between the server and client contexts.
//!
//! - `context` -- `MessageBus`, one per execution context, with its event loop
//! - `facade` -- `BundleBus`, the per-bundle `listen_for`/`send_message` API
//! - `validate` -- synchronous argument checks
//! - `namespace` -- short name to `bundle:message` resolution
//! - `registry` -- per-context registration table
//! - `delivery` -- fan-out of inbound envelopes to handlers
//! - `handler` -- `Handler`, `HandlerArg` and the `Acknowledger` callback
//! - `pending` -- reply channels for sends awaiting an acknowledgment

pub mod context;
pub mod delivery;
pub mod error;
pub mod facade;
pub mod handler;
pub mod namespace;
pub mod pending;
pub mod registry;
pub mod validate;

pub use context::MessageBus;
pub use delivery::DeliveryReport;
pub use error::{BusError, DeliveryFailure};
pub use facade::BundleBus;
pub use handler::{Acknowledger, Handler, HandlerArg};
pub use pending::PendingAck;
