//! Per-bundle facade over a [`MessageBus`].
//!
//! Short message names resolve against the facade's own bundle unless a
//! bundle is named explicitly. Argument checks run before anything is
//! registered or sent.

use std::sync::Arc;

use panelbus_types::bundle::BundleGit;
use panelbus_types::error::ArgumentError;
use panelbus_types::message::Envelope;
use panelbus_types::name::BundleName;
use semver::Version;
use serde_json::Value;
use tracing::warn;

use super::context::MessageBus;
use super::error::BusError;
use super::handler::HandlerArg;
use super::namespace;
use super::pending::PendingAck;
use super::validate;

/// The bus as seen by code belonging to one bundle.
#[derive(Clone)]
pub struct BundleBus {
    bus: Arc<MessageBus>,
    name: BundleName,
}

impl BundleBus {
    pub(crate) fn new(bus: Arc<MessageBus>, name: BundleName) -> Self {
        Self { bus, name }
    }

    pub fn name(&self) -> &BundleName {
        &self.name
    }

    /// Register `handler` for `message_name` in this bundle's namespace.
    pub fn listen_for(
        &self,
        message_name: &str,
        handler: impl Into<HandlerArg>,
    ) -> Result<(), ArgumentError> {
        self.listen(message_name, None, handler.into())
    }

    /// Register `handler` for a message of another bundle.
    pub fn listen_for_bundle(
        &self,
        message_name: &str,
        bundle_name: &str,
        handler: impl Into<HandlerArg>,
    ) -> Result<(), ArgumentError> {
        self.listen(message_name, Some(bundle_name), handler.into())
    }

    fn listen(
        &self,
        message_name: &str,
        bundle_name: Option<&str>,
        handler: HandlerArg,
    ) -> Result<(), ArgumentError> {
        let handler = validate::require_handler(handler)?;
        let id = namespace::resolve(message_name, bundle_name, &self.name)?;
        self.bus.register(id, handler);
        Ok(())
    }

    /// Fire-and-forget send to the opposite side.
    ///
    /// Only argument errors are reported. A frame the transport refuses is
    /// logged and otherwise lost.
    pub fn send_message(&self, message_name: &str, payload: Value) -> Result<(), ArgumentError> {
        self.send(message_name, None, payload)
    }

    pub fn send_message_to_bundle(
        &self,
        message_name: &str,
        bundle_name: &str,
        payload: Value,
    ) -> Result<(), ArgumentError> {
        self.send(message_name, Some(bundle_name), payload)
    }

    fn send(
        &self,
        message_name: &str,
        bundle_name: Option<&str>,
        payload: Value,
    ) -> Result<(), ArgumentError> {
        let id = namespace::resolve(message_name, bundle_name, &self.name)?;
        if let Err(err) = self.bus.dispatch(Envelope::new(id.clone(), payload)) {
            warn!(message = %id, error = %err, "message not sent");
        }
        Ok(())
    }

    /// Send and return a continuation resolving with the first acknowledgment.
    pub fn send_message_with_ack(
        &self,
        message_name: &str,
        payload: Value,
    ) -> Result<PendingAck, BusError> {
        let id = namespace::resolve(message_name, None, &self.name)?;
        self.bus.dispatch_with_ack(id, payload)
    }

    pub fn send_message_to_bundle_with_ack(
        &self,
        message_name: &str,
        bundle_name: &str,
        payload: Value,
    ) -> Result<PendingAck, BusError> {
        let id = namespace::resolve(message_name, Some(bundle_name), &self.name)?;
        self.bus.dispatch_with_ack(id, payload)
    }

    /// Version of this bundle, if the context knows about it.
    pub fn bundle_version(&self) -> Option<Version> {
        self.bus
            .metadata()
            .descriptor(&self.name)
            .map(|descriptor| descriptor.version)
    }

    pub fn bundle_git(&self) -> Option<BundleGit> {
        self.bus
            .metadata()
            .descriptor(&self.name)
            .and_then(|descriptor| descriptor.git)
    }
}

impl std::fmt::Debug for BundleBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleBus")
            .field("name", &self.name)
            .finish()
    }
}
