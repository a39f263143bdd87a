//! Per-context registration table.
//!
//! Maps each qualified message id to its handlers in insertion order.
//! Registration is additive only; an id with no handlers is simply absent.

use dashmap::DashMap;
use panelbus_types::name::QualifiedMessageId;

use super::handler::Handler;

#[derive(Default)]
pub struct RegistrationTable {
    entries: DashMap<QualifiedMessageId, Vec<Handler>>,
}

impl RegistrationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler for `id`. Returns how many handlers `id` now has.
    pub fn register(&self, id: QualifiedMessageId, handler: Handler) -> usize {
        let mut entry = self.entries.entry(id).or_default();
        entry.push(handler);
        entry.len()
    }

    /// Snapshot of the handlers for `id`.
    ///
    /// Delivery works on the snapshot, so a handler registering more
    /// handlers does not hold the table lock or see itself re-invoked.
    pub fn handlers(&self, id: &QualifiedMessageId) -> Vec<Handler> {
        self.entries
            .get(id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub fn handler_count(&self, id: &QualifiedMessageId) -> usize {
        self.entries.get(id).map_or(0, |entry| entry.len())
    }

    /// All ids with at least one handler.
    pub fn ids(&self) -> Vec<QualifiedMessageId> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for RegistrationTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationTable")
            .field("ids", &self.entries.len())
            .finish()
    }
}
