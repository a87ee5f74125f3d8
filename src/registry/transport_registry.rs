//! Process-wide directory of live transports, keyed by `transport_id`.

use std::sync::Arc;

use dashmap::DashMap;

use crate::messaging::transport::InProcessTransport;

/// Single-writer mutex semantics are delivered by `DashMap`'s internal
/// sharding: readers snapshot keys/values under their shard lock, writers
/// never block the whole map.
#[derive(Default)]
pub struct TransportRegistry {
    transports: DashMap<String, Arc<InProcessTransport>>,
}

impl TransportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_transport(&self, transport_id: impl Into<String>, transport: Arc<InProcessTransport>) {
        self.transports.insert(transport_id.into(), transport);
    }

    pub fn deregister_transport(&self, transport_id: &str) {
        self.transports.remove(transport_id);
    }

    pub fn lookup_transport(&self, transport_id: &str) -> Option<Arc<InProcessTransport>> {
        self.transports.get(transport_id).map(|entry| entry.value().clone())
    }

    pub fn snapshot_transports(&self) -> Vec<Arc<InProcessTransport>> {
        self.transports.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Tries every registered transport until one holds a pending waiter
    /// for `message_id`. At most one ever does.
    pub fn complete_pending_ack(&self, message_id: &str, success: bool, error: Option<String>) -> bool {
        for entry in self.transports.iter() {
            if entry.value().try_complete_pending_ack(message_id, success, error.clone()) {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_returns_none_for_unregistered_id() {
        let registry = TransportRegistry::new();
        assert!(registry.lookup_transport("ghost").is_none());
    }

    #[test]
    fn register_then_lookup_round_trips() {
        let registry = Arc::new(TransportRegistry::new());
        let transport = InProcessTransport::register("t1", registry.clone());
        assert_eq!(registry.lookup_transport("t1").unwrap().transport_id(), transport.transport_id());
    }

    #[test]
    fn deregister_removes_from_snapshot() {
        let registry = Arc::new(TransportRegistry::new());
        InProcessTransport::register("t1", registry.clone());
        assert_eq!(registry.snapshot_transports().len(), 1);
        registry.deregister_transport("t1");
        assert_eq!(registry.snapshot_transports().len(), 0);
    }
}
