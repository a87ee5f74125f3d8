//! Transport registry & shutdown coordinator (C3): lifecycle of many
//! transports with priority-ordered teardown.

mod shutdown;
mod transport_registry;

pub use shutdown::{ShutdownCoordinator, PRIORITY_MESSAGING, PRIORITY_TRANSPORT};
pub use transport_registry::TransportRegistry;

use std::sync::{Arc, OnceLock};

/// Bundles the two process-wide singletons the spec describes. Passed
/// explicitly to constructors rather than reached for as hidden globals;
/// [`ServiceContext::global`] is the lazily-initialized process-scoped
/// default for callers that don't need their own isolated context (tests
/// that want isolation should build their own via `ServiceContext::new`).
pub struct ServiceContext {
    pub transports: Arc<TransportRegistry>,
    pub shutdown: Arc<ShutdownCoordinator>,
}

impl ServiceContext {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            transports: Arc::new(TransportRegistry::new()),
            shutdown: Arc::new(ShutdownCoordinator::new()),
        })
    }

    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<ServiceContext>> = OnceLock::new();
        GLOBAL.get_or_init(ServiceContext::new).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_context_is_stable_across_calls() {
        let a = ServiceContext::global();
        let b = ServiceContext::global();
        assert!(Arc::ptr_eq(&a.transports, &b.transports));
    }

    #[test]
    fn new_context_is_isolated_from_global() {
        let isolated = ServiceContext::new();
        let global = ServiceContext::global();
        assert!(!Arc::ptr_eq(&isolated.transports, &global.transports));
    }
}
