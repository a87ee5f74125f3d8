//! Priority-ordered, deadline-bounded shutdown coordination (C3).

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

const LOG_TARGET: &str = "poker_core::registry::shutdown";

/// Messaging participants (subscriptions, facades) tear down before
/// transports — lower priority number shuts down first.
pub const PRIORITY_MESSAGING: u32 = 100;
pub const PRIORITY_TRANSPORT: u32 = 200;

struct Participant {
    priority: u32,
    shutdown_fn: Box<dyn Fn() + Send + Sync>,
}

/// A process-wide singleton tracking `participant_id -> {priority,
/// shutdown_fn}`. Represented here as an explicit context object rather
/// than a hidden global, per the deployment's preference for constructor
/// injection over `lazy_static`-style statics; [`crate::registry::ServiceContext::global`]
/// is the process-scoped default for callers that don't wire their own.
#[derive(Default)]
pub struct ShutdownCoordinator {
    participants: DashMap<String, Participant>,
    shutting_down: AtomicBool,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Participants register at construction and deregister on dispose.
    pub fn register(&self, participant_id: impl Into<String>, priority: u32, shutdown_fn: impl Fn() + Send + Sync + 'static) {
        self.participants.insert(
            participant_id.into(),
            Participant {
                priority,
                shutdown_fn: Box::new(shutdown_fn),
            },
        );
    }

    pub fn deregister(&self, participant_id: &str) {
        self.participants.remove(participant_id);
    }

    pub fn is_registered(&self, participant_id: &str) -> bool {
        self.participants.contains_key(participant_id)
    }

    /// Invokes `shutdown_fn` for every participant in ascending priority
    /// order. Each gets the same `deadline`; once it elapses, remaining
    /// participants are skipped (but still marked torn down, i.e.
    /// deregistered without running). Reentrant calls return immediately.
    pub fn shutdown_all(&self, deadline: Duration) {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            tracing::debug!(target: LOG_TARGET, "shutdown_all already in progress; ignoring reentrant call");
            return;
        }

        let deadline_instant = Instant::now() + deadline;
        let mut ordered: Vec<(String, u32)> = self
            .participants
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().priority))
            .collect();
        ordered.sort_by_key(|(_, priority)| *priority);

        for (participant_id, _) in ordered {
            if Instant::now() >= deadline_instant {
                tracing::warn!(target: LOG_TARGET, %participant_id, "shutdown deadline elapsed; skipping without running shutdown_fn");
                self.participants.remove(&participant_id);
                continue;
            }
            if let Some((_, participant)) = self.participants.remove(&participant_id) {
                tracing::info!(target: LOG_TARGET, %participant_id, priority = participant.priority, "tearing down participant");
                (participant.shutdown_fn)();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn participants_shut_down_in_ascending_priority_order() {
        let coordinator = ShutdownCoordinator::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let order_a = order.clone();
        coordinator.register("transport-1", PRIORITY_TRANSPORT, move || order_a.lock().unwrap().push("transport-1"));
        let order_b = order.clone();
        coordinator.register("facade-1", PRIORITY_MESSAGING, move || order_b.lock().unwrap().push("facade-1"));

        coordinator.shutdown_all(Duration::from_secs(5));
        assert_eq!(*order.lock().unwrap(), vec!["facade-1", "transport-1"]);
    }

    #[test]
    fn reentrant_shutdown_all_is_a_no_op() {
        let coordinator = ShutdownCoordinator::new();
        let calls = Arc::new(Mutex::new(0));
        let calls_clone = calls.clone();
        coordinator.register("p1", PRIORITY_MESSAGING, move || *calls_clone.lock().unwrap() += 1);

        coordinator.shutdown_all(Duration::from_secs(5));
        coordinator.shutdown_all(Duration::from_secs(5));
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn elapsed_deadline_skips_remaining_without_running_them() {
        let coordinator = ShutdownCoordinator::new();
        let ran = Arc::new(Mutex::new(false));
        let ran_clone = ran.clone();
        coordinator.register("slow", PRIORITY_MESSAGING, move || {
            std::thread::sleep(Duration::from_millis(20));
        });
        coordinator.register("late", PRIORITY_TRANSPORT, move || *ran_clone.lock().unwrap() = true);

        coordinator.shutdown_all(Duration::from_millis(5));
        assert!(!*ran.lock().unwrap());
        assert!(!coordinator.is_registered("late"));
    }
}
