//! The in-process pub/sub transport (C2): routing, acknowledgement, and the
//! running/disposed lifecycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::future::join_all;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::envelope::Message;
use super::errors::TransportError;
use super::subscription::{Handler, Predicate, Subscription, SubscriptionId};
use crate::registry::{ServiceContext, TransportRegistry, PRIORITY_TRANSPORT};
use crate::tokio_tools::spawn_named_task;

const LOG_TARGET: &str = "poker_core::messaging::transport";

/// Set once via [`InProcessTransport::initialize`]: service identity and
/// ack timing. Immutable thereafter — re-initializing replaces it wholesale.
#[derive(Clone, Debug)]
pub struct TransportConfig {
    pub service_id: String,
    pub ack_timeout: Duration,
}

impl TransportConfig {
    pub fn new(service_id: impl Into<String>, ack_timeout: Duration) -> Self {
        Self {
            service_id: service_id.into(),
            ack_timeout,
        }
    }
}

struct PendingAck {
    sender: oneshot::Sender<AckOutcome>,
}

#[derive(Clone, Debug)]
struct AckOutcome {
    success: bool,
    #[allow(dead_code)]
    error: Option<String>,
}

/// A shared-memory pub/sub fabric instance. Many instances share one
/// process-wide [`TransportRegistry`] keyed by `transport_id`.
pub struct InProcessTransport {
    transport_id: String,
    registry: Arc<TransportRegistry>,
    config: parking_lot::RwLock<Option<TransportConfig>>,
    running: AtomicBool,
    disposed: AtomicBool,
    subscriptions: DashMap<SubscriptionId, Subscription>,
    pending_acks: DashMap<String, PendingAck>,
    cancellation: CancellationToken,
    shutdown: parking_lot::Mutex<Option<Arc<crate::registry::ShutdownCoordinator>>>,
}

impl InProcessTransport {
    /// Builds and registers a new transport under `transport_id`, joining
    /// both the routing registry and the shutdown coordinator (priority
    /// 200, per the spec's transport-teardown tier). Not yet initialized
    /// or running — `initialize` then `start` must follow.
    pub fn register(transport_id: impl Into<String>, registry: Arc<TransportRegistry>) -> Arc<Self> {
        let transport_id = transport_id.into();
        let transport = Arc::new(Self {
            transport_id: transport_id.clone(),
            registry: registry.clone(),
            config: parking_lot::RwLock::new(None),
            running: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            subscriptions: DashMap::new(),
            pending_acks: DashMap::new(),
            cancellation: CancellationToken::new(),
            shutdown: parking_lot::Mutex::new(None),
        });
        registry.register_transport(transport_id, transport.clone());
        transport
    }

    /// Same as [`InProcessTransport::register`], but also joins the
    /// context's shutdown coordinator so `shutdown_all` disposes this
    /// transport in its priority tier.
    pub fn register_with_context(transport_id: impl Into<String>, ctx: &Arc<ServiceContext>) -> Arc<Self> {
        let transport_id = transport_id.into();
        let transport = Self::register(transport_id.clone(), ctx.transports.clone());
        *transport.shutdown.lock() = Some(ctx.shutdown.clone());
        let for_shutdown = transport.clone();
        ctx.shutdown
            .register(transport_id, PRIORITY_TRANSPORT, move || for_shutdown.dispose());
        transport
    }

    pub fn transport_id(&self) -> &str {
        &self.transport_id
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst) && !self.is_disposed()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn ack_timeout(&self) -> Duration {
        self.config
            .read()
            .as_ref()
            .map(|c| c.ack_timeout)
            .unwrap_or(Duration::from_millis(5_000))
    }

    /// Idempotent; fails only if disposed.
    pub fn initialize(&self, config: TransportConfig) -> Result<(), TransportError> {
        if self.is_disposed() {
            return Err(TransportError::Disposed(self.transport_id.clone()));
        }
        *self.config.write() = Some(config);
        Ok(())
    }

    /// Transitions to running. Before this call, `send`/`broadcast` return
    /// `false` without raising.
    pub fn start(&self) {
        if !self.is_disposed() {
            self.running.store(true, Ordering::SeqCst);
        }
    }

    /// Drains pending acks with negative completion; transitions to
    /// not-running.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.fail_all_pending("transport stopped");
    }

    /// Marks this transport disposed: all operations become no-ops
    /// returning `false`, and it deregisters from the shared registry.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.running.store(false, Ordering::SeqCst);
        self.cancellation.cancel();
        self.fail_all_pending("transport disposed");
        self.registry.deregister_transport(&self.transport_id);
        if let Some(coordinator) = self.shutdown.lock().take() {
            coordinator.deregister(&self.transport_id);
        }
    }

    fn fail_all_pending(&self, reason: &str) {
        let message_ids: Vec<String> = self.pending_acks.iter().map(|entry| entry.key().clone()).collect();
        for message_id in message_ids {
            if let Some((_, pending)) = self.pending_acks.remove(&message_id) {
                let _ = pending.sender.send(AckOutcome {
                    success: false,
                    error: Some(reason.to_string()),
                });
            }
        }
    }

    pub fn subscribe(&self, message_type: impl Into<String>, handler: Handler) -> SubscriptionId {
        self.insert_subscription(Predicate::ByType(message_type.into()), handler)
    }

    pub fn subscribe_source(&self, source: impl Into<String>, handler: Handler) -> SubscriptionId {
        self.insert_subscription(Predicate::BySource(source.into()), handler)
    }

    pub fn subscribe_all(&self, handler: Handler) -> SubscriptionId {
        self.insert_subscription(Predicate::All, handler)
    }

    fn insert_subscription(&self, predicate: Predicate, handler: Handler) -> SubscriptionId {
        let subscription = Subscription::new(predicate, handler);
        let id = subscription.id.clone();
        self.subscriptions.insert(id.clone(), subscription);
        id
    }

    /// Removes the binding, returning whether one existed.
    pub fn unsubscribe(&self, id: &SubscriptionId) -> bool {
        self.subscriptions.remove(id).is_some()
    }

    /// Sends to a sibling transport by `transport_id`. Unknown destination,
    /// not-running, or disposed: returns `false`, no delivery attempted.
    pub async fn send(self: &Arc<Self>, destination: &str, message: Message) -> bool {
        self.send_cancellable(destination, message, None).await
    }

    /// As [`InProcessTransport::send`], but a caller-provided cancellation
    /// can also abort the wait early. Aborting the wait never retracts the
    /// already-delivered message — only the sender stops waiting on it.
    pub async fn send_cancellable(
        self: &Arc<Self>,
        destination: &str,
        message: Message,
        external_cancellation: Option<CancellationToken>,
    ) -> bool {
        if !self.is_running() {
            return false;
        }
        let Some(dest) = self.registry.lookup_transport(destination) else {
            tracing::debug!(target: LOG_TARGET, %destination, "send to unknown destination");
            return false;
        };

        if message.require_acknowledgement {
            let (tx, rx) = oneshot::channel();
            let message_id = message.message_id.clone();
            self.pending_acks.insert(message_id.clone(), PendingAck { sender: tx });

            let sender_id = self.transport_id.clone();
            spawn_named_task(format!("deliver-{}", message_id), async move {
                dest.deliver_local(message, sender_id).await;
            });

            let own_cancellation = self.cancellation.clone();
            let outcome = tokio::select! {
                result = tokio::time::timeout(self.ack_timeout(), rx) => result.ok().and_then(Result::ok),
                _ = own_cancellation.cancelled() => None,
                _ = cancelled_or_pending(external_cancellation) => None,
            };
            self.pending_acks.remove(&message_id);
            match outcome {
                Some(ack) => ack.success,
                None => {
                    tracing::debug!(target: LOG_TARGET, %message_id, "ack wait did not complete (timeout or cancellation)");
                    false
                }
            }
        } else {
            let sender_id = self.transport_id.clone();
            dest.deliver_local(message, sender_id).await;
            true
        }
    }

    /// Delivers to every other running, non-disposed sibling. Per-sibling
    /// failures are logged and do not abort the overall broadcast.
    pub async fn broadcast(self: &Arc<Self>, message: Message) -> bool {
        if !self.is_running() {
            return false;
        }
        let siblings: Vec<Arc<InProcessTransport>> = self
            .registry
            .snapshot_transports()
            .into_iter()
            .filter(|t| t.transport_id() != self.transport_id && t.is_running())
            .collect();

        let sender_id = self.transport_id.clone();
        let deliveries = siblings.into_iter().map(|sibling| {
            let message = message.clone();
            let sender_id = sender_id.clone();
            async move { sibling.deliver_local(message, sender_id).await }
        });
        join_all(deliveries).await;
        true
    }

    /// Completes the matching pending waiter on whichever sibling is
    /// holding `message_id` — at most one holds a given id.
    pub fn acknowledge(&self, message_id: &str, success: bool, error: Option<String>) -> bool {
        if let Some((_, pending)) = self.pending_acks.remove(message_id) {
            return pending.sender.send(AckOutcome { success, error }).is_ok();
        }
        self.registry.complete_pending_ack(message_id, success, error)
    }

    pub(crate) fn try_complete_pending_ack(&self, message_id: &str, success: bool, error: Option<String>) -> bool {
        match self.pending_acks.remove(message_id) {
            Some((_, pending)) => pending.sender.send(AckOutcome { success, error }).is_ok(),
            None => false,
        }
    }

    /// Scans subscriptions and invokes matching handlers concurrently;
    /// returns only after all of them complete. A disposed transport is a
    /// silent no-op, matching the edge case in the routing contract.
    async fn deliver_local(self: Arc<Self>, message: Message, sender_transport_id: String) {
        if self.is_disposed() {
            return;
        }
        let matching: Vec<Subscription> = self
            .subscriptions
            .iter()
            .filter(|entry| entry.matches(&message))
            .map(|entry| entry.value().clone())
            .collect();

        let invocations = matching.iter().map(|sub| (sub.handler)(message.clone()));
        let results = join_all(invocations).await;

        let mut first_error = None;
        for result in &results {
            if let Err(err) = result {
                tracing::warn!(target: LOG_TARGET, error = %err, "subscribed handler failed");
                if first_error.is_none() {
                    first_error = Some(err.to_string());
                }
            }
        }

        if message.require_acknowledgement {
            let success = first_error.is_none();
            if let Some(sender) = self.registry.lookup_transport(&sender_transport_id) {
                sender.try_complete_pending_ack(&message.message_id, success, first_error);
            }
        }
    }
}

/// Awaits `token`'s cancellation if one was given, or never resolves
/// otherwise — lets the `send_cancellable` `select!` treat "no external
/// token" as "this branch never wins".
async fn cancelled_or_pending(token: Option<CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}
