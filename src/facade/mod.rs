//! The service façade (C7): adapts engine events into broadcast messages
//! and inbound commands into engine calls. This is the only piece of the
//! crate that knows about both the messaging core and the game engine —
//! everything else on either side stays decoupled.

mod messages;
mod ui_port;

pub use messages::{
    ErrorPayload, GameSnapshot, PlayerActionCommand, PlayerTurnEvent, PlayerView, MSG_ACKNOWLEDGMENT, MSG_DEBUG,
    MSG_ERROR, MSG_GAME_STATE_UPDATED, MSG_HAND_COMPLETE, MSG_HAND_STARTED, MSG_HEARTBEAT, MSG_PLAYER_ACTION,
    MSG_PLAYER_TURN, MSG_SERVICE_REGISTRATION, MSG_START_HAND,
};
pub use ui_port::FacadeUiPort;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::game::GameEngine;
use crate::messaging::{HandlerResult, InProcessTransport, Message};
use crate::registry::{ServiceContext, PRIORITY_MESSAGING};
use crate::tokio_tools::spawn_named_task;

const LOG_TARGET: &str = "poker_core::facade";

/// The interval a deployment should default to when it wants a heartbeat
/// at all; [`ServiceFacade::spawn`] itself has no opinion — `None` always
/// means "no heartbeat".
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// Bridges one [`InProcessTransport`] to one [`GameEngine`]. The engine is
/// guarded by a `tokio::sync::Mutex` rather than accessed directly: every
/// command handler locks it for the duration of its own call, giving the
/// engine the single-writer semantics the spec requires even though
/// commands can arrive concurrently from multiple siblings.
pub struct ServiceFacade {
    transport: Arc<InProcessTransport>,
    engine: Arc<AsyncMutex<GameEngine>>,
    ui: Arc<FacadeUiPort>,
    heartbeat: CancellationToken,
    heartbeat_handle: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl ServiceFacade {
    /// Wires `engine` to `transport`: subscribes the known command types
    /// (`StartHand`, `PlayerAction`, `ServiceRegistration`) and, if
    /// `heartbeat_interval` is `Some(d)`, starts broadcasting a `Heartbeat`
    /// message every `d` — `None` skips the heartbeat entirely. Registers
    /// with `ctx`'s shutdown coordinator at the messaging-participant
    /// priority tier (100), ahead of the transport tier (200), per the
    /// teardown order in §4.3.
    pub fn spawn(
        transport: Arc<InProcessTransport>,
        engine: GameEngine,
        ctx: &Arc<ServiceContext>,
        heartbeat_interval: Option<Duration>,
    ) -> Arc<Self> {
        let ui = FacadeUiPort::new(transport.clone());
        let facade = Arc::new(Self {
            transport: transport.clone(),
            engine: Arc::new(AsyncMutex::new(engine)),
            ui,
            heartbeat: CancellationToken::new(),
            heartbeat_handle: std::sync::Mutex::new(None),
        });

        facade.subscribe_start_hand();
        facade.subscribe_player_action();
        facade.subscribe_service_registration();

        if let Some(interval) = heartbeat_interval {
            facade.start_heartbeat(interval);
        }

        let participant_id = format!("facade-{}", transport.transport_id());
        let for_shutdown = facade.clone();
        ctx.shutdown.register(participant_id, PRIORITY_MESSAGING, move || for_shutdown.shutdown());
        facade
    }

    fn subscribe_start_hand(self: &Arc<Self>) {
        let facade = self.clone();
        self.transport.subscribe(
            MSG_START_HAND,
            Arc::new(move |message: Message| {
                let facade = facade.clone();
                Box::pin(async move { facade.handle_start_hand(message).await })
            }),
        );
    }

    fn subscribe_player_action(self: &Arc<Self>) {
        let facade = self.clone();
        self.transport.subscribe(
            MSG_PLAYER_ACTION,
            Arc::new(move |message: Message| {
                let facade = facade.clone();
                Box::pin(async move { facade.handle_player_action(message).await })
            }),
        );
    }

    fn subscribe_service_registration(self: &Arc<Self>) {
        let transport_id = self.transport.transport_id().to_string();
        self.transport.subscribe(
            MSG_SERVICE_REGISTRATION,
            Arc::new(move |message: Message| {
                let transport_id = transport_id.clone();
                Box::pin(async move {
                    tracing::info!(
                        target: LOG_TARGET,
                        transport_id,
                        registering_service = %message.sender_id,
                        "service registration received"
                    );
                    Ok(())
                })
            }),
        );
    }

    /// Starting a hand can run for many player actions across four
    /// streets; the handler itself only kicks off a detached task and
    /// returns, per the design notes' guidance on the original's
    /// fire-and-forget async callbacks — callers observe hand progress
    /// through `GameStateUpdated`/`PlayerTurn`/`HandComplete` broadcasts,
    /// not through this handler's own acknowledgement.
    async fn handle_start_hand(self: Arc<Self>, inbound: Message) -> HandlerResult {
        let facade = self.clone();
        spawn_named_task("start-hand", async move {
            let mut engine = facade.engine.lock().await;
            let snapshot_before = GameSnapshot::from_engine(&engine);
            let started = Message::builder(MSG_HAND_STARTED, facade.transport.transport_id())
                .correlation_id(inbound.message_id.clone())
                .payload(&snapshot_before)
                .build();
            facade.transport.broadcast(started).await;

            match engine.start_hand(facade.ui.as_ref()).await {
                Ok(()) => {
                    let final_snapshot = GameSnapshot::from_engine(&engine);
                    let complete = Message::builder(MSG_HAND_COMPLETE, facade.transport.transport_id())
                        .correlation_id(inbound.message_id.clone())
                        .payload(&final_snapshot)
                        .build();
                    facade.transport.broadcast(complete).await;
                }
                Err(err) => {
                    tracing::error!(target: LOG_TARGET, %err, "start_hand failed");
                    let error_msg = Message::builder(MSG_ERROR, facade.transport.transport_id())
                        .correlation_id(inbound.message_id.clone())
                        .payload(&ErrorPayload { reason: err.to_string() })
                        .build();
                    facade.transport.broadcast(error_msg).await;
                }
            }
        });
        Ok(())
    }

    async fn handle_player_action(self: Arc<Self>, inbound: Message) -> HandlerResult {
        let command: PlayerActionCommand = inbound.payload();
        let Some(action) = command.action else {
            return Err(crate::messaging::HandlerError::new("PlayerAction command missing an action"));
        };

        if self.ui.resolve_action(&command.player_id, action, command.amount) {
            return Ok(());
        }

        // Nobody was waiting on this player's turn. If a hand is in
        // progress, `start_hand` is holding the engine lock for the whole
        // hand and the only legitimate way in is through the oneshot above
        // — `try_lock` lets a stale/out-of-turn command fail fast instead
        // of blocking the handler until the hand ends. If no hand is in
        // progress, the lock is free and this applies directly.
        match self.engine.try_lock() {
            Ok(mut engine) => match engine.process_player_action(&command.player_id, action, command.amount) {
                Ok(()) => Ok(()),
                Err(err) => Err(crate::messaging::HandlerError::new(err.to_string())),
            },
            Err(_) => Err(crate::messaging::HandlerError::new("no player turn is currently awaiting this action")),
        }
    }

    fn start_heartbeat(self: &Arc<Self>, interval: Duration) {
        let facade = self.clone();
        let cancellation = self.heartbeat.clone();
        let handle = spawn_named_task("facade-heartbeat", async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let message = Message::builder(MSG_HEARTBEAT, facade.transport.transport_id()).build();
                        facade.transport.broadcast(message).await;
                    }
                    _ = cancellation.cancelled() => break,
                }
            }
        });
        *self.heartbeat_handle.lock().unwrap() = Some(handle);
    }

    /// Stops the heartbeat task. Registered with the shutdown coordinator
    /// so `ShutdownCoordinator::shutdown_all` tears this down before the
    /// underlying transport (priority 100 vs. 200).
    pub fn shutdown(&self) {
        self.heartbeat.cancel();
        if let Some(handle) = self.heartbeat_handle.lock().unwrap().take() {
            handle.abort();
        }
    }

    pub fn transport(&self) -> &Arc<InProcessTransport> {
        &self.transport
    }

    pub fn engine(&self) -> &Arc<AsyncMutex<GameEngine>> {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;
    use crate::messaging::TransportConfig;
    use std::time::Duration as StdDuration;

    #[tokio::test]
    async fn start_hand_broadcasts_hand_started_and_completes_without_blocking_handler() {
        let ctx = ServiceContext::new();
        let transport = InProcessTransport::register("game-svc", ctx.transports.clone());
        transport
            .initialize(TransportConfig::new("game-svc", StdDuration::from_millis(200)))
            .unwrap();
        transport.start();

        let observer = InProcessTransport::register("observer", ctx.transports.clone());
        observer
            .initialize(TransportConfig::new("observer", StdDuration::from_millis(200)))
            .unwrap();
        observer.start();

        let hand_started = Arc::new(tokio::sync::Notify::new());
        let waiter = hand_started.clone();
        observer.subscribe(
            MSG_HAND_STARTED,
            Arc::new(move |_msg| {
                let waiter = waiter.clone();
                Box::pin(async move {
                    waiter.notify_one();
                    Ok(())
                })
            }),
        );

        let mut engine = GameEngine::new(GameConfig::default());
        engine.start_game(vec!["A".into(), "B".into()], 500).unwrap();

        let facade = ServiceFacade::spawn(transport.clone(), engine, &ctx, None);
        let start = Message::builder(MSG_START_HAND, "observer").build();
        let ok = transport.send("game-svc", start).await;
        assert!(ok);

        tokio::time::timeout(StdDuration::from_secs(1), hand_started.notified())
            .await
            .expect("HandStarted broadcast within timeout");

        facade.shutdown();
    }
}
