//! The façade's own [`UiPort`] implementation: turns the engine's
//! synchronous callback boundary into transport broadcasts and a
//! per-player wait for an inbound `PlayerAction` command.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::oneshot;

use crate::game::{GameEngine, Player, PlayerAction, UiPort};
use crate::messaging::{InProcessTransport, Message};

use super::messages::{GameSnapshot, PlayerTurnEvent, MSG_DEBUG, MSG_GAME_STATE_UPDATED, MSG_PLAYER_TURN};

const LOG_TARGET: &str = "poker_core::facade::ui_port";

/// Resolves [`UiPort::get_player_action`] by broadcasting a `PlayerTurn`
/// event and then waiting for [`FacadeUiPort::resolve_action`] to be
/// called from the façade's `PlayerAction` command handler — the engine
/// genuinely suspends there, exactly as the spec's synchronous callback
/// boundary requires, even though resolution happens on a different task.
pub struct FacadeUiPort {
    transport: Arc<InProcessTransport>,
    pending: DashMap<String, oneshot::Sender<(PlayerAction, u64)>>,
}

impl FacadeUiPort {
    pub fn new(transport: Arc<InProcessTransport>) -> Arc<Self> {
        Arc::new(Self {
            transport,
            pending: DashMap::new(),
        })
    }

    /// Called by the façade's `PlayerAction` subscription. Returns `true`
    /// if a waiter for this player was actually resolved.
    pub fn resolve_action(&self, player_id: &str, action: PlayerAction, amount: u64) -> bool {
        match self.pending.remove(player_id) {
            Some((_, sender)) => sender.send((action, amount)).is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl UiPort for FacadeUiPort {
    async fn show_message(&self, text: &str) {
        tracing::info!(target: LOG_TARGET, text, "engine message");
        let message = Message::builder(MSG_DEBUG, self.transport.transport_id())
            .header("kind", "show_message")
            .content(text.as_bytes().to_vec())
            .content_type("text/plain")
            .build();
        self.transport.broadcast(message).await;
    }

    async fn get_player_action(&self, player: &Player, engine: &GameEngine) -> (PlayerAction, u64) {
        let (tx, rx) = oneshot::channel();
        self.pending.insert(player.id.clone(), tx);

        let event = PlayerTurnEvent {
            player_id: player.id.clone(),
            current_bet: engine.current_bet(),
            pot: engine.pot(),
        };
        let message = Message::builder(MSG_PLAYER_TURN, self.transport.transport_id())
            .payload(&event)
            .build();
        self.transport.broadcast(message).await;

        match rx.await {
            Ok(resolved) => resolved,
            Err(_) => {
                // Sender dropped without resolving (e.g. shutdown mid-hand).
                // Folding is the only choice that can never violate an
                // engine invariant from any game state.
                tracing::warn!(target: LOG_TARGET, player_id = %player.id, "action wait cancelled; folding");
                (PlayerAction::Fold, 0)
            }
        }
    }

    async fn update_game_state(&self, engine: &GameEngine) {
        let snapshot = GameSnapshot::from_engine(engine);
        let message = Message::builder(MSG_GAME_STATE_UPDATED, self.transport.transport_id())
            .payload(&snapshot)
            .build();
        self.transport.broadcast(message).await;
    }
}
