//! Payload shapes for the message types the façade accepts and emits.
//! These ride inside [`crate::messaging::Message::content`] as JSON, per
//! the wire envelope in the spec's external interfaces section.

use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::game::{GameState, Player, PlayerAction};

pub const MSG_START_HAND: &str = "StartHand";
pub const MSG_HAND_STARTED: &str = "HandStarted";
pub const MSG_PLAYER_ACTION: &str = "PlayerAction";
pub const MSG_GAME_STATE_UPDATED: &str = "GameStateUpdated";
pub const MSG_PLAYER_TURN: &str = "PlayerTurn";
pub const MSG_HAND_COMPLETE: &str = "HandComplete";
pub const MSG_ACKNOWLEDGMENT: &str = "Acknowledgment";
pub const MSG_HEARTBEAT: &str = "Heartbeat";
pub const MSG_SERVICE_REGISTRATION: &str = "ServiceRegistration";
pub const MSG_ERROR: &str = "Error";
pub const MSG_DEBUG: &str = "Debug";

/// Inbound `PlayerAction` command payload.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerActionCommand {
    pub player_id: String,
    pub action: Option<PlayerAction>,
    #[serde(default)]
    pub amount: u64,
}

/// Outbound `PlayerTurn` event: tells subscribers whose turn it is and
/// what they owe.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerTurnEvent {
    pub player_id: String,
    pub current_bet: u64,
    pub pot: u64,
}

/// Outbound `GameStateUpdated` / `HandStarted` / `HandComplete` snapshot.
/// Hole cards are included only for players flagged `is_current_user` so a
/// broadcast snapshot never leaks other seats' cards to every subscriber —
/// callers that need full visibility (e.g. a trusted dealer service) read
/// `GameEngine::players()` directly instead of going over the wire.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub state: GameState,
    pub pot: u64,
    pub current_bet: u64,
    pub community_cards: Vec<Card>,
    pub players: Vec<PlayerView>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: String,
    pub name: String,
    pub chips: u64,
    pub current_bet: u64,
    pub has_folded: bool,
    pub is_all_in: bool,
    pub hole_cards: Vec<Card>,
}

impl PlayerView {
    fn from_player(player: &Player) -> Self {
        let hole_cards = if player.is_current_user { player.hole_cards.clone() } else { Vec::new() };
        Self {
            id: player.id.clone(),
            name: player.name.clone(),
            chips: player.chips,
            current_bet: player.current_bet,
            has_folded: player.has_folded,
            is_all_in: player.is_all_in,
            hole_cards,
        }
    }
}

impl GameSnapshot {
    pub fn from_engine(engine: &crate::game::GameEngine) -> Self {
        Self {
            state: engine.state(),
            pot: engine.pot(),
            current_bet: engine.current_bet(),
            community_cards: engine.community_cards().to_vec(),
            players: engine.players().iter().map(PlayerView::from_player).collect(),
        }
    }
}

/// Outbound `Error` payload, mirroring an `ActionError`'s message back to
/// whoever issued the rejected command.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub reason: String,
}
