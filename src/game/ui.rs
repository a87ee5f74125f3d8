//! The UI port (C6): a capability record the engine calls out through,
//! never owns. Replaces the original's cyclic engine<->UI coupling — the
//! engine holds this by reference (`&dyn UiPort`) and treats it purely as
//! a synchronous callback boundary, per the design notes' "break with an
//! interface and pass a reference".

use async_trait::async_trait;

use super::engine::GameEngine;
use super::player::Player;

/// Implementations are free to resolve [`UiPort::get_player_action`]
/// however they like — blocking on a terminal prompt, querying an AI
/// decision model, or awaiting an inbound transport message — as long as
/// the returned action is one the engine has not yet observed. The engine
/// does not advance the hand until that future resolves.
#[async_trait]
pub trait UiPort: Send + Sync {
    /// A free-form status line for the player(s) to see; never affects
    /// engine state.
    async fn show_message(&self, text: &str);

    /// Blocks (from the engine's point of view) until the given player's
    /// action is known. Returns `(action, amount)`; `amount` is read only
    /// when `action` is [`crate::game::PlayerAction::Raise`].
    async fn get_player_action(
        &self,
        player: &Player,
        engine: &GameEngine,
    ) -> (super::actions::PlayerAction, u64);

    /// Called after every state-changing step so UIs can refresh a
    /// snapshot view. Purely observational — the engine does not wait for
    /// this to do anything in particular, only for it to return.
    async fn update_game_state(&self, engine: &GameEngine);
}
