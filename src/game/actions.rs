//! The action vocabulary a player may take during a betting round.

use serde::{Deserialize, Serialize};

/// A single betting decision. `Raise` carries its target in a separate
/// `amount` parameter on [`crate::game::GameEngine::process_player_action`]
/// rather than as a variant field, matching the public operation's shape
/// in the spec (`process_player_action(action, amount)`); `amount` is
/// ignored for every other variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerAction {
    Fold,
    Check,
    Call,
    Raise,
}
