//! The hand's phase transition graph.

use serde::{Deserialize, Serialize};

/// `WaitingToStart -> PreFlop -> Flop -> Turn -> River -> Showdown ->
/// HandComplete -> (WaitingToStart)`. [`GameEngine::start_hand`] drives this
/// graph end to end; there is no public operation to step a single phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    WaitingToStart,
    PreFlop,
    Flop,
    Turn,
    River,
    Showdown,
    HandComplete,
}

impl Default for GameState {
    fn default() -> Self {
        GameState::WaitingToStart
    }
}
