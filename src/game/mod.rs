//! The game engine (C5): a betting-round state machine with a strict
//! ordering protocol, `has_acted` invariants, and pot distribution at
//! showdown. Built on the deck and hand evaluator (C4) and driven through
//! the UI port (C6).

pub mod actions;
pub mod engine;
pub mod errors;
pub mod player;
pub mod state;
pub mod ui;

pub use actions::PlayerAction;
pub use engine::{GameConfig, GameEngine};
pub use errors::{ActionError, EngineError};
pub use player::Player;
pub use state::GameState;
pub use ui::UiPort;
