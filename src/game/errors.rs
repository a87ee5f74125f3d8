//! Error taxonomy for the game engine (C5): `ProtocolViolation` (rejected
//! action, state unchanged, surfaced to UI) and `Fatal` (programmer misuse).

use thiserror::Error;

/// A rejected action. The engine's state is unchanged when this is
/// returned; the caller is expected to relay the message to the acting
/// player (via [`crate::game::UiPort::show_message`] or an `Error` reply
/// message from the façade) and request a new action.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("no player with that id is seated at this table")]
    UnknownPlayer,
    #[error("it is not this player's turn to act")]
    NotPlayersTurn,
    #[error("player has already folded")]
    PlayerFolded,
    #[error("player is already all-in")]
    PlayerAllIn,
    #[error("must call or fold facing a bet")]
    MustCallOrFold,
    #[error("raise must total at least {minimum} chips")]
    RaiseBelowMinimum { minimum: u64 },
}

/// Programmer misuse rather than an ordinary rule violation: starting a
/// hand with too few players, or seating more than the table allows.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("a hand needs at least 2 players, found {0}")]
    TooFewPlayers(usize),
    #[error("need between 2 and {max} players to start a game, got {count}")]
    InvalidPlayerCount { count: usize, max: usize },
}
