//! `poker_core`: the messaging core (C1-C3) and the poker game-engine core
//! (C4-C7) described in `SPEC_FULL.md`. Everything outside these modules —
//! UIs, AI decision models, telemetry sinks, socket transports — is an
//! external collaborator this crate exposes interfaces to but does not
//! implement.

pub mod cards;
pub mod facade;
pub mod game;
pub mod messaging;
pub mod registry;
pub mod server;
pub mod tokio_tools;

pub use cards::{determine_winners, evaluate_best_hand, Card, Deck, Hand, HandRank, Rank, Suit};
pub use facade::ServiceFacade;
pub use game::{GameConfig, GameEngine, GameState, Player, PlayerAction, UiPort};
pub use messaging::{InProcessTransport, Message, TransportConfig};
pub use registry::ServiceContext;
