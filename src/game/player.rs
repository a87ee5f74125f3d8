//! Per-seat state tracked across a hand.

use serde::{Deserialize, Serialize};

use crate::cards::Card;

/// Invariants (enforced by [`crate::game::GameEngine`], not by this type):
/// `is_all_in ⇒ chips == 0`; `has_folded ⇒ !is_active()`; `current_bet` never
/// exceeds the chips the player held at the start of the round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub chips: u64,
    pub current_bet: u64,
    pub hole_cards: Vec<Card>,
    pub has_folded: bool,
    pub is_all_in: bool,
    pub has_acted: bool,
    pub is_current_user: bool,
}

impl Player {
    pub fn new(id: impl Into<String>, name: impl Into<String>, chips: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            chips,
            current_bet: 0,
            hole_cards: Vec::new(),
            has_folded: false,
            is_all_in: false,
            has_acted: false,
            is_current_user: false,
        }
    }

    /// A player not folded in the current hand. Derived rather than stored
    /// so it can never drift out of sync with `has_folded`.
    pub fn is_active(&self) -> bool {
        !self.has_folded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_player_starts_with_no_cards_and_zero_bet() {
        let p = Player::new("p1", "Alice", 1000);
        assert_eq!(p.chips, 1000);
        assert_eq!(p.current_bet, 0);
        assert!(p.hole_cards.is_empty());
        assert!(p.is_active());
    }

    #[test]
    fn folded_player_is_not_active() {
        let mut p = Player::new("p1", "Alice", 1000);
        p.has_folded = true;
        assert!(!p.is_active());
    }
}
