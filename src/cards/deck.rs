//! Deterministic deal: a 52-card deck with an injectable RNG.

use rand::seq::SliceRandom;
use rand::RngCore;

use super::card::{Card, Rank, Suit};

const LOG_TARGET: &str = "poker_core::cards::deck";

/// A permutation of 52 unique cards. `deal` removes from the front so the
/// deck models a physical stack: the next card dealt is always `cards[0]`.
#[derive(Clone, Debug, Default)]
pub struct Deck {
    cards: Vec<Card>,
}

/// `deal` on an empty deck has nothing to hand back.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("deck is empty")]
pub struct DeckEmpty;

impl Deck {
    /// An empty deck; call [`Deck::reset`] before dealing from it.
    pub fn new() -> Self {
        Self { cards: Vec::new() }
    }

    /// Re-fills with all 52 unique cards in a fixed suit/rank order.
    /// Does not shuffle — callers shuffle explicitly so tests can separate
    /// "is the deck complete" from "is the deck randomized".
    pub fn reset(&mut self) {
        self.cards.clear();
        self.cards.reserve(52);
        for suit in Suit::ALL {
            for rank in Rank::ALL {
                self.cards.push(Card::new(rank, suit));
            }
        }
    }

    /// Fisher–Yates permutation via an injected RNG, so tests can seed a
    /// deterministic shuffle instead of depending on system entropy.
    pub fn shuffle<R: RngCore>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
        tracing::debug!(target: LOG_TARGET, remaining = self.cards.len(), "deck shuffled");
    }

    /// Removes and returns the front card, or `DeckEmpty` if none remain.
    pub fn deal(&mut self) -> Result<Card, DeckEmpty> {
        if self.cards.is_empty() {
            return Err(DeckEmpty);
        }
        Ok(self.cards.remove(0))
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn reset_produces_fifty_two_unique_cards() {
        let mut deck = Deck::new();
        deck.reset();
        assert_eq!(deck.remaining(), 52);
        let unique: HashSet<Card> = deck.cards.iter().copied().collect();
        assert_eq!(unique.len(), 52);
    }

    #[test]
    fn deal_removes_from_front_until_empty() {
        let mut deck = Deck::new();
        deck.reset();
        let mut dealt = Vec::new();
        while let Ok(card) = deck.deal() {
            dealt.push(card);
        }
        assert_eq!(dealt.len(), 52);
        assert_eq!(deck.deal(), Err(DeckEmpty));
    }

    #[test]
    fn shuffle_with_same_seed_is_deterministic() {
        let mut deck_a = Deck::new();
        deck_a.reset();
        let mut rng_a = StdRng::seed_from_u64(7);
        deck_a.shuffle(&mut rng_a);

        let mut deck_b = Deck::new();
        deck_b.reset();
        let mut rng_b = StdRng::seed_from_u64(7);
        deck_b.shuffle(&mut rng_b);

        assert_eq!(deck_a.cards, deck_b.cards);
    }

    #[test]
    fn shuffle_preserves_card_set() {
        let mut deck = Deck::new();
        deck.reset();
        let before: HashSet<Card> = deck.cards.iter().copied().collect();
        let mut rng = StdRng::seed_from_u64(42);
        deck.shuffle(&mut rng);
        let after: HashSet<Card> = deck.cards.iter().copied().collect();
        assert_eq!(before, after);
    }
}
