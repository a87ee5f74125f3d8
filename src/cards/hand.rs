//! Best-hand classification over 5-from-7 card sets.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::card::{Card, Rank};

/// Ordered hand categories. Declaration order doubles as the comparison
/// order via `#[derive(PartialOrd, Ord)]`, matching HighCard < ... <
/// RoyalFlush from the spec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HandRank {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
    RoyalFlush,
}

/// The best 5-card hand found for a player, plus enough context to compare
/// it against other players' hands at showdown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    pub cards: Vec<Card>,
    pub rank: HandRank,
    pub tie_breakers: Vec<Rank>,
    pub player_id: String,
}

impl Hand {
    /// The `(rank, tie_breakers)` key this spec defines comparison over.
    fn score(&self) -> (HandRank, &[Rank]) {
        (self.rank, &self.tie_breakers)
    }
}

impl PartialOrd for Hand {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Hand {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.score().cmp(&other.score())
    }
}

/// Picks the best 5-card combination from `hole ∪ community` (2–7 cards)
/// and labels it with `player_id`. In normal play this is always called
/// with 7 cards (2 hole + 5 community) at showdown; fewer than 5 available
/// cards is handled without panicking by classifying whatever is present,
/// since nothing in the hole/community protocol should ever reach that
/// path in a completed hand.
pub fn evaluate_best_hand(hole: &[Card], community: &[Card], player_id: impl Into<String>) -> Hand {
    let player_id = player_id.into();
    let mut all: Vec<Card> = Vec::with_capacity(hole.len() + community.len());
    all.extend_from_slice(hole);
    all.extend_from_slice(community);

    if all.len() < 5 {
        let (rank, tie_breakers) = classify(&all);
        return Hand {
            cards: all,
            rank,
            tie_breakers,
            player_id,
        };
    }

    let mut best: Option<(HandRank, Vec<Rank>, Vec<Card>)> = None;
    for combo in combinations(all.len(), 5) {
        let cards: Vec<Card> = combo.iter().map(|&i| all[i]).collect();
        let (rank, tie_breakers) = classify(&cards);
        let better = match &best {
            None => true,
            Some((best_rank, best_tb, _)) => (rank, &tie_breakers) > (*best_rank, best_tb),
        };
        if better {
            best = Some((rank, tie_breakers, cards));
        }
    }

    let (rank, tie_breakers, cards) = best.expect("at least one 5-card combination exists");
    Hand {
        cards,
        rank,
        tie_breakers,
        player_id,
    }
}

/// Every hand tied with the maximum — callers must be prepared to split.
/// Ties are compared by `(rank, tie_breakers)`, not by `Hand`'s derived
/// `PartialEq` (which also compares `player_id`/`cards` and so would never
/// consider two different players' hands equal).
pub fn determine_winners(hands: &[Hand]) -> Vec<&Hand> {
    let Some(best) = hands.iter().max() else {
        return Vec::new();
    };
    hands.iter().filter(|h| h.cmp(best) == std::cmp::Ordering::Equal).collect()
}

/// Classifies a hand of up to 5 cards, returning `(rank, tie_breakers)`.
fn classify(cards: &[Card]) -> (HandRank, Vec<Rank>) {
    let mut ranks_desc: Vec<Rank> = cards.iter().map(|c| c.rank).collect();
    ranks_desc.sort_by(|a, b| b.cmp(a));

    if cards.len() < 5 {
        return (HandRank::HighCard, ranks_desc);
    }

    let is_flush = cards.iter().all(|c| c.suit == cards[0].suit);
    let straight_high = straight_high_card(&ranks_desc);

    if is_flush {
        if let Some(high) = straight_high {
            return if high == Rank::ACE {
                (HandRank::RoyalFlush, vec![high])
            } else {
                (HandRank::StraightFlush, vec![high])
            };
        }
    }

    let mut counts: HashMap<Rank, u8> = HashMap::new();
    for r in &ranks_desc {
        *counts.entry(*r).or_insert(0) += 1;
    }
    let mut groups: Vec<(u8, Rank)> = counts.into_iter().map(|(r, c)| (c, r)).collect();
    groups.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));

    match groups.as_slice() {
        [(4, quad), (1, kicker)] => (HandRank::FourOfAKind, vec![*quad, *kicker]),
        [(3, triple), (2, pair)] => (HandRank::FullHouse, vec![*triple, *pair]),
        _ if is_flush => (HandRank::Flush, ranks_desc),
        _ if straight_high.is_some() => (HandRank::Straight, vec![straight_high.unwrap()]),
        [(3, triple), (1, k1), (1, k2)] => (HandRank::ThreeOfAKind, vec![*triple, *k1, *k2]),
        [(2, hi), (2, lo), (1, kicker)] => (HandRank::TwoPair, vec![*hi, *lo, *kicker]),
        [(2, pair), (1, k1), (1, k2), (1, k3)] => (HandRank::OnePair, vec![*pair, *k1, *k2, *k3]),
        _ => (HandRank::HighCard, ranks_desc),
    }
}

/// `A-2-3-4-5` is a straight with high card 5 (the wheel); `10-J-Q-K-A`
/// has high card 14. Anything else non-consecutive is not a straight.
fn straight_high_card(ranks_desc: &[Rank]) -> Option<Rank> {
    let mut uniq: Vec<u8> = ranks_desc.iter().map(|r| r.0).collect();
    uniq.sort_unstable();
    uniq.dedup();
    if uniq.len() != 5 {
        return None;
    }
    if uniq.windows(2).all(|w| w[1] == w[0] + 1) {
        return Some(Rank(*uniq.last().expect("checked len == 5")));
    }
    if uniq == [2, 3, 4, 5, 14] {
        return Some(Rank(5));
    }
    None
}

/// All `k`-element index subsets of `0..n`, smallest-first.
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut result = Vec::new();
    let mut current = Vec::with_capacity(k);
    combinations_rec(0, n, k, &mut current, &mut result);
    result
}

fn combinations_rec(
    start: usize,
    n: usize,
    k: usize,
    current: &mut Vec<usize>,
    result: &mut Vec<Vec<usize>>,
) {
    if current.len() == k {
        result.push(current.clone());
        return;
    }
    for i in start..n {
        current.push(i);
        combinations_rec(i + 1, n, k, current, result);
        current.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::card::Suit;

    fn c(rank: u8, suit: Suit) -> Card {
        Card::new(Rank(rank), suit)
    }

    #[test]
    fn wheel_straight_ranks_high_card_five() {
        let cards = [
            c(14, Suit::Clubs),
            c(2, Suit::Diamonds),
            c(3, Suit::Hearts),
            c(4, Suit::Spades),
            c(5, Suit::Clubs),
        ];
        let (rank, tb) = classify(&cards);
        assert_eq!(rank, HandRank::Straight);
        assert_eq!(tb, vec![Rank(5)]);
    }

    #[test]
    fn broadway_straight_ranks_high_card_fourteen() {
        let cards = [
            c(10, Suit::Clubs),
            c(11, Suit::Diamonds),
            c(12, Suit::Hearts),
            c(13, Suit::Spades),
            c(14, Suit::Clubs),
        ];
        let (rank, tb) = classify(&cards);
        assert_eq!(rank, HandRank::Straight);
        assert_eq!(tb, vec![Rank(14)]);
    }

    #[test]
    fn wheel_straight_flush_beats_plain_straight() {
        // player holds A-C 2-C; board 3-C 4-C 5-C K-D K-S
        let hole = [c(14, Suit::Clubs), c(2, Suit::Clubs)];
        let community = [
            c(3, Suit::Clubs),
            c(4, Suit::Clubs),
            c(5, Suit::Clubs),
            c(13, Suit::Diamonds),
            c(13, Suit::Spades),
        ];
        let hand = evaluate_best_hand(&hole, &community, "p1");
        assert_eq!(hand.rank, HandRank::StraightFlush);
        assert_eq!(hand.tie_breakers, vec![Rank(5)]);
    }

    #[test]
    fn royal_flush_detected() {
        let cards = [
            c(10, Suit::Hearts),
            c(11, Suit::Hearts),
            c(12, Suit::Hearts),
            c(13, Suit::Hearts),
            c(14, Suit::Hearts),
        ];
        let (rank, tb) = classify(&cards);
        assert_eq!(rank, HandRank::RoyalFlush);
        assert_eq!(tb, vec![Rank(14)]);
    }

    #[test]
    fn four_of_a_kind_orders_quad_then_kicker() {
        let cards = [
            c(9, Suit::Clubs),
            c(9, Suit::Diamonds),
            c(9, Suit::Hearts),
            c(9, Suit::Spades),
            c(2, Suit::Clubs),
        ];
        let (rank, tb) = classify(&cards);
        assert_eq!(rank, HandRank::FourOfAKind);
        assert_eq!(tb, vec![Rank(9), Rank(2)]);
    }

    #[test]
    fn two_pair_orders_high_pair_first() {
        let cards = [
            c(5, Suit::Clubs),
            c(5, Suit::Diamonds),
            c(9, Suit::Hearts),
            c(9, Suit::Spades),
            c(2, Suit::Clubs),
        ];
        let (rank, tb) = classify(&cards);
        assert_eq!(rank, HandRank::TwoPair);
        assert_eq!(tb, vec![Rank(9), Rank(5), Rank(2)]);
    }

    #[test]
    fn best_hand_is_monotone_when_cards_are_added() {
        let hole = [c(10, Suit::Hearts), c(10, Suit::Clubs)];
        let community_partial = [c(2, Suit::Diamonds), c(5, Suit::Spades), c(9, Suit::Hearts)];
        let before = evaluate_best_hand(&hole, &community_partial, "p1");

        let community_full = [
            c(2, Suit::Diamonds),
            c(5, Suit::Spades),
            c(9, Suit::Hearts),
            c(10, Suit::Diamonds),
            c(10, Suit::Spades),
        ];
        let after = evaluate_best_hand(&hole, &community_full, "p1");
        assert!(after >= before);
        assert_eq!(after.rank, HandRank::FourOfAKind);
    }

    #[test]
    fn determine_winners_splits_ties() {
        let hole_a = [c(9, Suit::Clubs), c(8, Suit::Clubs)];
        let hole_b = [c(9, Suit::Diamonds), c(8, Suit::Diamonds)];
        let community = [
            c(2, Suit::Hearts),
            c(3, Suit::Spades),
            c(4, Suit::Clubs),
            c(5, Suit::Hearts),
            c(6, Suit::Spades),
        ];
        let hand_a = evaluate_best_hand(&hole_a, &community, "a");
        let hand_b = evaluate_best_hand(&hole_b, &community, "b");
        let winners = determine_winners(&[hand_a, hand_b]);
        assert_eq!(winners.len(), 2);
    }
}
