//! Medium bot strategy
//!
//! Picks the play that leaves the best-structured hand, measured by the
//! analyzer's greedy move count. Bombs are kept back unless an opponent is
//! close enough to going out that spending one is worth it.

use std::cmp::Reverse;

use super::{fallback_decision, BotStrategy, Decision};
use crate::domain::entities::{Hand, Rank, SEAT_COUNT};
use crate::domain::services::{can_pass, evaluate, legal_moves, HandScore};
use crate::domain::value_objects::{GameState, Pattern};

/// A legal play together with what the hand looks like afterwards
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub pattern: Pattern,
    pub after: HandScore,
    /// Spends a bomb or the rocket, or splits one up
    pub uses_bomb: bool,
}

impl Candidate {
    fn new(hand: &Hand, pattern: Pattern) -> Self {
        let after = evaluate(&hand.without(pattern.cards()));
        let uses_bomb = pattern.is_bomb_like() || breaks_bomb(hand, &pattern);
        Self {
            pattern,
            after,
            uses_bomb,
        }
    }

    /// Endgame kill: an opponent holds no more cards than the play's unit
    /// length, so spending a bomb on it is justified
    pub fn is_kill(&self, min_opponent_cards: usize) -> bool {
        min_opponent_cards <= self.pattern.length() as usize
    }

    /// Ranking key, smaller is better
    pub(crate) fn key(&self, min_opponent_cards: usize) -> (u8, u8, Reverse<usize>, u8, Rank) {
        let bomb_rank = match (self.uses_bomb, self.is_kill(min_opponent_cards)) {
            (true, true) => 0,
            (false, _) => 1,
            (true, false) => 2,
        };
        (
            self.after.min_moves,
            bomb_rank,
            Reverse(self.pattern.card_count()),
            self.after.isolated_singles,
            self.pattern.primary_rank(),
        )
    }
}

/// Whether `pattern` takes cards from a quad or splits the rocket without
/// being that bomb itself
pub(crate) fn breaks_bomb(hand: &Hand, pattern: &Pattern) -> bool {
    if pattern.is_bomb_like() {
        return false;
    }
    let counts = hand.rank_counts();
    pattern.cards().iter().any(|card| {
        counts.get(card.rank) == 4 || (card.rank.is_joker() && counts.has_rocket())
    })
}

pub(crate) fn score_candidates(hand: &Hand, moves: Vec<Pattern>) -> Vec<Candidate> {
    moves.into_iter().map(|p| Candidate::new(hand, p)).collect()
}

/// Best candidate by the Medium ordering
pub(crate) fn best_candidate(candidates: &[Candidate], min_opponent_cards: usize) -> Option<&Candidate> {
    candidates.iter().min_by_key(|c| c.key(min_opponent_cards))
}

/// Smallest hand among the seats playing against `seat`
pub(crate) fn min_opponent_cards(state: &GameState, seat: u8) -> usize {
    state
        .opponents(seat)
        .iter()
        .map(|&o| state.get_hand(o).len())
        .min()
        .unwrap_or(usize::MAX)
}

/// A play that empties the hand
pub(crate) fn winning_play(hand: &Hand, moves: &[Pattern]) -> Option<Pattern> {
    moves.iter().find(|p| p.card_count() == hand.len()).cloned()
}

/// Whether following with `best` costs more than it gains
pub(crate) fn should_hold(best: &Candidate, before: &HandScore, min_opponent_cards: usize) -> bool {
    if best.is_kill(min_opponent_cards) {
        return false;
    }
    best.uses_bomb || best.after.min_moves >= before.min_moves
}

/// Medium difficulty bot strategy
pub struct MediumBotStrategy;

impl MediumBotStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MediumBotStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl BotStrategy for MediumBotStrategy {
    fn decide(&self, state: &GameState, seat: u8) -> Decision {
        if seat >= SEAT_COUNT {
            return Decision::Pass;
        }
        let hand = state.get_hand(seat);
        let moves = legal_moves(state, seat);
        if moves.is_empty() {
            return fallback_decision(state, seat);
        }
        if let Some(win) = winning_play(hand, &moves) {
            return Decision::Play(win);
        }

        let min_opp = min_opponent_cards(state, seat);
        let candidates = score_candidates(hand, moves);
        let Some(best) = best_candidate(&candidates, min_opp) else {
            return fallback_decision(state, seat);
        };

        if can_pass(state, seat) && should_hold(best, &evaluate(hand), min_opp) {
            return Decision::Pass;
        }
        Decision::Play(best.pattern.clone())
    }

    fn name(&self) -> &'static str {
        "medium"
    }
}
