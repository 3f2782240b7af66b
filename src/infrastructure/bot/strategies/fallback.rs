//! Cheap deterministic fallback used when a decision cannot be produced in time

use std::cmp::Reverse;

use crate::domain::entities::Rank;
use crate::domain::services::{can_pass, legal_moves};
use crate::domain::value_objects::{GameState, Pattern, PatternKind};

use super::Decision;

/// Order key: ordinary shapes before bombs, then lowest rank, then the play
/// shedding the most cards with the smallest kickers
fn weakness_key(pattern: &Pattern) -> (bool, Rank, Reverse<usize>, u32, PatternKind) {
    (
        pattern.is_bomb_like(),
        pattern.primary_rank(),
        Reverse(pattern.card_count()),
        pattern.rank_sum(),
        pattern.kind(),
    )
}

/// Weakest legal play for `seat`, if any
pub fn weakest_play(state: &GameState, seat: u8) -> Option<Pattern> {
    legal_moves(state, seat)
        .into_iter()
        .min_by_key(weakness_key)
}

/// Pass if legal, otherwise the weakest legal play
pub fn fallback_decision(state: &GameState, seat: u8) -> Decision {
    if can_pass(state, seat) {
        return Decision::Pass;
    }
    weakest_play(state, seat)
        .map(Decision::Play)
        .unwrap_or(Decision::Pass)
}
