//! Easy bot strategy
//!
//! Random but valid plays, biased toward dumping low singles and pairs.

use std::sync::Mutex;

use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::medium_bot::breaks_bomb;
use super::{fallback_decision, BotStrategy, Decision};
use crate::domain::entities::SEAT_COUNT;
use crate::domain::services::{can_pass, legal_moves};
use crate::domain::value_objects::{GameState, Pattern, PatternKind};

/// Chance of passing when following even though a play exists
const FOLLOW_PASS_CHANCE: f64 = 0.7;

/// Easy difficulty bot strategy
pub struct EasyBotStrategy {
    rng: Mutex<ChaCha8Rng>,
}

impl EasyBotStrategy {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::from_entropy()),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    fn weight(pattern: &Pattern) -> f64 {
        let low = (18 - pattern.primary_rank().value()) as f64;
        match pattern.kind() {
            PatternKind::Single | PatternKind::Pair => low * 3.0,
            _ => low,
        }
    }
}

impl Default for EasyBotStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl BotStrategy for EasyBotStrategy {
    fn decide(&self, state: &GameState, seat: u8) -> Decision {
        if seat >= SEAT_COUNT {
            return Decision::Pass;
        }
        let moves = legal_moves(state, seat);
        if moves.is_empty() {
            return fallback_decision(state, seat);
        }
        let passable = can_pass(state, seat);
        let hand = state.get_hand(seat);

        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        if passable && rng.gen_bool(FOLLOW_PASS_CHANCE) {
            return Decision::Pass;
        }

        let safe: Vec<&Pattern> = moves
            .iter()
            .filter(|p| !p.is_bomb_like() && !breaks_bomb(hand, p))
            .collect();
        let pool: Vec<&Pattern> = if !safe.is_empty() {
            safe
        } else if passable {
            // Only bombs would answer; not worth it
            return Decision::Pass;
        } else {
            moves.iter().collect()
        };

        let weights: Vec<f64> = pool.iter().map(|p| Self::weight(p)).collect();
        let pick = match WeightedIndex::new(&weights) {
            Ok(dist) => dist.sample(&mut *rng),
            Err(_) => rng.gen_range(0..pool.len()),
        };
        Decision::Play(pool[pick].clone())
    }

    fn name(&self) -> &'static str {
        "easy"
    }
}
