//! Hard bot strategy
//!
//! Medium's hand-structure ranking plus card counting. Cards already played
//! are subtracted from the deck to estimate what the opponents can still
//! hold, and that estimate decides whether letting a trick go is safe.

use super::medium_bot::{
    best_candidate, min_opponent_cards, score_candidates, should_hold, winning_play, Candidate,
};
use super::{fallback_decision, BotStrategy, Decision};
use crate::domain::entities::{RankCounts, SEAT_COUNT};
use crate::domain::services::{can_pass, evaluate, legal_moves};
use crate::domain::value_objects::{GameState, Pattern, PatternKind};

/// Threat above which Hard refuses to pass
pub const DEFAULT_THREAT_THRESHOLD: f64 = 0.5;

/// Opponent hand size at or below which Hard leads for control
const CONTROL_HAND_SIZE: usize = 3;

/// How dangerous a hand of `cards` cards is once it gets the lead
fn closeness(cards: usize) -> f64 {
    match cards {
        0 | 1 => 0.9,
        2 => 0.7,
        3 => 0.5,
        4 => 0.3,
        _ => 0.05,
    }
}

/// Cards of one rank needed to answer `kind` with the same shape
fn width(kind: PatternKind) -> u8 {
    match kind {
        PatternKind::Single | PatternKind::Straight => 1,
        PatternKind::Pair | PatternKind::ConsecutivePairs => 2,
        PatternKind::Bomb | PatternKind::FourWithTwo => 4,
        _ => 3,
    }
}

/// Rough chance that an opponent holding `hand_size` of the `unseen` cards
/// can beat `table`
pub fn beat_probability(unseen: &RankCounts, table: &Pattern, hand_size: usize) -> f64 {
    let total = unseen.total();
    if total == 0 || hand_size == 0 || table.kind() == PatternKind::Rocket {
        return 0.0;
    }
    let share = (hand_size as f64 / total as f64).min(1.0);

    let mut ordinary = 0.0;
    if table.kind() != PatternKind::Bomb && hand_size >= table.card_count() {
        let need = width(table.kind());
        let supporting: usize = unseen
            .present()
            .filter(|&(rank, count)| {
                rank > table.primary_rank()
                    && count >= need
                    && (!table.kind().is_run() || rank.is_run_rank())
            })
            .map(|(_, count)| count as usize)
            .sum();
        let hit = 1.0 - (1.0 - supporting as f64 / total as f64).powi(hand_size as i32);
        ordinary = hit.powi(need as i32);
        if table.kind().is_run() {
            ordinary *= 0.5;
        }
    }

    let mut bombs = 0.0;
    if hand_size >= 4 {
        let floor = match table.kind() {
            PatternKind::Bomb => Some(table.primary_rank()),
            _ => None,
        };
        let quads = unseen
            .present()
            .filter(|&(rank, count)| count == 4 && floor.map_or(true, |f| rank > f))
            .count();
        bombs += quads as f64 * share.powi(4);
    }
    if hand_size >= 2 && unseen.has_rocket() {
        bombs += share.powi(2);
    }

    (ordinary + bombs).min(1.0)
}

/// Chance that passing now hands the match to an opponent
///
/// Each opponent contributes how close it is to going out times the chance
/// it ends up leading: certain if it already owns the table, otherwise its
/// estimated chance of beating the table.
pub fn threat_of_passing(state: &GameState, seat: u8) -> f64 {
    let Some(table) = state.table_pattern() else {
        return 0.0;
    };
    let unseen = state.unseen_rank_counts(seat);
    state
        .opponents(seat)
        .iter()
        .map(|&opponent| {
            let size = state.get_hand(opponent).len();
            let lead_chance = if state.table_owner() == Some(opponent) {
                1.0
            } else {
                beat_probability(&unseen, table, size)
            };
            closeness(size) * lead_chance
        })
        .fold(0.0, f64::max)
}

/// Lead a shape the short-handed opponent cannot answer by size, else the
/// strongest ordinary play
fn control_lead(candidates: &[Candidate], min_opponent: usize) -> Option<&Candidate> {
    let ordinary = candidates.iter().filter(|c| !c.uses_bomb);
    ordinary
        .clone()
        .filter(|c| c.pattern.card_count() > min_opponent)
        .min_by_key(|c| c.key(min_opponent))
        .or_else(|| ordinary.max_by_key(|c| (c.pattern.primary_rank(), c.pattern.card_count())))
}

/// Hard difficulty bot strategy
pub struct HardBotStrategy {
    threshold: f64,
}

impl HardBotStrategy {
    pub fn new() -> Self {
        Self {
            threshold: DEFAULT_THREAT_THRESHOLD,
        }
    }

    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Default for HardBotStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl BotStrategy for HardBotStrategy {
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

        if !can_pass(state, seat) {
            let lead = if min_opp <= CONTROL_HAND_SIZE {
                control_lead(&candidates, min_opp).or_else(|| best_candidate(&candidates, min_opp))
            } else {
                best_candidate(&candidates, min_opp)
            };
            return match lead {
                Some(c) => Decision::Play(c.pattern.clone()),
                None => fallback_decision(state, seat),
            };
        }

        if let Some(owner) = state.table_owner() {
            if state.are_teammates(seat, owner) {
                return Decision::Pass;
            }
        }

        let Some(best) = best_candidate(&candidates, min_opp) else {
            return Decision::Pass;
        };
        let threat = threat_of_passing(state, seat);
        if threat > self.threshold {
            tracing::debug!(seat, threat, play = %best.pattern, "Threat too high to pass");
            return Decision::Play(best.pattern.clone());
        }
        if should_hold(best, &evaluate(hand), min_opp) {
            Decision::Pass
        } else {
            Decision::Play(best.pattern.clone())
        }
    }

    fn name(&self) -> &'static str {
        "hard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Card, Rank, Suit};
    use crate::domain::services::{apply_play, classify, start_with_hands};
    use crate::infrastructure::bot::strategies::MediumBotStrategy;

    fn c(rank: Rank, suit: Suit) -> Card {
        Card::new(rank, suit).unwrap()
    }

    #[test]
    fn test_plays_when_landlord_is_close() {
        let state = start_with_hands(
            [
                vec![
                    c(Rank::Ten, Suit::Spades),
                    c(Rank::Ace, Suit::Spades),
                    c(Rank::Two, Suit::Spades),
                ],
                vec![
                    c(Rank::King, Suit::Spades),
                    c(Rank::King, Suit::Hearts),
                    c(Rank::Five, Suit::Spades),
                    c(Rank::Six, Suit::Hearts),
                ],
                vec![c(Rank::Three, Suit::Clubs), c(Rank::Four, Suit::Clubs)],
            ],
            0,
        )
        .unwrap();
        let state = apply_play(&state, 0, &[c(Rank::Ten, Suit::Spades)]).unwrap();

        assert_eq!(MediumBotStrategy::new().decide(&state, 1), Decision::Pass);
        assert!(threat_of_passing(&state, 1) > DEFAULT_THREAT_THRESHOLD);
        let decision = HardBotStrategy::new().decide(&state, 1);
        assert_eq!(decision.pattern().map(|p| p.primary_rank()), Some(Rank::King));
    }

    #[test]
    fn test_lets_teammate_trick_run() {
        let state = start_with_hands(
            [
                (3..=11)
                    .filter_map(Rank::from_value)
                    .map(|r| c(r, Suit::Spades))
                    .filter(|card| card.rank != Rank::Seven)
                    .collect(),
                vec![c(Rank::Seven, Suit::Hearts), c(Rank::Queen, Suit::Hearts)],
                vec![
                    c(Rank::King, Suit::Clubs),
                    c(Rank::Ace, Suit::Clubs),
                    c(Rank::Five, Suit::Clubs),
                ],
            ],
            0,
        )
        .unwrap();
        let state = apply_play(&state, 0, &[c(Rank::Three, Suit::Spades)]).unwrap();
        let state = apply_play(&state, 1, &[c(Rank::Seven, Suit::Hearts)]).unwrap();
        assert_eq!(HardBotStrategy::new().decide(&state, 2), Decision::Pass);
    }

    #[test]
    fn test_control_lead_against_short_hands() {
        let state = start_with_hands(
            [
                vec![
                    c(Rank::Three, Suit::Spades),
                    c(Rank::Nine, Suit::Spades),
                    c(Rank::Nine, Suit::Hearts),
                    c(Rank::Queen, Suit::Spades),
                ],
                vec![c(Rank::Ten, Suit::Clubs), c(Rank::Jack, Suit::Clubs)],
                vec![c(Rank::Ten, Suit::Hearts), c(Rank::Jack, Suit::Hearts)],
            ],
            0,
        )
        .unwrap();
        let medium = MediumBotStrategy::new().decide(&state, 0);
        assert_eq!(medium.pattern().map(|p| p.kind()), Some(PatternKind::Pair));
        let hard = HardBotStrategy::new().decide(&state, 0);
        assert_eq!(hard.pattern().map(|p| p.primary_rank()), Some(Rank::Queen));
    }

    #[test]
    fn test_beat_probability_grows_with_hand_size() {
        let table = classify(&[c(Rank::Ten, Suit::Spades)]).unwrap();
        let unseen = RankCounts::from_cards(
            [
                c(Rank::Three, Suit::Hearts),
                c(Rank::Four, Suit::Hearts),
                c(Rank::Five, Suit::Hearts),
                c(Rank::King, Suit::Hearts),
                c(Rank::Six, Suit::Hearts),
                c(Rank::Seven, Suit::Hearts),
            ]
            .iter(),
        );
        let small = beat_probability(&unseen, &table, 1);
        let large = beat_probability(&unseen, &table, 3);
        assert!(small > 0.0);
        assert!(large > small);
        assert!(large <= 1.0);

        let mut none = unseen;
        none.set(Rank::King, 0);
        assert_eq!(beat_probability(&none, &table, 3), 0.0);
    }

    #[test]
    fn test_nothing_answers_rocket() {
        let rocket = classify(&[Card::small_joker(), Card::big_joker()]).unwrap();
        let unseen = RankCounts::from_cards(Suit::ALL.map(|s| c(Rank::Five, s)).iter());
        assert_eq!(beat_probability(&unseen, &rocket, 10), 0.0);
    }
}
