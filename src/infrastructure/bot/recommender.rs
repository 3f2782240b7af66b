//! Play recommender
//!
//! Ranked hints for a human seat: each legal play (and Pass when following)
//! with a short reason and a risk label.

use std::fmt;

use serde::Serialize;

use super::strategies::{breaks_bomb, min_opponent_cards, Decision};
use crate::domain::entities::{Hand, Rank, SEAT_COUNT};
use crate::domain::services::{evaluate, legal_moves, HandScore};
use crate::domain::value_objects::{GameState, Pattern, PatternKind, Phase};

/// Opponent hand size at which control plays become attractive
const CLOSING_HAND_SIZE: usize = 5;

/// Priority given to a play that empties the hand
const WINNING_PRIORITY: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RiskLevel {
    Safe,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub decision: Decision,
    pub reason: String,
    pub priority: f32,
    pub risk: RiskLevel,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (risk: {})",
            self.decision.describe(),
            self.reason,
            self.risk.as_str()
        )
    }
}

struct Context<'a> {
    hand: &'a Hand,
    before: HandScore,
    min_opponent: usize,
    teammate_leads: bool,
}

fn lead_hint(ctx: &Context<'_>, pattern: &Pattern) -> (f32, String, RiskLevel) {
    let after = evaluate(&ctx.hand.without(pattern.cards()));
    let progress = ctx.before.min_moves as f32 - after.min_moves as f32;
    let mut priority = 5.0 + progress;

    let (reason, risk) = if pattern.is_bomb_like() {
        if ctx.min_opponent <= CLOSING_HAND_SIZE {
            priority += 3.0;
            ("Opponent is close to going out; take control".to_string(), RiskLevel::High)
        } else {
            priority -= 3.0;
            ("Spends a bomb with no pressure on the table".to_string(), RiskLevel::High)
        }
    } else if pattern.kind().is_run() {
        priority += 2.0;
        (
            format!("Sheds {} cards in one play", pattern.card_count()),
            RiskLevel::Low,
        )
    } else if pattern.card_count() >= 4 {
        priority += 1.5;
        ("Uses kickers efficiently".to_string(), RiskLevel::Low)
    } else if ctx.min_opponent <= CLOSING_HAND_SIZE && pattern.primary_rank() >= Rank::Queen {
        priority += 1.5;
        (
            format!("High {} keeps the lead", pattern.kind()),
            RiskLevel::Medium,
        )
    } else if pattern.primary_rank() <= Rank::Ten {
        priority += 1.0;
        (
            format!("Test the table with a low {}", pattern.kind()),
            RiskLevel::Low,
        )
    } else {
        (format!("Leads {}", pattern.describe()), RiskLevel::Medium)
    };

    if breaks_bomb(ctx.hand, pattern) {
        priority -= 2.0;
    }
    (priority, reason, risk)
}

fn follow_hint(ctx: &Context<'_>, pattern: &Pattern) -> (f32, String, RiskLevel) {
    let mut priority = 5.0;
    let average = pattern.rank_sum() as f32 / pattern.card_count() as f32;
    let (mut reason, mut risk) = if average <= 8.0 {
        priority += 2.0;
        ("Answers with low cards and keeps the big ones".to_string(), RiskLevel::Low)
    } else if average >= 13.0 {
        priority -= 1.0;
        ("Needs high cards; weigh whether the trick is worth it".to_string(), RiskLevel::High)
    } else {
        ("Can follow".to_string(), RiskLevel::Medium)
    };

    match pattern.kind() {
        PatternKind::Bomb => {
            priority += if ctx.min_opponent <= CLOSING_HAND_SIZE { 3.0 } else { -1.0 };
            reason = "Bomb wins the lead".to_string();
            risk = RiskLevel::High;
        }
        PatternKind::Rocket => {
            priority += if ctx.min_opponent <= CLOSING_HAND_SIZE { 4.0 } else { -1.0 };
            reason = "Rocket cannot be beaten".to_string();
            risk = RiskLevel::High;
        }
        _ => {}
    }
    if breaks_bomb(ctx.hand, pattern) {
        priority -= 2.0;
        reason.push_str(", but breaks up a bomb");
    }
    if ctx.hand.len() - pattern.card_count() <= 3 {
        priority += 1.5;
        reason.push_str(", close to going out");
    }
    if ctx.teammate_leads {
        priority -= 3.0;
        reason = "Teammate already holds the trick".to_string();
    }
    (priority, reason, risk)
}

fn pass_hint(ctx: &Context<'_>, table: &Pattern, can_follow: bool) -> (f32, String) {
    if !can_follow {
        return (5.0, "Nothing in hand beats the table".to_string());
    }
    if ctx.teammate_leads {
        return (7.0, "Let the teammate keep the trick".to_string());
    }
    if table.is_bomb_like() {
        (6.0, "Opponent bombed; wait for the next trick".to_string())
    } else if table.primary_rank() >= Rank::Ace {
        (5.5, "Table is strong; wait for a better chance".to_string())
    } else {
        (4.0, "Keep the hand intact for now".to_string())
    }
}

/// Up to `limit` hints for `seat`, best first
///
/// Works for any seat during play, not only the one to act, so a client can
/// show hints while waiting.
pub fn recommend(state: &GameState, seat: u8, limit: usize) -> Vec<Recommendation> {
    if state.phase != Phase::Playing || seat >= SEAT_COUNT {
        return Vec::new();
    }
    let hand = state.get_hand(seat);
    let table = state.table_pattern();
    let ctx = Context {
        hand,
        before: evaluate(hand),
        min_opponent: min_opponent_cards(state, seat),
        teammate_leads: state
            .table_owner()
            .map_or(false, |owner| state.are_teammates(seat, owner)),
    };

    let moves = legal_moves(state, seat);
    let mut hints: Vec<Recommendation> = moves
        .iter()
        .map(|pattern| {
            let (priority, reason, risk) = if pattern.card_count() == hand.len() {
                (WINNING_PRIORITY, "Empties the hand".to_string(), RiskLevel::Safe)
            } else if table.is_some() {
                follow_hint(&ctx, pattern)
            } else {
                lead_hint(&ctx, pattern)
            };
            Recommendation {
                decision: Decision::Play(pattern.clone()),
                reason,
                priority,
                risk,
            }
        })
        .collect();

    if let Some(table) = table {
        let (priority, reason) = pass_hint(&ctx, table, !moves.is_empty());
        hints.push(Recommendation {
            decision: Decision::Pass,
            reason,
            priority,
            risk: RiskLevel::Safe,
        });
    }

    hints.sort_by(|a, b| b.priority.total_cmp(&a.priority));
    hints.truncate(limit);
    hints
}
