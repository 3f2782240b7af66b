//! Bot strategies module
//!
//! Every tier answers the same question: what should `seat` do in `state`.
//! Local tiers are synchronous and cheap; the provider-backed tier is async
//! and falls back to the Medium heuristic.

mod easy_bot;
mod fallback;
mod hard_bot;
mod llm_bot;
mod medium_bot;

pub use easy_bot::*;
pub use fallback::*;
pub use hard_bot::*;
pub use llm_bot::*;
pub use medium_bot::*;

use serde::Serialize;

use crate::domain::services::{validate_pass, validate_play, MoveError};
use crate::domain::value_objects::{GameState, Pattern};

/// Bot strategy trait
pub trait BotStrategy: Send + Sync {
    /// Decide what `seat` does; the result is always legal for the state
    fn decide(&self, state: &GameState, seat: u8) -> Decision;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Outcome of a strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "pattern")]
pub enum Decision {
    Play(Pattern),
    Pass,
}

impl Decision {
    pub fn is_pass(&self) -> bool {
        matches!(self, Decision::Pass)
    }

    pub fn pattern(&self) -> Option<&Pattern> {
        match self {
            Decision::Play(pattern) => Some(pattern),
            Decision::Pass => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Decision::Play(pattern) => pattern.to_string(),
            Decision::Pass => "Pass".to_string(),
        }
    }
}

/// Check a decision against the rules without applying it
pub fn validate_decision(state: &GameState, seat: u8, decision: &Decision) -> Result<(), MoveError> {
    match decision {
        Decision::Play(pattern) => validate_play(state, seat, pattern.cards()).map(|_| ()),
        Decision::Pass => validate_pass(state, seat),
    }
}

/// Difficulty tier of a bot seat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    /// Backed by an external decision provider
    Llm,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Llm => "llm",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            "llm" => Some(Difficulty::Llm),
            _ => None,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local strategy variants dispatched by tier
pub enum StrategyKind {
    Easy(EasyBotStrategy),
    Medium(MediumBotStrategy),
    Hard(HardBotStrategy),
}

impl StrategyKind {
    /// Local strategy for a tier. The provider tier maps to Medium, which is
    /// what it falls back to when the provider cannot help.
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => StrategyKind::Easy(EasyBotStrategy::new()),
            Difficulty::Medium | Difficulty::Llm => StrategyKind::Medium(MediumBotStrategy::new()),
            Difficulty::Hard => StrategyKind::Hard(HardBotStrategy::new()),
        }
    }

    /// Same as `for_difficulty` but with a reproducible Easy tier
    pub fn seeded(difficulty: Difficulty, seed: u64) -> Self {
        match difficulty {
            Difficulty::Easy => StrategyKind::Easy(EasyBotStrategy::with_seed(seed)),
            other => Self::for_difficulty(other),
        }
    }

    /// Override the Hard tier's threat threshold; other tiers are unchanged
    pub fn with_threat_threshold(self, threshold: f64) -> Self {
        match self {
            StrategyKind::Hard(_) => StrategyKind::Hard(HardBotStrategy::with_threshold(threshold)),
            other => other,
        }
    }
}

impl BotStrategy for StrategyKind {
    fn decide(&self, state: &GameState, seat: u8) -> Decision {
        match self {
            StrategyKind::Easy(s) => s.decide(state, seat),
            StrategyKind::Medium(s) => s.decide(state, seat),
            StrategyKind::Hard(s) => s.decide(state, seat),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            StrategyKind::Easy(s) => s.name(),
            StrategyKind::Medium(s) => s.name(),
            StrategyKind::Hard(s) => s.name(),
        }
    }
}

/// Synchronous decision for `seat` at a difficulty tier
///
/// Easy is seeded from the state fingerprint, so the same position always
/// yields the same decision.
pub fn ai_decide(state: &GameState, seat: u8, difficulty: Difficulty) -> Decision {
    let strategy = StrategyKind::seeded(difficulty, state.fingerprint(seat));
    checked_decide(&strategy, state, seat)
}

/// Run `strategy` and re-check its answer, replacing anything that does not
/// hold up with the cheap fallback
pub fn checked_decide(strategy: &dyn BotStrategy, state: &GameState, seat: u8) -> Decision {
    let decision = strategy.decide(state, seat);
    match validate_decision(state, seat, &decision) {
        Ok(()) => decision,
        Err(e) => {
            tracing::warn!(
                seat,
                strategy = strategy.name(),
                error = %e,
                "Strategy produced an illegal decision, using fallback"
            );
            fallback_decision(state, seat)
        }
    }
}
