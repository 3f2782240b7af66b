//! Take bot turn use case
//!
//! Decides for a bot seat outside the room lock, then applies the decision
//! under the lock. Local tiers run on the blocking pool, the provider tier
//! runs async; both are bounded by a timeout and degrade to the cheap
//! fallback, so a bot seat always moves.

use std::sync::Arc;

use tokio::time::timeout;
use tracing::{debug, error, warn};

use super::MatchRoom;
use crate::domain::services::{execute_pass, execute_play, MoveError};
use crate::domain::value_objects::{GameState, Phase};
use crate::infrastructure::app_state::AppState;
use crate::infrastructure::bot::strategies::{
    checked_decide, fallback_decision, validate_decision, Decision, DecisionOutcome,
    DecisionSource, Difficulty, ProviderError, StrategyKind,
};

/// Take bot turn input
pub struct TakeBotTurnInput {
    pub seat: u8,
}

/// Take bot turn output
#[derive(Debug)]
pub struct TakeBotTurnOutput {
    pub seat: u8,
    pub decision: Decision,
    pub source: DecisionSource,
    /// Provider failures recovered on the way
    pub failures: Vec<ProviderError>,
    pub finished: bool,
    pub next_turn: u8,
}

/// Take bot turn use case
pub struct TakeBotTurn {
    room: Arc<MatchRoom>,
    app: Arc<AppState>,
}

impl TakeBotTurn {
    pub fn new(room: Arc<MatchRoom>, app: Arc<AppState>) -> Self {
        Self { room, app }
    }

    pub async fn execute(&self, input: TakeBotTurnInput) -> Result<TakeBotTurnOutput, TakeBotTurnError> {
        let seat = input.seat;
        let difficulty = self
            .room
            .bot_difficulty(seat)
            .ok_or(TakeBotTurnError::NotABot(seat))?;

        let snapshot = {
            let state = self.room.lock().await;
            if state.phase != Phase::Playing {
                return Err(MoveError::GameNotInProgress(state.phase).into());
            }
            if state.current_turn != seat {
                return Err(MoveError::NotYourTurn {
                    expected: state.current_turn,
                    actual: seat,
                }
                .into());
            }
            state.clone()
        };

        let outcome = self.decide(snapshot, seat, difficulty).await;

        let mut state = self.room.lock().await;
        let DecisionOutcome {
            mut decision,
            mut source,
            failures,
        } = outcome;
        if let Err(e) = validate_decision(&state, seat, &decision) {
            // Only this seat may act, so this means the room moved under us
            warn!(seat, error = %e, "Bot decision went stale, using fallback");
            decision = fallback_decision(&state, seat);
            source = DecisionSource::Fallback;
        }

        match &decision {
            Decision::Play(pattern) => {
                execute_play(&mut state, seat, pattern.cards())?;
            }
            Decision::Pass => {
                execute_pass(&mut state, seat)?;
            }
        }
        debug!(
            game_id = %state.id,
            seat,
            difficulty = difficulty.as_str(),
            decision = %decision.describe(),
            "Bot moved"
        );

        Ok(TakeBotTurnOutput {
            seat,
            decision,
            source,
            failures,
            finished: state.is_finished(),
            next_turn: state.current_turn,
        })
    }

    async fn decide(&self, snapshot: GameState, seat: u8, difficulty: Difficulty) -> DecisionOutcome {
        let config = &self.app.config;

        if difficulty == Difficulty::Llm {
            let strategy = self.app.llm_strategy();
            let deadline = config.provider_deadline();
            return match timeout(deadline, strategy.decide_async(&snapshot, seat)).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(seat, ?deadline, "Provider decision timed out, using fallback");
                    DecisionOutcome {
                        decision: fallback_decision(&snapshot, seat),
                        source: DecisionSource::Fallback,
                        failures: vec![ProviderError::Timeout(deadline)],
                    }
                }
            };
        }

        let threshold = config.hard_threat_threshold;
        let worker_state = snapshot.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let strategy = StrategyKind::seeded(difficulty, worker_state.fingerprint(seat))
                .with_threat_threshold(threshold);
            checked_decide(&strategy, &worker_state, seat)
        });

        let decision = match timeout(config.ai_timeout, handle).await {
            Ok(Ok(decision)) => {
                return DecisionOutcome {
                    decision,
                    source: DecisionSource::Heuristic,
                    failures: Vec::new(),
                }
            }
            Ok(Err(e)) => {
                error!(seat, error = %e, "Bot worker failed, using fallback");
                fallback_decision(&snapshot, seat)
            }
            Err(_) => {
                warn!(seat, timeout = ?config.ai_timeout, "Bot decision timed out, using fallback");
                fallback_decision(&snapshot, seat)
            }
        };
        DecisionOutcome {
            decision,
            source: DecisionSource::Fallback,
            failures: Vec::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TakeBotTurnError {
    #[error("Seat {0} is not a bot")]
    NotABot(u8),
    #[error(transparent)]
    Move(#[from] MoveError),
}
