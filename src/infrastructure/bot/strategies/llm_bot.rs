//! LLM Bot Strategy
//!
//! Asks an external provider for a move, checks the answer against the
//! rules and, when it is illegal, asks again with a message naming the rule
//! that was broken. After a bounded number of attempts the Medium heuristic
//! decides instead. Provider trouble never reaches the match: it is logged
//! and reported in the outcome's `failures`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::{validate_decision, BotStrategy, Decision, MediumBotStrategy};
use crate::domain::entities::{cards_to_string, Card, Rank, SEAT_COUNT};
use crate::domain::services::{
    can_pass, legal_moves, validate_pass, validate_play, ClassificationError, MoveError,
};
use crate::domain::value_objects::{GameState, Pattern};
use crate::infrastructure::bot::decision_cache::DecisionCache;
use crate::infrastructure::services::LlmService;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(2);

/// Candidate plays listed in the prompt
const PROMPT_CANDIDATES: usize = 30;

/// Why a provider answer was refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("reply is not a decision: {0}")]
    Unparseable(String),
    #[error("unknown card label {0:?}")]
    UnknownCard(String),
    #[error("asked for {wanted} x {rank} but only {held} held")]
    NotInHand { rank: Rank, wanted: usize, held: usize },
    #[error("play without cards")]
    EmptyPlay,
    #[error("not a pattern: {0}")]
    InvalidPattern(ClassificationError),
    #[error("{played} does not beat {table}")]
    DoesNotBeat { table: String, played: String },
    #[error("pass while leading")]
    IllegalPass,
    #[error("{0}")]
    Rule(String),
}

impl Rejection {
    /// Message fed back to the provider on the next attempt
    pub fn feedback(&self) -> String {
        match self {
            Rejection::Unparseable(_) => {
                r#"Your reply could not be read. Answer with one JSON object only, e.g. {"action":"play","cards":["3","3"]} or {"action":"pass"}."#.to_string()
            }
            Rejection::UnknownCard(label) => format!(
                "\"{}\" is not a card. Use the labels 3 4 5 6 7 8 9 10 J Q K A 2 SJ BJ.",
                label
            ),
            Rejection::NotInHand { rank, wanted, held } => format!(
                "You asked for {} card(s) of rank {} but your hand holds {}. Only play cards from your hand.",
                wanted, rank, held
            ),
            Rejection::EmptyPlay => {
                r#"A play needs at least one card. To pass, answer {"action":"pass"}."#.to_string()
            }
            Rejection::InvalidPattern(e) => format!(
                "Those cards do not form a legal pattern ({}). Pick one of the listed legal plays.",
                e
            ),
            Rejection::DoesNotBeat { table, played } => format!(
                "{} does not beat {}. Answer with the same pattern and length at a higher rank, a bomb, the rocket, or pass.",
                played, table
            ),
            Rejection::IllegalPass => {
                "You are leading an open trick and cannot pass. Play any legal pattern.".to_string()
            }
            Rejection::Rule(message) => format!("That move is not allowed: {}.", message),
        }
    }
}

impl From<MoveError> for Rejection {
    fn from(e: MoveError) -> Self {
        match e {
            MoveError::InvalidPattern(inner) => Rejection::InvalidPattern(inner),
            MoveError::MustBeatOrLead { table, played } => Rejection::DoesNotBeat {
                table: table.describe(),
                played: played.describe(),
            },
            MoveError::IllegalPass => Rejection::IllegalPass,
            other => Rejection::Rule(other.to_string()),
        }
    }
}

/// Provider failure, recovered inside the strategy
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider timed out after {0:?}")]
    Timeout(Duration),
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
    #[error("Provider suggested an illegal move: {0}")]
    InvalidSuggestion(Rejection),
}

/// Where a decision came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum DecisionSource {
    /// Accepted provider answer after this many attempts
    Provider { attempts: u32 },
    /// Re-validated cached provider answer
    Cache,
    /// Provider attempts exhausted
    Fallback,
    /// No provider configured
    Heuristic,
}

#[derive(Debug, Clone)]
pub struct DecisionOutcome {
    pub decision: Decision,
    pub source: DecisionSource,
    pub failures: Vec<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct ProviderReply {
    action: String,
    #[serde(default)]
    cards: Vec<serde_json::Value>,
}

/// Slice out the JSON object of a reply that may be wrapped in prose or a
/// code fence
fn json_body(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

fn parse_rank(value: &serde_json::Value) -> Result<Rank, Rejection> {
    let parsed = match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|v| u8::try_from(v).ok())
            .and_then(Rank::from_value),
        serde_json::Value::String(s) => {
            Rank::from_label(s.trim_start_matches(['♠', '♥', '♣', '♦']))
        }
        _ => None,
    };
    parsed.ok_or_else(|| {
        Rejection::UnknownCard(match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    })
}

/// Turn rank labels into concrete cards from the hand
fn cards_for(state: &GameState, seat: u8, ranks: &[Rank]) -> Result<Vec<Card>, Rejection> {
    let mut wanted: BTreeMap<Rank, usize> = BTreeMap::new();
    for &rank in ranks {
        *wanted.entry(rank).or_default() += 1;
    }
    let hand = state.get_hand(seat);
    let mut cards = Vec::with_capacity(ranks.len());
    for (rank, count) in wanted {
        let taken = hand.take_rank(rank, count);
        if taken.len() < count {
            return Err(Rejection::NotInHand {
                rank,
                wanted: count,
                held: taken.len(),
            });
        }
        cards.extend(taken);
    }
    Ok(cards)
}

/// Read a provider reply and check it against the rules
pub fn interpret_reply(state: &GameState, seat: u8, reply: &str) -> Result<Decision, Rejection> {
    let body = json_body(reply).ok_or_else(|| Rejection::Unparseable("no JSON object".to_string()))?;
    let parsed: ProviderReply =
        serde_json::from_str(body).map_err(|e| Rejection::Unparseable(e.to_string()))?;

    match parsed.action.trim().to_lowercase().as_str() {
        "pass" => {
            validate_pass(state, seat)?;
            Ok(Decision::Pass)
        }
        "play" | "play_cards" => {
            if parsed.cards.is_empty() {
                return Err(Rejection::EmptyPlay);
            }
            let ranks = parsed
                .cards
                .iter()
                .map(parse_rank)
                .collect::<Result<Vec<_>, _>>()?;
            let cards = cards_for(state, seat, &ranks)?;
            let pattern = validate_play(state, seat, &cards)?;
            Ok(Decision::Play(pattern))
        }
        other => Err(Rejection::Unparseable(format!("unknown action {:?}", other))),
    }
}

fn rank_labels(pattern: &Pattern) -> String {
    pattern
        .cards()
        .iter()
        .map(|c| format!("\"{}\"", c.rank.label()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Situation summary sent as the user prompt
pub fn build_user_prompt(state: &GameState, seat: u8, feedback: Option<&str>) -> String {
    let hand = state.get_hand(seat);
    let mut lines = vec![
        "## Current Situation".to_string(),
        format!("You are seat {} ({}).", seat, state.role(seat).as_str()),
        format!("Your hand ({} cards): {}", hand.len(), cards_to_string(hand.cards())),
        String::new(),
        "### Other seats".to_string(),
    ];
    for other in (0..SEAT_COUNT).filter(|&s| s != seat) {
        let relation = if state.are_teammates(seat, other) {
            "teammate"
        } else {
            "opponent"
        };
        lines.push(format!(
            "Seat {} ({}, {}): {} cards",
            other,
            state.role(other).as_str(),
            relation,
            state.get_hand(other).len()
        ));
    }

    lines.push(String::new());
    lines.push("### Table".to_string());
    match (state.table_pattern(), state.table_owner()) {
        (Some(pattern), Some(owner)) => {
            lines.push(format!("Seat {} played {}", owner, pattern));
            lines.push("Beat it with the same pattern at a higher rank, a bomb or the rocket, or pass.".to_string());
        }
        _ => lines.push("Open trick: you lead and may not pass.".to_string()),
    }
    lines.push(format!("Cards already played: {}", cards_to_string(&state.played_cards())));

    let moves = legal_moves(state, seat);
    lines.push(String::new());
    lines.push("### Legal plays".to_string());
    if moves.is_empty() {
        lines.push("None: you must pass.".to_string());
    }
    for pattern in moves.iter().take(PROMPT_CANDIDATES) {
        lines.push(format!("- {}: [{}]", pattern.describe(), rank_labels(pattern)));
    }
    if moves.len() > PROMPT_CANDIDATES {
        lines.push(format!("... and {} more", moves.len() - PROMPT_CANDIDATES));
    }
    lines.push(format!(
        "Pass allowed: {}",
        if can_pass(state, seat) { "yes" } else { "no" }
    ));

    if let Some(feedback) = feedback {
        lines.push(String::new());
        lines.push("### Your previous answer was rejected".to_string());
        lines.push(feedback.to_string());
    }

    lines.push(String::new());
    lines.push(r#"Respond with JSON only: {"action":"play","cards":[...]} or {"action":"pass"}."#.to_string());
    lines.join("\n")
}

/// LLM Bot Strategy
pub struct LlmBotStrategy {
    llm_service: Option<Arc<dyn LlmService>>,
    fallback: MediumBotStrategy,
    cache: Option<Arc<DecisionCache>>,
    max_attempts: u32,
    attempt_timeout: Duration,
    system_prompt: String,
}

impl LlmBotStrategy {
    pub fn new(
        llm_service: Option<Arc<dyn LlmService>>,
        cache: Option<Arc<DecisionCache>>,
    ) -> Self {
        Self {
            llm_service,
            fallback: MediumBotStrategy::new(),
            cache,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            system_prompt: Self::build_system_prompt(),
        }
    }

    /// Create with just LLM service (no cache)
    pub fn with_service(llm_service: Arc<dyn LlmService>) -> Self {
        Self::new(Some(llm_service), None)
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    fn build_system_prompt() -> String {
        r#"You are an expert Dou Dizhu (Landlord) player. Three seats play; the Landlord plays alone against two Farmers. The first seat to empty its hand wins for its side.

## Ranks (low to high)
3 4 5 6 7 8 9 10 J Q K A 2 SJ BJ (SJ = small joker, BJ = big joker). Suits never matter.

## Patterns
- Single, Pair, Triple
- Triple with single (3+1), Triple with pair (3+2)
- Straight: 5+ consecutive ranks from 3 to A
- Consecutive pairs: 3+ consecutive pairs from 3 to A
- Airplane: 2+ consecutive triples from 3 to A, optionally with one single or one pair per triple as wings
- Four with two: four of a rank plus two single cards or one pair
- Bomb: four of a rank
- Rocket: SJ + BJ

## Beating the table
- Same pattern, same length, same card count, higher rank
- A bomb beats anything except a higher bomb or the rocket; the rocket beats everything
- When the trick is open you lead and must play; otherwise you may pass

## Strategy
- Shed awkward low singles early and keep the hand in few, strong plays
- Keep bombs unless they win the game or stop an opponent who is about to go out
- Do not overtake your teammate

## Response Format
Answer with ONE JSON object and nothing else. Cards are rank labels from your hand:
{"action":"play","cards":["3","3","3","4","4"]}
{"action":"pass"}"#
            .to_string()
    }

    /// Decide with the provider, falling back to the Medium heuristic
    pub async fn decide_async(&self, state: &GameState, seat: u8) -> DecisionOutcome {
        let key = state.fingerprint(seat);
        if let Some(cache) = &self.cache {
            let hit = cache.get(key).await;
            if let Some(decision) = hit {
                if validate_decision(state, seat, &decision).is_ok() {
                    debug!(seat, decision = %decision.describe(), "Using cached decision");
                    return DecisionOutcome {
                        decision,
                        source: DecisionSource::Cache,
                        failures: Vec::new(),
                    };
                }
                cache.invalidate(key).await;
            }
        }

        let Some(service) = &self.llm_service else {
            return self.heuristic(state, seat, Vec::new(), DecisionSource::Heuristic);
        };

        let mut failures = Vec::new();
        let mut feedback: Option<String> = None;
        for attempt in 1..=self.max_attempts {
            let user_prompt = build_user_prompt(state, seat, feedback.as_deref());
            let reply = match timeout(
                self.attempt_timeout,
                service.invoke(&self.system_prompt, &user_prompt),
            )
            .await
            {
                Err(_) => {
                    warn!(seat, attempt, provider = service.name(), "Provider timed out");
                    failures.push(ProviderError::Timeout(self.attempt_timeout));
                    continue;
                }
                Ok(Err(e)) => {
                    warn!(seat, attempt, provider = service.name(), error = %e, "Provider call failed");
                    failures.push(ProviderError::Unavailable(e.to_string()));
                    continue;
                }
                Ok(Ok(reply)) => reply,
            };

            match interpret_reply(state, seat, &reply) {
                Ok(decision) => {
                    info!(
                        seat,
                        attempt,
                        decision = %decision.describe(),
                        "Provider decision accepted"
                    );
                    if let Some(cache) = &self.cache {
                        cache.insert(key, decision.clone()).await;
                    }
                    return DecisionOutcome {
                        decision,
                        source: DecisionSource::Provider { attempts: attempt },
                        failures,
                    };
                }
                Err(rejection) => {
                    warn!(
                        seat,
                        attempt,
                        reason = %rejection,
                        reply = %reply.chars().take(200).collect::<String>(),
                        "Provider suggested an illegal move"
                    );
                    feedback = Some(rejection.feedback());
                    failures.push(ProviderError::InvalidSuggestion(rejection));
                }
            }
        }

        warn!(
            seat,
            attempts = self.max_attempts,
            "Provider attempts exhausted, using heuristic"
        );
        self.heuristic(state, seat, failures, DecisionSource::Fallback)
    }

    fn heuristic(
        &self,
        state: &GameState,
        seat: u8,
        failures: Vec<ProviderError>,
        source: DecisionSource,
    ) -> DecisionOutcome {
        DecisionOutcome {
            decision: self.fallback.decide(state, seat),
            source,
            failures,
        }
    }
}

impl BotStrategy for LlmBotStrategy {
    fn decide(&self, state: &GameState, seat: u8) -> Decision {
        self.fallback.decide(state, seat)
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}
