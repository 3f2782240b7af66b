//! Bot strategy integration tests
//!
//! Provider-backed decisions run against the scripted mock provider.

use std::sync::Arc;
use std::time::Duration;

use landlord_engine::application::game::{
    MatchRoom, TakeBotTurn, TakeBotTurnError, TakeBotTurnInput,
};
use landlord_engine::domain::entities::{Card, Rank, Suit};
use landlord_engine::domain::services::{
    apply_play, deal_with_seed, start_with_hands, LandlordSelection, MoveError,
};
use landlord_engine::domain::value_objects::{GameState, PatternKind};
use landlord_engine::infrastructure::app_state::AppState;
use landlord_engine::infrastructure::bot::decision_cache::DecisionCache;
use landlord_engine::infrastructure::bot::strategies::{
    validate_decision, BotStrategy, Decision, DecisionSource, Difficulty, EasyBotStrategy,
    HardBotStrategy, LlmBotStrategy, MediumBotStrategy, ProviderError, Rejection,
};
use landlord_engine::infrastructure::config::EngineConfig;
use landlord_engine::infrastructure::services::{LlmService, MockLlmService, MockReply};

fn c(rank: Rank, suit: Suit) -> Card {
    Card::new(rank, suit).unwrap()
}

fn table() -> GameState {
    start_with_hands(
        [
            vec![
                c(Rank::Four, Suit::Spades),
                c(Rank::Four, Suit::Hearts),
                c(Rank::Nine, Suit::Spades),
                c(Rank::King, Suit::Spades),
            ],
            vec![c(Rank::Five, Suit::Hearts), c(Rank::Ten, Suit::Hearts)],
            vec![c(Rank::Six, Suit::Clubs), c(Rank::Jack, Suit::Clubs)],
        ],
        0,
    )
    .unwrap()
}

fn test_config() -> EngineConfig {
    EngineConfig {
        ai_timeout: Duration::from_millis(500),
        provider_max_attempts: 3,
        provider_attempt_timeout: Duration::from_millis(50),
        hard_threat_threshold: 0.5,
        decision_cache_ttl: Duration::from_secs(60),
        decision_cache_capacity: 16,
    }
}

fn text(reply: &str) -> MockReply {
    MockReply::Text(reply.to_string())
}

#[test]
fn test_every_tier_returns_legal_decisions() {
    let strategies: Vec<Box<dyn BotStrategy>> = vec![
        Box::new(EasyBotStrategy::with_seed(5)),
        Box::new(MediumBotStrategy::new()),
        Box::new(HardBotStrategy::new()),
        Box::new(LlmBotStrategy::new(None, None)),
    ];
    for seed in 0..5 {
        let state = deal_with_seed(seed, LandlordSelection::StrongestHand).unwrap();
        let seat = state.current_turn;
        for strategy in &strategies {
            let decision = strategy.decide(&state, seat);
            assert!(
                validate_decision(&state, seat, &decision).is_ok(),
                "{} gave {:?}",
                strategy.name(),
                decision
            );
        }
    }
}

#[tokio::test]
async fn test_illegal_suggestions_get_specific_feedback() {
    let mock = Arc::new(MockLlmService::scripted(vec![
        text(r#"{"action":"play","cards":["A"]}"#),
        text(r#"{"action":"play","cards":["4","9"]}"#),
        text(r#"{"action":"play","cards":["4","4"]}"#),
    ]));
    let strategy = LlmBotStrategy::with_service(mock.clone());
    let outcome = strategy.decide_async(&table(), 0).await;

    assert_eq!(outcome.source, DecisionSource::Provider { attempts: 3 });
    assert_eq!(
        outcome.decision.pattern().map(|p| p.kind()),
        Some(PatternKind::Pair)
    );
    assert_eq!(
        outcome.failures[0],
        ProviderError::InvalidSuggestion(Rejection::NotInHand {
            rank: Rank::Ace,
            wanted: 1,
            held: 0
        })
    );
    assert!(matches!(
        outcome.failures[1],
        ProviderError::InvalidSuggestion(Rejection::InvalidPattern(_))
    ));

    let prompts = mock.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(!prompts[0].contains("rejected"));
    assert!(prompts[1].contains("rank A but your hand holds 0"));
    assert!(prompts[2].contains("do not form a legal pattern"));
}

#[tokio::test]
async fn test_exhausted_retries_fall_back_to_medium() {
    let mock = Arc::new(MockLlmService::scripted(vec![
        MockReply::Fail,
        MockReply::Hang(Duration::from_secs(5)),
        text("no idea"),
    ]));
    let strategy = LlmBotStrategy::with_service(mock.clone())
        .with_attempt_timeout(Duration::from_millis(30));
    let state = table();
    let outcome = strategy.decide_async(&state, 0).await;

    assert_eq!(outcome.source, DecisionSource::Fallback);
    assert_eq!(outcome.decision, MediumBotStrategy::new().decide(&state, 0));
    assert!(matches!(outcome.failures[0], ProviderError::Unavailable(_)));
    assert_eq!(
        outcome.failures[1],
        ProviderError::Timeout(Duration::from_millis(30))
    );
    assert!(matches!(
        outcome.failures[2],
        ProviderError::InvalidSuggestion(Rejection::Unparseable(_))
    ));
    assert_eq!(mock.call_count(), 3);
}

#[tokio::test]
async fn test_cache_skips_the_provider() {
    let cache = Arc::new(DecisionCache::new(Duration::from_secs(60), 8));
    let mock = Arc::new(MockLlmService::scripted(vec![text(
        r#"{"action":"play","cards":["K"]}"#,
    )]));
    let service: Arc<dyn LlmService> = mock.clone();
    let strategy = LlmBotStrategy::new(Some(service), Some(cache.clone()));
    let state = table();

    let first = strategy.decide_async(&state, 0).await;
    assert_eq!(first.source, DecisionSource::Provider { attempts: 1 });
    let second = strategy.decide_async(&state, 0).await;
    assert_eq!(second.source, DecisionSource::Cache);
    assert_eq!(second.decision, first.decision);
    assert_eq!(mock.call_count(), 1);
    assert_eq!(cache.stats().await.hits, 1);
}

#[tokio::test]
async fn test_stale_cache_entry_is_dropped() {
    let cache = Arc::new(DecisionCache::new(Duration::from_secs(60), 8));
    let state = table();
    // A pass is never legal for the leader
    cache.insert(state.fingerprint(0), Decision::Pass).await;

    let strategy = LlmBotStrategy::new(None, Some(cache.clone()));
    let outcome = strategy.decide_async(&state, 0).await;
    assert_eq!(outcome.source, DecisionSource::Heuristic);
    assert!(!outcome.decision.is_pass());
    assert_eq!(cache.stats().await.entries, 0);
}

#[test]
fn test_provider_decisions_block_on() {
    let mock: Arc<dyn LlmService> = Arc::new(MockLlmService::new(r#"{"action":"play","cards":[9]}"#));
    let strategy = LlmBotStrategy::with_service(mock);
    let outcome = tokio_test::block_on(strategy.decide_async(&table(), 0));
    assert_eq!(
        outcome.decision.pattern().map(|p| p.primary_rank()),
        Some(Rank::Nine)
    );
}

#[tokio::test]
async fn test_take_bot_turn_with_provider() {
    let mock: Arc<dyn LlmService> = Arc::new(MockLlmService::scripted(vec![
        text(r#"{"action":"pass"}"#),
        text(r#"{"action":"play","cards":["9"]}"#),
    ]));
    let app = Arc::new(AppState::with_service(test_config(), Some(mock)));
    let room = Arc::new(MatchRoom::new(
        table(),
        [Some(Difficulty::Llm), Some(Difficulty::Medium), None],
    ));
    let take_turn = TakeBotTurn::new(room.clone(), app);

    let output = take_turn.execute(TakeBotTurnInput { seat: 0 }).await.unwrap();
    assert_eq!(output.source, DecisionSource::Provider { attempts: 2 });
    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.next_turn, 1);
    assert_eq!(room.snapshot().await.get_hand(0).len(), 3);

    let err = take_turn.execute(TakeBotTurnInput { seat: 0 }).await.unwrap_err();
    assert!(matches!(
        err,
        TakeBotTurnError::Move(MoveError::NotYourTurn { expected: 1, actual: 0 })
    ));
    let err = take_turn.execute(TakeBotTurnInput { seat: 2 }).await.unwrap_err();
    assert!(matches!(err, TakeBotTurnError::NotABot(2)));

    let output = take_turn.execute(TakeBotTurnInput { seat: 1 }).await.unwrap();
    assert_eq!(output.source, DecisionSource::Heuristic);
    assert_eq!(output.next_turn, 2);
}

#[tokio::test]
async fn test_bot_only_matches_finish() {
    let app = Arc::new(AppState::with_service(test_config(), None));
    let tiers = [
        [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard],
        [Difficulty::Hard, Difficulty::Hard, Difficulty::Llm],
    ];
    for (i, tier) in tiers.into_iter().enumerate() {
        let state = deal_with_seed(i as u64 + 100, LandlordSelection::StrongestHand).unwrap();
        let mut seat = state.current_turn;
        let room = Arc::new(MatchRoom::new(state, tier.map(Some)));
        let take_turn = TakeBotTurn::new(room.clone(), app.clone());

        let mut finished = false;
        for _ in 0..500 {
            let output = take_turn.execute(TakeBotTurnInput { seat }).await.unwrap();
            if output.finished {
                finished = true;
                break;
            }
            seat = output.next_turn;
        }
        assert!(finished);
        let snapshot = room.snapshot().await;
        assert!(snapshot.result.is_some());
    }
}

#[test]
fn test_hard_answers_a_landlord_about_to_win() {
    let state = start_with_hands(
        [
            vec![c(Rank::Eight, Suit::Spades), c(Rank::Ace, Suit::Spades)],
            vec![
                c(Rank::Queen, Suit::Hearts),
                c(Rank::Queen, Suit::Spades),
                c(Rank::Three, Suit::Hearts),
            ],
            vec![c(Rank::Four, Suit::Clubs), c(Rank::Five, Suit::Clubs)],
        ],
        0,
    )
    .unwrap();
    let state = apply_play(&state, 0, &[c(Rank::Eight, Suit::Spades)]).unwrap();
    let decision = HardBotStrategy::new().decide(&state, 1);
    assert_eq!(
        decision.pattern().map(|p| p.primary_rank()),
        Some(Rank::Queen)
    );
}
