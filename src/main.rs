use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use landlord_engine::application::game::{MatchRoom, TakeBotTurn, TakeBotTurnInput};
use landlord_engine::domain::services::{deal_with_seed, LandlordSelection};
use landlord_engine::domain::value_objects::GameResult;
use landlord_engine::infrastructure::app_state::AppState;
use landlord_engine::infrastructure::bot::strategies::Difficulty;

/// Upper bound on turns in one match
const MAX_TURNS: u32 = 1000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "landlord_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let seed: u64 = match std::env::var("LANDLORD_SEED") {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("LANDLORD_SEED must be an integer, got {:?}", raw))?,
        Err(_) => rand::random(),
    };
    let matches: u64 = std::env::var("LANDLORD_MATCHES")
        .ok()
        .and_then(|m| m.trim().parse().ok())
        .unwrap_or(1);
    let difficulties = parse_difficulties(
        &std::env::var("LANDLORD_DIFFICULTIES").unwrap_or_else(|_| "hard,medium,easy".to_string()),
    )?;

    let app = Arc::new(AppState::new().await?);
    tracing::info!(seed, matches, ?difficulties, "Starting self-play");

    let runs = (0..matches).map(|i| play_match(app.clone(), seed.wrapping_add(i), difficulties));
    let results = futures::future::join_all(runs).await;

    let mut failed = 0;
    for result in results {
        match result {
            Ok(summary) => println!("{}", summary),
            Err(e) => {
                failed += 1;
                tracing::error!("Match failed: {:#}", e);
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{} of {} matches failed", failed, matches);
    }
    Ok(())
}

fn parse_difficulties(raw: &str) -> anyhow::Result<[Difficulty; 3]> {
    let parsed = raw
        .split(',')
        .map(|s| Difficulty::from_str(s).with_context(|| format!("unknown difficulty {:?}", s)))
        .collect::<anyhow::Result<Vec<_>>>()?;
    parsed
        .try_into()
        .map_err(|v: Vec<Difficulty>| anyhow::anyhow!("expected 3 difficulties, got {}", v.len()))
}

struct MatchSummary {
    seed: u64,
    turns: u32,
    result: GameResult,
}

impl std::fmt::Display for MatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "seed {}: seat {} ({}) wins after {} turns, x{} scores {:?}",
            self.seed,
            self.result.winner,
            self.result.winning_role.as_str(),
            self.turns,
            self.result.multiplier,
            self.result.scores
        )
    }
}

async fn play_match(
    app: Arc<AppState>,
    seed: u64,
    difficulties: [Difficulty; 3],
) -> anyhow::Result<MatchSummary> {
    let state = deal_with_seed(seed, LandlordSelection::StrongestHand)?;
    let mut seat = state.current_turn;
    let room = Arc::new(MatchRoom::new(state, difficulties.map(Some)));
    let take_turn = TakeBotTurn::new(room.clone(), app);

    for turn in 1..=MAX_TURNS {
        let output = take_turn.execute(TakeBotTurnInput { seat }).await?;
        if output.finished {
            let result = room
                .snapshot()
                .await
                .result
                .context("finished match without a result")?;
            return Ok(MatchSummary {
                seed,
                turns: turn,
                result,
            });
        }
        seat = output.next_turn;
    }
    anyhow::bail!("match {} did not finish within {} turns", room.id(), MAX_TURNS)
}
