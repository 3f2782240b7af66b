use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::MatchRoom;
use crate::domain::entities::{Card, Role, SEAT_COUNT};
use crate::domain::services::{can_pass, legal_moves};
use crate::domain::value_objects::{GameResult, Pattern, Phase};
use crate::infrastructure::bot::recommender::{recommend, Recommendation};
use crate::infrastructure::bot::strategies::Difficulty;

/// Get game view input
pub struct GetGameViewInput {
    pub viewer: u8,
    /// Maximum number of play hints
    pub hint_limit: usize,
}

/// Public information about one seat
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    pub seat: u8,
    pub role: Role,
    pub card_count: usize,
    pub difficulty: Option<Difficulty>,
}

/// What one seat is allowed to see
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub game_id: Uuid,
    pub phase: Phase,
    pub viewer: u8,
    pub current_turn: u8,
    pub landlord: u8,
    pub seats: Vec<SeatView>,
    pub hand: Vec<Card>,
    pub bottom_cards: Vec<Card>,
    pub table: Option<Pattern>,
    pub table_owner: Option<u8>,
    pub pass_count: u8,
    pub cards_played: usize,
    pub legal_moves: Vec<Pattern>,
    pub can_pass: bool,
    pub recommendations: Vec<Recommendation>,
    pub result: Option<GameResult>,
}

/// Get game view use case
pub struct GetGameView {
    room: Arc<MatchRoom>,
}

impl GetGameView {
    pub fn new(room: Arc<MatchRoom>) -> Self {
        Self { room }
    }

    pub async fn execute(&self, input: GetGameViewInput) -> Result<GameView, GetGameViewError> {
        if input.viewer >= SEAT_COUNT {
            return Err(GetGameViewError::InvalidSeat(input.viewer));
        }
        let state = self.room.snapshot().await;
        let viewer = input.viewer;

        let seats = (0..SEAT_COUNT)
            .map(|seat| SeatView {
                seat,
                role: state.role(seat),
                card_count: state.get_hand(seat).len(),
                difficulty: self.room.bot_difficulty(seat),
            })
            .collect();

        // Hints are only useful to the seat that can act on them
        let (moves, hints) = if state.current_turn == viewer {
            (
                legal_moves(&state, viewer),
                recommend(&state, viewer, input.hint_limit),
            )
        } else {
            (Vec::new(), Vec::new())
        };

        Ok(GameView {
            game_id: state.id,
            phase: state.phase,
            viewer,
            current_turn: state.current_turn,
            landlord: state.landlord,
            seats,
            hand: state.get_hand(viewer).cards().to_vec(),
            bottom_cards: state.bottom_cards.clone(),
            table: state.table.pattern.clone(),
            table_owner: state.table.owner,
            pass_count: state.table.pass_count,
            cards_played: state.played_cards().len(),
            legal_moves: moves,
            can_pass: can_pass(&state, viewer),
            recommendations: hints,
            result: state.result.clone(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GetGameViewError {
    #[error("Invalid seat {0}")]
    InvalidSeat(u8),
}
