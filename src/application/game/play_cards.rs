use std::sync::Arc;

use super::MatchRoom;
use crate::domain::entities::Card;
use crate::domain::services::{execute_play, MoveError};
use crate::domain::value_objects::Pattern;

/// Play cards input
pub struct PlayCardsInput {
    pub seat: u8,
    pub cards: Vec<Card>,
}

/// Play cards output
#[derive(Debug)]
pub struct PlayCardsOutput {
    pub pattern: Pattern,
    pub remaining_cards: usize,
    pub finished: bool,
    pub next_turn: u8,
}

/// Play cards use case
pub struct PlayCards {
    room: Arc<MatchRoom>,
}

impl PlayCards {
    pub fn new(room: Arc<MatchRoom>) -> Self {
        Self { room }
    }

    pub async fn execute(&self, input: PlayCardsInput) -> Result<PlayCardsOutput, PlayCardsError> {
        if self.room.is_bot(input.seat) {
            return Err(PlayCardsError::BotSeat(input.seat));
        }
        let mut state = self.room.lock().await;
        let pattern = execute_play(&mut state, input.seat, &input.cards)?;

        Ok(PlayCardsOutput {
            pattern,
            remaining_cards: state.get_hand(input.seat).len(),
            finished: state.is_finished(),
            next_turn: state.current_turn,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PlayCardsError {
    #[error("Seat {0} is played by a bot")]
    BotSeat(u8),
    #[error(transparent)]
    Move(#[from] MoveError),
}
