use std::sync::Arc;

use super::MatchRoom;
use crate::domain::services::{execute_pass, MoveError};

/// Pass turn input
pub struct PassTurnInput {
    pub seat: u8,
}

/// Pass turn output
#[derive(Debug)]
pub struct PassTurnOutput {
    /// Both other seats passed and the table was cleared
    pub trick_cleared: bool,
    pub next_turn: u8,
}

/// Pass turn use case
pub struct PassTurn {
    room: Arc<MatchRoom>,
}

impl PassTurn {
    pub fn new(room: Arc<MatchRoom>) -> Self {
        Self { room }
    }

    pub async fn execute(&self, input: PassTurnInput) -> Result<PassTurnOutput, PassTurnError> {
        if self.room.is_bot(input.seat) {
            return Err(PassTurnError::BotSeat(input.seat));
        }
        let mut state = self.room.lock().await;
        let trick_cleared = execute_pass(&mut state, input.seat)?;

        Ok(PassTurnOutput {
            trick_cleared,
            next_turn: state.current_turn,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PassTurnError {
    #[error("Seat {0} is played by a bot")]
    BotSeat(u8),
    #[error(transparent)]
    Move(#[from] MoveError),
}
