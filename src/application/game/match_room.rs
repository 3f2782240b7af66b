//! One match and its single writer
//!
//! Every action on a match goes through the room's mutex, so only one
//! transition is ever in flight. Rooms share nothing with each other and can
//! run on separate tasks.

use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::domain::entities::SEAT_COUNT;
use crate::domain::value_objects::GameState;
use crate::infrastructure::bot::strategies::Difficulty;

pub struct MatchRoom {
    id: Uuid,
    state: Mutex<GameState>,
    /// Difficulty per seat, `None` for human seats
    bots: [Option<Difficulty>; 3],
}

impl MatchRoom {
    pub fn new(state: GameState, bots: [Option<Difficulty>; 3]) -> Self {
        Self {
            id: state.id,
            state: Mutex::new(state),
            bots,
        }
    }

    /// Room with three human seats
    pub fn humans(state: GameState) -> Self {
        Self::new(state, [None; 3])
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn bot_difficulty(&self, seat: u8) -> Option<Difficulty> {
        if seat >= SEAT_COUNT {
            return None;
        }
        self.bots[seat as usize]
    }

    pub fn is_bot(&self, seat: u8) -> bool {
        self.bot_difficulty(seat).is_some()
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> GameState {
        self.state.lock().await.clone()
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, GameState> {
        self.state.lock().await
    }
}
