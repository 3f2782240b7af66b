//! GameState - Full state of one Landlord match
//!
//! Owned exclusively by the state machine in `domain::services`. Everything a
//! strategy needs to know (hands, table, history) is readable from here.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::Serialize;
use smallvec::SmallVec;
use uuid::Uuid;

use super::pattern::Pattern;
use crate::domain::entities::{
    Card, Deck, Hand, Player, RankCounts, Role, SEAT_COUNT,
};

/// Match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Dealing,
    Playing,
    Finished,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Dealing
    }
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Dealing => "dealing",
            Phase::Playing => "playing",
            Phase::Finished => "finished",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The active trick
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableState {
    /// `None` means the trick is open
    pub pattern: Option<Pattern>,
    pub owner: Option<u8>,
    pub pass_count: u8,
}

impl TableState {
    pub fn is_open(&self) -> bool {
        self.pattern.is_none()
    }

    pub fn clear(&mut self) {
        self.pattern = None;
        self.owner = None;
        self.pass_count = 0;
    }
}

/// What a seat did on its turn
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "pattern")]
pub enum TurnAction {
    Play(Pattern),
    Pass,
}

/// One entry of the play history
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub seat: u8,
    pub action: TurnAction,
    pub turn: u32,
    pub timestamp: i64,
}

/// Outcome of a finished match
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub winner: u8,
    pub winning_role: Role,
    pub landlord: u8,
    /// Bombs and rockets played during the match
    pub bombs_played: u8,
    /// 2^bombs_played
    pub multiplier: u32,
    /// Signed score per seat
    pub scores: [i32; 3],
}

/// Landlord base stake; each farmer stakes half of it
const LANDLORD_BASE_SCORE: i32 = 2;
const FARMER_BASE_SCORE: i32 = 1;

impl GameResult {
    pub fn compute(winner: u8, landlord: u8, bombs_played: u8) -> Self {
        let winning_role = if winner == landlord {
            Role::Landlord
        } else {
            Role::Farmer
        };
        let multiplier = 1u32 << bombs_played.min(16);
        let m = multiplier as i32;
        let landlord_won = winning_role == Role::Landlord;

        let mut scores = [0i32; 3];
        for (seat, score) in scores.iter_mut().enumerate() {
            let base = if seat as u8 == landlord {
                LANDLORD_BASE_SCORE
            } else {
                FARMER_BASE_SCORE
            };
            let won = (seat as u8 == landlord) == landlord_won;
            *score = if won { base * m } else { -base * m };
        }

        Self {
            winner,
            winning_role,
            landlord,
            bombs_played,
            multiplier,
            scores,
        }
    }
}

/// Complete match state
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub id: Uuid,
    pub players: [Player; 3],
    pub landlord: u8,
    pub bottom_cards: Vec<Card>,
    pub current_turn: u8,
    pub table: TableState,
    pub history: Vec<HistoryEntry>,
    pub phase: Phase,
    pub result: Option<GameResult>,
    pub turn_number: u32,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Empty match in the Dealing phase
    pub fn new() -> Self {
        let id = Uuid::new_v4();
        let players = [0u8, 1, 2].map(|seat| {
            Player::new(format!("seat-{}", seat), seat, Role::Farmer, Hand::default())
        });
        GameState {
            id,
            players,
            landlord: 0,
            bottom_cards: Vec::new(),
            current_turn: 0,
            table: TableState::default(),
            history: Vec::new(),
            phase: Phase::Dealing,
            result: None,
            turn_number: 0,
        }
    }

    #[inline]
    pub fn player(&self, seat: u8) -> &Player {
        &self.players[seat as usize]
    }

    #[inline]
    pub fn get_hand(&self, seat: u8) -> &Hand {
        &self.players[seat as usize].hand
    }

    #[inline]
    pub fn get_hand_mut(&mut self, seat: u8) -> &mut Hand {
        &mut self.players[seat as usize].hand
    }

    #[inline]
    pub fn role(&self, seat: u8) -> Role {
        self.players[seat as usize].role
    }

    pub fn hand_sizes(&self) -> [usize; 3] {
        [0u8, 1, 2].map(|seat| self.get_hand(seat).len())
    }

    /// Seats on the same side (only the two farmers are teammates)
    pub fn are_teammates(&self, a: u8, b: u8) -> bool {
        a != b && self.role(a) == Role::Farmer && self.role(b) == Role::Farmer
    }

    /// Seats playing against `seat`
    pub fn opponents(&self, seat: u8) -> SmallVec<[u8; 2]> {
        (0..SEAT_COUNT)
            .filter(|&s| s != seat && !self.are_teammates(seat, s))
            .collect()
    }

    #[inline]
    pub fn table_pattern(&self) -> Option<&Pattern> {
        self.table.pattern.as_ref()
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// Every card played so far, in play order
    pub fn played_cards(&self) -> Vec<Card> {
        self.history
            .iter()
            .filter_map(|entry| match &entry.action {
                TurnAction::Play(pattern) => Some(pattern.cards()),
                TurnAction::Pass => None,
            })
            .flatten()
            .copied()
            .collect()
    }

    /// Bombs and rockets found in the history
    pub fn bombs_played(&self) -> u8 {
        self.history
            .iter()
            .filter(|entry| matches!(&entry.action, TurnAction::Play(p) if p.is_bomb_like()))
            .count() as u8
    }

    /// Rank distribution of the cards `seat` has not seen: the full deck minus
    /// its own hand and everything already played
    pub fn unseen_rank_counts(&self, seat: u8) -> RankCounts {
        let mut counts = RankCounts::from_cards(Deck::standard().cards().iter());
        for card in self.get_hand(seat).cards() {
            counts.take(card.rank, 1);
        }
        for card in self.played_cards() {
            counts.take(card.rank, 1);
        }
        counts
    }

    /// Last seat that made a play, if the trick is live
    pub fn table_owner(&self) -> Option<u8> {
        self.table.owner
    }

    /// Hash of everything a decision for `seat` depends on
    pub fn fingerprint(&self, seat: u8) -> u64 {
        let mut hasher = DefaultHasher::new();
        seat.hash(&mut hasher);
        self.role(seat).hash(&mut hasher);
        self.get_hand(seat).hash(&mut hasher);
        self.hand_sizes().hash(&mut hasher);
        self.table.hash(&mut hasher);
        self.played_cards().hash(&mut hasher);
        hasher.finish()
    }
}
