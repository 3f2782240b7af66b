use serde::{Deserialize, Serialize};

use super::hand::Hand;

/// Seats at a Landlord table
pub const SEAT_COUNT: u8 = 3;

/// Side a seat plays for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Landlord,
    Farmer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Landlord => "landlord",
            Role::Farmer => "farmer",
        }
    }
}

/// Player entity - one seat of a match
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub seat: u8,
    pub role: Role,
    pub hand: Hand,
}

impl Player {
    pub fn new(id: impl Into<String>, seat: u8, role: Role, hand: Hand) -> Self {
        Self {
            id: id.into(),
            seat,
            role,
            hand,
        }
    }

    pub fn is_landlord(&self) -> bool {
        self.role == Role::Landlord
    }
}

/// Seat after `seat` in play order
#[inline]
pub fn next_seat(seat: u8) -> u8 {
    (seat + 1) % SEAT_COUNT
}
