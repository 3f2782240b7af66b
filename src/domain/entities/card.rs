//! Card model
//!
//! Ranks are ordered by Landlord strength: 3 is the lowest, then 4..K, A, 2,
//! and the two jokers on top. Suits never take part in comparison.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Card rank, valued 3..=17
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Rank {
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
    Ace = 14,
    Two = 15,
    SmallJoker = 16,
    BigJoker = 17,
}

impl Rank {
    /// All ranks from weakest to strongest
    pub const ALL: [Rank; 15] = [
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
        Rank::Two,
        Rank::SmallJoker,
        Rank::BigJoker,
    ];

    /// Highest rank allowed inside a run (straights, pair runs, airplanes)
    pub const MAX_RUN: Rank = Rank::Ace;

    #[inline]
    pub const fn value(self) -> u8 {
        self as u8
    }

    pub fn from_value(value: u8) -> Option<Self> {
        if (3..=17).contains(&value) {
            Some(Self::ALL[(value - 3) as usize])
        } else {
            None
        }
    }

    #[inline]
    pub const fn is_joker(self) -> bool {
        matches!(self, Rank::SmallJoker | Rank::BigJoker)
    }

    /// Whether the rank may appear in a straight, pair run or airplane
    #[inline]
    pub const fn is_run_rank(self) -> bool {
        (self as u8) <= Rank::MAX_RUN as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
            Rank::Two => "2",
            Rank::SmallJoker => "SJ",
            Rank::BigJoker => "BJ",
        }
    }

    /// Parse a rank label ("10", "J", "SJ") or a numeric rank value ("11")
    pub fn from_label(s: &str) -> Option<Self> {
        let upper = s.trim().to_uppercase();
        let rank = match upper.as_str() {
            "J" => Rank::Jack,
            "Q" => Rank::Queen,
            "K" => Rank::King,
            "A" => Rank::Ace,
            "2" => Rank::Two,
            "SJ" | "SMALL JOKER" | "SMALLJOKER" => Rank::SmallJoker,
            "BJ" | "BIG JOKER" | "BIGJOKER" => Rank::BigJoker,
            other => {
                let value: u8 = other.parse().ok()?;
                return Self::from_value(value);
            }
        };
        Some(rank)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Suit {
    Spades,
    Hearts,
    Clubs,
    Diamonds,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Clubs, Suit::Diamonds];

    pub fn symbol(self) -> char {
        match self {
            Suit::Spades => '♠',
            Suit::Hearts => '♥',
            Suit::Clubs => '♣',
            Suit::Diamonds => '♦',
        }
    }

    fn index(self) -> u8 {
        match self {
            Suit::Spades => 0,
            Suit::Hearts => 1,
            Suit::Clubs => 2,
            Suit::Diamonds => 3,
        }
    }
}

/// A single playing card. Jokers carry no suit.
///
/// Ordering is by rank first, then suit, so sorted hands group ranks together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Option<Suit>,
}

/// Number of distinct cards in a Landlord deck
pub const CARD_COUNT: u8 = 54;

impl Card {
    /// Suited card; returns `None` for joker ranks
    pub fn new(rank: Rank, suit: Suit) -> Option<Self> {
        if rank.is_joker() {
            None
        } else {
            Some(Self {
                rank,
                suit: Some(suit),
            })
        }
    }

    pub const fn small_joker() -> Self {
        Self {
            rank: Rank::SmallJoker,
            suit: None,
        }
    }

    pub const fn big_joker() -> Self {
        Self {
            rank: Rank::BigJoker,
            suit: None,
        }
    }

    /// Stable id in 0..54: suited cards are `(rank - 3) * 4 + suit`,
    /// then 52 for the small joker and 53 for the big joker.
    pub fn id(&self) -> u8 {
        match (self.rank, self.suit) {
            (Rank::SmallJoker, _) => 52,
            (Rank::BigJoker, _) => 53,
            (rank, Some(suit)) => (rank.value() - 3) * 4 + suit.index(),
            // Suited ranks are always built with a suit
            (rank, None) => (rank.value() - 3) * 4,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            52 => Some(Self::small_joker()),
            53 => Some(Self::big_joker()),
            0..=51 => {
                let rank = Rank::from_value(id / 4 + 3)?;
                Self::new(rank, Suit::ALL[(id % 4) as usize])
            }
            _ => None,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.suit {
            Some(suit) => write!(f, "{}{}", suit.symbol(), self.rank),
            None => write!(f, "{}", self.rank),
        }
    }
}

/// Format a slice of cards as a space separated list
pub fn cards_to_string(cards: &[Card]) -> String {
    if cards.is_empty() {
        return "none".to_string();
    }
    cards
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_order() {
        assert!(Rank::Two > Rank::Ace);
        assert!(Rank::BigJoker > Rank::SmallJoker);
        assert!(Rank::Three < Rank::Four);
        assert_eq!(Rank::from_value(15), Some(Rank::Two));
        assert_eq!(Rank::from_value(2), None);
    }

    #[test]
    fn test_run_ranks() {
        assert!(Rank::Ace.is_run_rank());
        assert!(!Rank::Two.is_run_rank());
        assert!(!Rank::SmallJoker.is_run_rank());
    }

    #[test]
    fn test_card_id_round_trip_is_a_bijection() {
        let mut seen = std::collections::HashSet::new();
        for id in 0..CARD_COUNT {
            let card = Card::from_id(id).unwrap();
            assert_eq!(card.id(), id);
            assert!(seen.insert(card));
        }
        assert_eq!(Card::from_id(54), None);
    }

    #[test]
    fn test_jokers_have_no_suit() {
        assert!(Card::new(Rank::SmallJoker, Suit::Spades).is_none());
        assert_eq!(Card::big_joker().suit, None);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Rank::from_label("10"), Some(Rank::Ten));
        assert_eq!(Rank::from_label("j"), Some(Rank::Jack));
        assert_eq!(Rank::from_label("BJ"), Some(Rank::BigJoker));
        assert_eq!(Rank::from_label("14"), Some(Rank::Ace));
        assert_eq!(Rank::from_label("1"), None);
        let card = Card::new(Rank::Ten, Suit::Hearts).unwrap();
        assert_eq!(card.to_string(), "♥10");
        assert_eq!(Card::small_joker().to_string(), "SJ");
    }
}
