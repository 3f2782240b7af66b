//! Pattern - a classified card combination
//!
//! Patterns are only produced by the classifier, so a `Pattern` value is
//! always a complete, valid shape.

use std::fmt;

use serde::Serialize;

use crate::domain::entities::{cards_to_string, Card, Rank};

/// Shape of a play
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PatternKind {
    Single,
    Pair,
    Triple,
    TripleWithSingle,
    TripleWithPair,
    Straight,
    ConsecutivePairs,
    Airplane,
    AirplaneWithWings,
    FourWithTwo,
    Bomb,
    Rocket,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::Single => "single",
            PatternKind::Pair => "pair",
            PatternKind::Triple => "triple",
            PatternKind::TripleWithSingle => "tripleWithSingle",
            PatternKind::TripleWithPair => "tripleWithPair",
            PatternKind::Straight => "straight",
            PatternKind::ConsecutivePairs => "consecutivePairs",
            PatternKind::Airplane => "airplane",
            PatternKind::AirplaneWithWings => "airplaneWithWings",
            PatternKind::FourWithTwo => "fourWithTwo",
            PatternKind::Bomb => "bomb",
            PatternKind::Rocket => "rocket",
        }
    }

    /// Human readable name used in logs and provider feedback
    pub fn display_name(&self) -> &'static str {
        match self {
            PatternKind::Single => "Single",
            PatternKind::Pair => "Pair",
            PatternKind::Triple => "Triple",
            PatternKind::TripleWithSingle => "Triple with single",
            PatternKind::TripleWithPair => "Triple with pair",
            PatternKind::Straight => "Straight",
            PatternKind::ConsecutivePairs => "Consecutive pairs",
            PatternKind::Airplane => "Airplane",
            PatternKind::AirplaneWithWings => "Airplane with wings",
            PatternKind::FourWithTwo => "Four with two",
            PatternKind::Bomb => "Bomb",
            PatternKind::Rocket => "Rocket",
        }
    }

    /// Bombs and the rocket override ordinary shape matching
    #[inline]
    pub fn is_bomb_like(&self) -> bool {
        matches!(self, PatternKind::Bomb | PatternKind::Rocket)
    }

    /// Shapes whose length counts run units (ranks in a run)
    pub fn is_run(&self) -> bool {
        matches!(
            self,
            PatternKind::Straight
                | PatternKind::ConsecutivePairs
                | PatternKind::Airplane
                | PatternKind::AirplaneWithWings
        )
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A valid play: shape, comparable rank, unit length and the exact cards
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    kind: PatternKind,
    primary_rank: Rank,
    length: u8,
    cards: Vec<Card>,
}

impl Pattern {
    pub(crate) fn new(kind: PatternKind, primary_rank: Rank, length: u8, mut cards: Vec<Card>) -> Self {
        cards.sort_unstable();
        Self {
            kind,
            primary_rank,
            length,
            cards,
        }
    }

    #[inline]
    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    #[inline]
    pub fn primary_rank(&self) -> Rank {
        self.primary_rank
    }

    /// Number of primary units (run length for runs, 1 otherwise)
    #[inline]
    pub fn length(&self) -> u8 {
        self.length
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[inline]
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    #[inline]
    pub fn is_bomb_like(&self) -> bool {
        self.kind.is_bomb_like()
    }

    /// Sum of rank values, used to order otherwise similar plays
    pub fn rank_sum(&self) -> u32 {
        self.cards.iter().map(|c| c.rank.value() as u32).sum()
    }

    /// Short description such as "Pair of 5" or "Straight 3-7"
    pub fn describe(&self) -> String {
        if self.kind.is_run() && self.length > 1 {
            let top = Rank::from_value(self.primary_rank.value() + self.length - 1)
                .unwrap_or(self.primary_rank);
            format!("{} {}-{}", self.kind, self.primary_rank, top)
        } else if self.kind == PatternKind::Rocket {
            "Rocket".to_string()
        } else {
            format!("{} of {}", self.kind, self.primary_rank)
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.describe(), cards_to_string(&self.cards))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Suit;

    #[test]
    fn test_describe() {
        let cards: Vec<Card> = [Rank::Three, Rank::Four, Rank::Five, Rank::Six, Rank::Seven]
            .into_iter()
            .map(|r| Card::new(r, Suit::Spades).unwrap())
            .collect();
        let straight = Pattern::new(PatternKind::Straight, Rank::Three, 5, cards);
        assert_eq!(straight.describe(), "Straight 3-7");
        assert_eq!(straight.rank_sum(), 25);

        let pair = Pattern::new(
            PatternKind::Pair,
            Rank::Five,
            1,
            vec![
                Card::new(Rank::Five, Suit::Hearts).unwrap(),
                Card::new(Rank::Five, Suit::Spades).unwrap(),
            ],
        );
        assert_eq!(pair.describe(), "Pair of 5");
        assert!(!pair.is_bomb_like());
    }
}
