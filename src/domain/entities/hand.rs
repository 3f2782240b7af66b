//! Hand - a seat's multiset of cards

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::card::{Card, Rank};

/// Largest hand in the game (landlord after taking the bottom cards)
pub const MAX_HAND_SIZE: usize = 20;

/// Per-rank card counts, indexed by rank value (3..=17)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RankCounts([u8; 18]);

impl RankCounts {
    pub fn from_cards<'a, I: IntoIterator<Item = &'a Card>>(cards: I) -> Self {
        let mut counts = Self::default();
        for card in cards {
            counts.0[card.rank.value() as usize] += 1;
        }
        counts
    }

    #[inline]
    pub fn get(&self, rank: Rank) -> u8 {
        self.0[rank.value() as usize]
    }

    #[inline]
    pub fn set(&mut self, rank: Rank, count: u8) {
        self.0[rank.value() as usize] = count;
    }

    pub fn add(&mut self, rank: Rank, count: u8) {
        self.0[rank.value() as usize] += count;
    }

    pub fn take(&mut self, rank: Rank, count: u8) {
        let slot = &mut self.0[rank.value() as usize];
        *slot = slot.saturating_sub(count);
    }

    pub fn total(&self) -> usize {
        self.0.iter().map(|&c| c as usize).sum()
    }

    /// Ranks present at least once, weakest first
    pub fn present(&self) -> impl Iterator<Item = (Rank, u8)> + '_ {
        Rank::ALL
            .iter()
            .copied()
            .map(move |r| (r, self.get(r)))
            .filter(|&(_, c)| c > 0)
    }

    pub fn has_rocket(&self) -> bool {
        self.get(Rank::SmallJoker) > 0 && self.get(Rank::BigJoker) > 0
    }
}

/// A seat's cards, kept sorted by rank then suit
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hand {
    cards: SmallVec<[Card; MAX_HAND_SIZE]>,
}

impl Hand {
    pub fn new<I: IntoIterator<Item = Card>>(cards: I) -> Self {
        let mut hand = Self {
            cards: cards.into_iter().collect(),
        };
        hand.cards.sort_unstable();
        hand
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn contains(&self, card: &Card) -> bool {
        self.cards.binary_search(card).is_ok()
    }

    /// Cards from `cards` that this hand does not hold
    pub fn missing(&self, cards: &[Card]) -> Vec<Card> {
        cards.iter().copied().filter(|c| !self.contains(c)).collect()
    }

    pub fn contains_all(&self, cards: &[Card]) -> bool {
        cards.iter().all(|c| self.contains(c))
    }

    pub fn add_cards<I: IntoIterator<Item = Card>>(&mut self, cards: I) {
        self.cards.extend(cards);
        self.cards.sort_unstable();
    }

    /// Remove every card in `cards`; callers check ownership first
    pub fn remove_cards(&mut self, cards: &[Card]) {
        for card in cards {
            if let Ok(pos) = self.cards.binary_search(card) {
                self.cards.remove(pos);
            }
        }
    }

    /// Copy of the hand without `cards`
    pub fn without(&self, cards: &[Card]) -> Hand {
        let mut next = self.clone();
        next.remove_cards(cards);
        next
    }

    pub fn rank_counts(&self) -> RankCounts {
        RankCounts::from_cards(self.cards.iter())
    }

    /// Up to `count` concrete cards of `rank`, lowest suit first
    pub fn take_rank(&self, rank: Rank, count: usize) -> SmallVec<[Card; 4]> {
        self.cards
            .iter()
            .copied()
            .filter(|c| c.rank == rank)
            .take(count)
            .collect()
    }
}
