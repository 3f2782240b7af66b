//! Deck construction and distribution

use rand::seq::SliceRandom;
use rand::Rng;

use super::card::{Card, Rank, Suit, CARD_COUNT};

/// Cards dealt to every seat before the landlord takes the bottom cards
pub const BASE_HAND_SIZE: usize = 17;
/// Reserved cards handed to the landlord
pub const BOTTOM_CARD_COUNT: usize = 3;

/// The 54-card Landlord deck
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

/// Three 17-card hands plus the 3 bottom cards
#[derive(Debug, Clone)]
pub struct Deal {
    pub hands: [Vec<Card>; 3],
    pub bottom: Vec<Card>,
}

impl Deck {
    /// Unshuffled deck: 52 suited cards followed by the two jokers
    pub fn standard() -> Self {
        let mut cards = Vec::with_capacity(CARD_COUNT as usize);
        for rank in Rank::ALL.iter().copied().filter(|r| !r.is_joker()) {
            for suit in Suit::ALL {
                if let Some(card) = Card::new(rank, suit) {
                    cards.push(card);
                }
            }
        }
        cards.push(Card::small_joker());
        cards.push(Card::big_joker());
        Self { cards }
    }

    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::standard();
        deck.cards.shuffle(rng);
        deck
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Split into three hands of 17 in deck order plus the 3 bottom cards
    pub fn deal(self) -> Deal {
        let mut iter = self.cards.into_iter();
        let mut hands: [Vec<Card>; 3] = Default::default();
        for hand in hands.iter_mut() {
            hand.extend(iter.by_ref().take(BASE_HAND_SIZE));
        }
        let bottom = iter.collect();
        Deal { hands, bottom }
    }
}
