//! Pattern classifier
//!
//! Maps a set of cards to exactly one shape. Shapes are tried in a fixed
//! order and the first structural match wins. The only structural overlap is
//! a twelve-card run of four triples, which also reads as three triples with
//! single wings; the plain airplane comes first.

use serde::Serialize;

use crate::domain::entities::{Card, Rank, RankCounts};
use crate::domain::value_objects::{Pattern, PatternKind};

/// Minimum units per run shape
pub const MIN_STRAIGHT_LEN: u8 = 5;
pub const MIN_PAIR_RUN_LEN: u8 = 3;
pub const MIN_AIRPLANE_LEN: u8 = 2;

/// Classification failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase", tag = "reason", content = "card")]
pub enum ClassificationError {
    #[error("No cards selected")]
    Empty,
    #[error("Card {0} appears more than once")]
    DuplicateCard(Card),
    #[error("Cards do not form a recognized pattern")]
    NotARecognizedPattern,
}

/// Rank profile of the cards being classified
struct Profile<'a> {
    cards: &'a [Card],
    counts: RankCounts,
    /// (rank, count), weakest rank first
    groups: Vec<(Rank, u8)>,
}

impl<'a> Profile<'a> {
    fn new(cards: &'a [Card]) -> Self {
        let counts = RankCounts::from_cards(cards.iter());
        let groups = counts.present().collect();
        Self {
            cards,
            counts,
            groups,
        }
    }

    fn len(&self) -> usize {
        self.cards.len()
    }

    fn pattern(&self, kind: PatternKind, primary: Rank, length: u8) -> Pattern {
        Pattern::new(kind, primary, length, self.cards.to_vec())
    }

    /// Count pattern of the groups, e.g. [3, 1] for a triple with a single
    fn shape(&self) -> Vec<u8> {
        let mut shape: Vec<u8> = self.groups.iter().map(|&(_, c)| c).collect();
        shape.sort_unstable_by(|a, b| b.cmp(a));
        shape
    }

    fn rank_with_count(&self, count: u8) -> Option<Rank> {
        self.groups
            .iter()
            .find(|&&(_, c)| c == count)
            .map(|&(r, _)| r)
    }

    /// Every group has `count` cards and the ranks form one run
    fn uniform_run(&self, count: u8) -> Option<Rank> {
        if self.groups.iter().any(|&(_, c)| c != count) {
            return None;
        }
        let ranks: Vec<Rank> = self.groups.iter().map(|&(r, _)| r).collect();
        if is_consecutive_run(&ranks) {
            ranks.first().copied()
        } else {
            None
        }
    }
}

/// True when `ranks` (ascending) are consecutive run ranks
pub fn is_consecutive_run(ranks: &[Rank]) -> bool {
    if ranks.is_empty() || ranks.iter().any(|r| !r.is_run_rank()) {
        return false;
    }
    ranks
        .windows(2)
        .all(|w| w[1].value() == w[0].value() + 1)
}

/// Highest run of `len` consecutive ranks holding exactly three cards each
fn find_triple_run(counts: &RankCounts, len: u8) -> Option<Rank> {
    let top = Rank::MAX_RUN.value();
    let lowest = Rank::Three.value();
    if len == 0 || top + 1 < lowest + len {
        return None;
    }
    (lowest..=top + 1 - len).rev().find_map(|start| {
        let all_triples = (start..start + len)
            .filter_map(Rank::from_value)
            .all(|r| counts.get(r) == 3);
        if all_triples {
            Rank::from_value(start)
        } else {
            None
        }
    })
}

type Rule = fn(&Profile) -> Option<Pattern>;

/// Fixed precedence order
const RULES: [Rule; 13] = [
    single,
    pair,
    rocket,
    triple,
    bomb,
    triple_with_single,
    triple_with_pair,
    four_with_two,
    straight,
    consecutive_pairs,
    airplane,
    airplane_with_single_wings,
    airplane_with_pair_wings,
];

/// Classify a set of cards
pub fn classify(cards: &[Card]) -> Result<Pattern, ClassificationError> {
    if cards.is_empty() {
        return Err(ClassificationError::Empty);
    }

    let mut sorted = cards.to_vec();
    sorted.sort_unstable();
    if let Some(w) = sorted.windows(2).find(|w| w[0] == w[1]) {
        return Err(ClassificationError::DuplicateCard(w[0]));
    }

    let profile = Profile::new(&sorted);
    RULES
        .iter()
        .find_map(|rule| rule(&profile))
        .ok_or(ClassificationError::NotARecognizedPattern)
}

fn single(p: &Profile) -> Option<Pattern> {
    (p.len() == 1).then(|| p.pattern(PatternKind::Single, p.cards[0].rank, 1))
}

fn pair(p: &Profile) -> Option<Pattern> {
    (p.len() == 2 && p.groups.len() == 1)
        .then(|| p.pattern(PatternKind::Pair, p.groups[0].0, 1))
}

fn rocket(p: &Profile) -> Option<Pattern> {
    (p.len() == 2 && p.counts.has_rocket())
        .then(|| p.pattern(PatternKind::Rocket, Rank::BigJoker, 1))
}

fn triple(p: &Profile) -> Option<Pattern> {
    (p.len() == 3 && p.groups.len() == 1)
        .then(|| p.pattern(PatternKind::Triple, p.groups[0].0, 1))
}

fn bomb(p: &Profile) -> Option<Pattern> {
    (p.len() == 4 && p.groups.len() == 1)
        .then(|| p.pattern(PatternKind::Bomb, p.groups[0].0, 1))
}

fn triple_with_single(p: &Profile) -> Option<Pattern> {
    if p.len() != 4 || p.shape() != [3, 1] {
        return None;
    }
    let rank = p.rank_with_count(3)?;
    Some(p.pattern(PatternKind::TripleWithSingle, rank, 1))
}

fn triple_with_pair(p: &Profile) -> Option<Pattern> {
    if p.len() != 5 || p.shape() != [3, 2] {
        return None;
    }
    let rank = p.rank_with_count(3)?;
    Some(p.pattern(PatternKind::TripleWithPair, rank, 1))
}

fn four_with_two(p: &Profile) -> Option<Pattern> {
    if p.len() != 6 {
        return None;
    }
    let shape = p.shape();
    if shape != [4, 1, 1] && shape != [4, 2] {
        return None;
    }
    let rank = p.rank_with_count(4)?;
    Some(p.pattern(PatternKind::FourWithTwo, rank, 1))
}

fn straight(p: &Profile) -> Option<Pattern> {
    if p.len() < MIN_STRAIGHT_LEN as usize {
        return None;
    }
    let low = p.uniform_run(1)?;
    Some(p.pattern(PatternKind::Straight, low, p.len() as u8))
}

fn consecutive_pairs(p: &Profile) -> Option<Pattern> {
    let units = p.len() / 2;
    if p.len() % 2 != 0 || units < MIN_PAIR_RUN_LEN as usize {
        return None;
    }
    let low = p.uniform_run(2)?;
    Some(p.pattern(PatternKind::ConsecutivePairs, low, units as u8))
}

fn airplane(p: &Profile) -> Option<Pattern> {
    let units = p.len() / 3;
    if p.len() % 3 != 0 || units < MIN_AIRPLANE_LEN as usize {
        return None;
    }
    let low = p.uniform_run(3)?;
    Some(p.pattern(PatternKind::Airplane, low, units as u8))
}

fn airplane_with_single_wings(p: &Profile) -> Option<Pattern> {
    let units = p.len() / 4;
    if p.len() % 4 != 0 || units < MIN_AIRPLANE_LEN as usize {
        return None;
    }
    // Run ranks hold exactly three cards, so the remaining `units` cards
    // never share a triple's rank
    let low = find_triple_run(&p.counts, units as u8)?;
    Some(p.pattern(PatternKind::AirplaneWithWings, low, units as u8))
}

fn airplane_with_pair_wings(p: &Profile) -> Option<Pattern> {
    let units = p.len() / 5;
    if p.len() % 5 != 0 || units < MIN_AIRPLANE_LEN as usize {
        return None;
    }
    let low = find_triple_run(&p.counts, units as u8)?;
    let run_end = low.value() + units as u8;
    let wings_are_pairs = p
        .groups
        .iter()
        .filter(|&&(r, _)| r.value() < low.value() || r.value() >= run_end)
        .all(|&(r, c)| !r.is_joker() && c % 2 == 0);
    wings_are_pairs.then(|| p.pattern(PatternKind::AirplaneWithWings, low, units as u8))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Suit;

    /// Build cards from rank values, cycling suits so repeats stay distinct
    fn cards(values: &[u8]) -> Vec<Card> {
        let mut seen = RankCounts::default();
        values
            .iter()
            .map(|&v| {
                let rank = Rank::from_value(v).unwrap();
                let card = match rank {
                    Rank::SmallJoker => Card::small_joker(),
                    Rank::BigJoker => Card::big_joker(),
                    _ => Card::new(rank, Suit::ALL[seen.get(rank) as usize]).unwrap(),
                };
                seen.add(rank, 1);
                card
            })
            .collect()
    }

    fn kind_of(values: &[u8]) -> Result<(PatternKind, u8, u8), ClassificationError> {
        classify(&cards(values)).map(|p| (p.kind(), p.primary_rank().value(), p.length()))
    }

    #[test]
    fn test_basic_shapes() {
        assert_eq!(kind_of(&[7]), Ok((PatternKind::Single, 7, 1)));
        assert_eq!(kind_of(&[7, 7]), Ok((PatternKind::Pair, 7, 1)));
        assert_eq!(kind_of(&[7, 7, 7]), Ok((PatternKind::Triple, 7, 1)));
        assert_eq!(kind_of(&[7, 7, 7, 3]), Ok((PatternKind::TripleWithSingle, 7, 1)));
        assert_eq!(kind_of(&[3, 3, 3, 4, 4]), Ok((PatternKind::TripleWithPair, 3, 1)));
        assert_eq!(kind_of(&[15, 15, 15, 15]), Ok((PatternKind::Bomb, 15, 1)));
        assert_eq!(kind_of(&[16, 17]), Ok((PatternKind::Rocket, 17, 1)));
    }

    #[test]
    fn test_runs() {
        assert_eq!(kind_of(&[3, 4, 5, 6, 7]), Ok((PatternKind::Straight, 3, 5)));
        assert_eq!(
            kind_of(&[10, 11, 12, 13, 14, 9]),
            Ok((PatternKind::Straight, 9, 6))
        );
        assert_eq!(
            kind_of(&[3, 3, 4, 4, 5, 5]),
            Ok((PatternKind::ConsecutivePairs, 3, 3))
        );
        assert_eq!(kind_of(&[3, 3, 3, 4, 4, 4]), Ok((PatternKind::Airplane, 3, 2)));
    }

    #[test]
    fn test_runs_reject_two_and_jokers() {
        assert_eq!(
            kind_of(&[11, 12, 13, 14, 15]),
            Err(ClassificationError::NotARecognizedPattern)
        );
        assert_eq!(
            kind_of(&[13, 13, 14, 14, 15, 15]),
            Err(ClassificationError::NotARecognizedPattern)
        );
        assert_eq!(
            kind_of(&[14, 14, 14, 15, 15, 15]),
            Err(ClassificationError::NotARecognizedPattern)
        );
    }

    #[test]
    fn test_airplane_wings() {
        assert_eq!(
            kind_of(&[3, 3, 3, 4, 4, 4, 9, 11]),
            Ok((PatternKind::AirplaneWithWings, 3, 2))
        );
        assert_eq!(
            kind_of(&[3, 3, 3, 4, 4, 4, 9, 9, 11, 11]),
            Ok((PatternKind::AirplaneWithWings, 3, 2))
        );
        // Three single wings that happen to share a rank
        assert_eq!(
            kind_of(&[3, 3, 3, 4, 4, 4, 5, 5, 5, 7, 7, 7]),
            Ok((PatternKind::AirplaneWithWings, 3, 3))
        );
        // Four consecutive triples are a plain airplane, not wings
        assert_eq!(
            kind_of(&[3, 3, 3, 4, 4, 4, 5, 5, 5, 6, 6, 6]),
            Ok((PatternKind::Airplane, 3, 4))
        );
        // Wing sharing a triple's rank
        assert_eq!(
            kind_of(&[3, 3, 3, 3, 4, 4, 4, 9]),
            Err(ClassificationError::NotARecognizedPattern)
        );
        // Pair wings may not be made of jokers
        assert_eq!(
            kind_of(&[3, 3, 3, 4, 4, 4, 16, 17, 9, 9]),
            Err(ClassificationError::NotARecognizedPattern)
        );
    }

    #[test]
    fn test_four_with_two() {
        assert_eq!(kind_of(&[8, 8, 8, 8, 3, 5]), Ok((PatternKind::FourWithTwo, 8, 1)));
        assert_eq!(kind_of(&[8, 8, 8, 8, 3, 3]), Ok((PatternKind::FourWithTwo, 8, 1)));
        assert_eq!(
            kind_of(&[8, 8, 8, 8, 3, 3, 5, 5]),
            Err(ClassificationError::NotARecognizedPattern)
        );
    }

    #[test]
    fn test_rejections() {
        assert_eq!(classify(&[]), Err(ClassificationError::Empty));
        assert_eq!(kind_of(&[3, 4]), Err(ClassificationError::NotARecognizedPattern));
        assert_eq!(kind_of(&[7, 7, 3, 4]), Err(ClassificationError::NotARecognizedPattern));
        assert_eq!(kind_of(&[3, 4, 5, 6]), Err(ClassificationError::NotARecognizedPattern));
        assert_eq!(kind_of(&[3, 3, 4, 4]), Err(ClassificationError::NotARecognizedPattern));
        let c = Card::new(Rank::Five, Suit::Hearts).unwrap();
        assert_eq!(classify(&[c, c]), Err(ClassificationError::DuplicateCard(c)));
    }

    #[test]
    fn test_classify_is_order_independent() {
        let mut forward = cards(&[9, 10, 11, 12, 13]);
        let a = classify(&forward).unwrap();
        forward.reverse();
        let b = classify(&forward).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_long_airplanes() {
        // 16 cards: four triples with four single wings
        assert_eq!(
            kind_of(&[3, 3, 3, 4, 4, 4, 5, 5, 5, 6, 6, 6, 9, 10, 11, 12]),
            Ok((PatternKind::AirplaneWithWings, 3, 4))
        );
        // 20 cards: four triples with four pair wings
        assert_eq!(
            kind_of(&[3, 3, 3, 4, 4, 4, 5, 5, 5, 6, 6, 6, 8, 8, 9, 9, 10, 10, 12, 12]),
            Ok((PatternKind::AirplaneWithWings, 3, 4))
        );
        // 20 cards: five triples with five single wings
        assert_eq!(
            kind_of(&[3, 3, 3, 4, 4, 4, 5, 5, 5, 6, 6, 6, 7, 7, 7, 9, 10, 11, 12, 13]),
            Ok((PatternKind::AirplaneWithWings, 3, 5))
        );
        assert_eq!(
            kind_of(&[3, 3, 3, 4, 4, 4, 5, 5, 5, 6, 6, 6, 7, 7, 7]),
            Ok((PatternKind::Airplane, 3, 5))
        );
        // Five triples and a single: the top four triples fly, the lowest
        // triple and the single are the wings
        assert_eq!(
            kind_of(&[3, 3, 3, 4, 4, 4, 5, 5, 5, 6, 6, 6, 7, 7, 7, 9]),
            Ok((PatternKind::AirplaneWithWings, 4, 4))
        );
        // A quad inside the run is not a triple
        assert_eq!(
            kind_of(&[3, 3, 3, 3, 4, 4, 4, 5, 5, 5, 6, 6, 6, 8, 8, 9, 9, 10, 10, 11]),
            Err(ClassificationError::NotARecognizedPattern)
        );
        // Pair wings must all be pairs
        assert_eq!(
            kind_of(&[3, 3, 3, 4, 4, 4, 5, 5, 5, 6, 6, 6, 8, 8, 9, 9, 10, 10, 11, 12]),
            Err(ClassificationError::NotARecognizedPattern)
        );
    }

    /// Every non-empty subset of `hand` matches at most one rule
    fn assert_single_interpretation(hand: &[Card]) {
        for mask in 1u32..(1 << hand.len()) {
            let mut subset: Vec<Card> = (0..hand.len())
                .filter(|i| mask & (1 << i) != 0)
                .map(|i| hand[i])
                .collect();
            subset.sort_unstable();
            let profile = Profile::new(&subset);
            let matches = RULES
                .iter()
                .filter_map(|rule| rule(&profile).map(|p| p.kind()))
                .collect::<Vec<_>>();
            // Four consecutive triples also read as three triples with wings
            let overlap = matches == [PatternKind::Airplane, PatternKind::AirplaneWithWings];
            assert!(
                matches.len() <= 1 || overlap,
                "subset {:?} matched {:?}",
                subset,
                matches
            );
        }
    }

    #[test]
    fn test_every_small_subset_has_one_interpretation() {
        assert_single_interpretation(&cards(&[3, 3, 3, 4, 4, 4, 5, 6, 16, 17]));
    }

    #[test]
    fn test_airplane_heavy_subsets_have_one_interpretation() {
        assert_single_interpretation(&cards(&[3, 3, 3, 4, 4, 4, 5, 5, 5, 6, 6, 6, 7, 7]));
    }
}
