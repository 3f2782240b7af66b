//! Move generator
//!
//! Builds candidate plays per shape family straight from the hand's rank
//! counts instead of walking every subset. Every candidate is passed back
//! through the classifier so generated patterns are exactly what `classify`
//! would produce for the same cards, then filtered with `beats`.

use std::collections::HashSet;

use smallvec::SmallVec;

use super::classifier::{classify, MIN_AIRPLANE_LEN, MIN_PAIR_RUN_LEN, MIN_STRAIGHT_LEN};
use super::comparison::beats;
use crate::domain::entities::{Card, Hand, Rank, RankCounts};
use crate::domain::value_objects::{Pattern, PatternKind};

/// Families in engine order
const LEAD_FAMILIES: [PatternKind; 12] = [
    PatternKind::Single,
    PatternKind::Pair,
    PatternKind::Triple,
    PatternKind::TripleWithSingle,
    PatternKind::TripleWithPair,
    PatternKind::Straight,
    PatternKind::ConsecutivePairs,
    PatternKind::Airplane,
    PatternKind::AirplaneWithWings,
    PatternKind::FourWithTwo,
    PatternKind::Bomb,
    PatternKind::Rocket,
];

/// Which families can possibly answer `table`
fn families_for(table: Option<&Pattern>) -> SmallVec<[PatternKind; 12]> {
    match table.map(Pattern::kind) {
        None => LEAD_FAMILIES.iter().copied().collect(),
        Some(PatternKind::Rocket) => SmallVec::new(),
        Some(PatternKind::Bomb) => [PatternKind::Bomb, PatternKind::Rocket].into_iter().collect(),
        Some(kind) => [kind, PatternKind::Bomb, PatternKind::Rocket].into_iter().collect(),
    }
}

/// Legal responses of `hand` to `table` (or every latent play when leading)
///
/// The sequence is lazy per family and must be regenerated after the hand
/// changes.
pub fn legal_responses<'a>(
    hand: &'a Hand,
    table: Option<&'a Pattern>,
) -> impl Iterator<Item = Pattern> + 'a {
    let counts = hand.rank_counts();
    // Runs answering a table only need the table's length
    let length_hint = table.filter(|t| t.kind().is_run()).map(Pattern::length);
    families_for(table)
        .into_iter()
        .flat_map(move |kind| generate_family(hand, &counts, kind, length_hint))
        .filter(move |pattern| beats(pattern, table))
}

/// Every play latent in `hand`
pub fn all_patterns(hand: &Hand) -> Vec<Pattern> {
    legal_responses(hand, None).collect()
}

/// Whether `hand` holds anything that beats `table`
pub fn can_beat(hand: &Hand, table: &Pattern) -> bool {
    legal_responses(hand, Some(table)).next().is_some()
}

fn generate_family(
    hand: &Hand,
    counts: &RankCounts,
    kind: PatternKind,
    length_hint: Option<u8>,
) -> Vec<Pattern> {
    let mut gen = Generator {
        hand,
        counts,
        kind,
        seen: HashSet::new(),
        out: Vec::new(),
    };
    match kind {
        PatternKind::Single => gen.sets_of(1),
        PatternKind::Pair => gen.sets_of(2),
        PatternKind::Triple => gen.sets_of(3),
        PatternKind::Bomb => gen.sets_of(4),
        PatternKind::Rocket => gen.rocket(),
        PatternKind::TripleWithSingle => gen.with_kickers(3, 1, 1),
        PatternKind::TripleWithPair => gen.with_kickers(3, 1, 2),
        PatternKind::FourWithTwo => gen.with_kickers(4, 2, 1),
        PatternKind::Straight => gen.runs(1, MIN_STRAIGHT_LEN, length_hint, None),
        PatternKind::ConsecutivePairs => gen.runs(2, MIN_PAIR_RUN_LEN, length_hint, None),
        PatternKind::Airplane => gen.runs(3, MIN_AIRPLANE_LEN, length_hint, None),
        PatternKind::AirplaneWithWings => {
            gen.runs(3, MIN_AIRPLANE_LEN, length_hint, Some(1));
            gen.runs(3, MIN_AIRPLANE_LEN, length_hint, Some(2));
        }
    }
    gen.out
}

struct Generator<'a> {
    hand: &'a Hand,
    counts: &'a RankCounts,
    kind: PatternKind,
    seen: HashSet<Vec<Card>>,
    out: Vec<Pattern>,
}

impl Generator<'_> {
    /// Classify a candidate and keep it when it lands in the family being built
    fn emit(&mut self, cards: Vec<Card>) {
        let Ok(pattern) = classify(&cards) else {
            return;
        };
        // Long winged airplanes can be reached from two different runs
        if pattern.kind() == self.kind && self.seen.insert(pattern.cards().to_vec()) {
            self.out.push(pattern);
        }
    }

    fn cards_of(&self, rank: Rank, count: u8) -> SmallVec<[Card; 4]> {
        self.hand.take_rank(rank, count as usize)
    }

    /// `size` cards of one rank, weakest rank first
    fn sets_of(&mut self, size: u8) {
        for (rank, count) in self.counts.present().collect::<Vec<_>>() {
            if count >= size {
                let cards = self.cards_of(rank, size).to_vec();
                self.emit(cards);
            }
        }
    }

    fn rocket(&mut self) {
        if self.counts.has_rocket() {
            self.emit(vec![Card::small_joker(), Card::big_joker()]);
        }
    }

    /// A core of `core` cards plus `kickers` units of `unit` cards each.
    /// Single kickers may come from one rank, which covers four-with-a-pair.
    fn with_kickers(&mut self, core: u8, kickers: u8, unit: u8) {
        for (rank, count) in self.counts.present().collect::<Vec<_>>() {
            if count < core {
                continue;
            }
            let base = self.cards_of(rank, core).to_vec();
            let available = self.kicker_pool(&[rank], unit);
            for choice in choose_units(&available, kickers) {
                let mut cards = base.clone();
                for &(kicker_rank, units) in &choice {
                    cards.extend(self.cards_of(kicker_rank, units * unit));
                }
                self.emit(cards);
            }
        }
    }

    /// Ranks usable as kickers (excluding `reserved`) with how many units of
    /// `unit` cards each can supply
    fn kicker_pool(&self, reserved: &[Rank], unit: u8) -> Vec<(Rank, u8)> {
        self.counts
            .present()
            .filter(|(rank, _)| !reserved.contains(rank))
            .filter(|(rank, _)| unit == 1 || !rank.is_joker())
            .map(|(rank, count)| (rank, count / unit))
            .filter(|&(_, units)| units > 0)
            .collect()
    }

    /// Runs of `width` cards per rank, optionally winged with one kicker unit
    /// of `wing` cards per run rank
    fn runs(&mut self, width: u8, min_len: u8, length_hint: Option<u8>, wing: Option<u8>) {
        let lowest = Rank::Three.value();
        let top = Rank::MAX_RUN.value();
        for start in lowest..=top {
            let mut len = 0u8;
            while let Some(rank) = Rank::from_value(start + len) {
                if !rank.is_run_rank() || self.counts.get(rank) < width {
                    break;
                }
                len += 1;
                if len < min_len || length_hint.map_or(false, |hint| hint != len) {
                    continue;
                }
                let run: Vec<Rank> = (start..start + len).filter_map(Rank::from_value).collect();
                self.emit_run(&run, width, wing);
            }
        }
    }

    fn emit_run(&mut self, run: &[Rank], width: u8, wing: Option<u8>) {
        let mut base = Vec::with_capacity(run.len() * width as usize);
        for &rank in run {
            base.extend(self.cards_of(rank, width));
        }
        let Some(unit) = wing else {
            self.emit(base);
            return;
        };
        let available = self.kicker_pool(run, unit);
        for choice in choose_units(&available, run.len() as u8) {
            let mut cards = base.clone();
            for &(rank, units) in &choice {
                cards.extend(self.cards_of(rank, units * unit));
            }
            self.emit(cards);
        }
    }
}

/// Every way of picking `k` units from `pool` where each rank offers up to
/// its count of units; returns (rank, units taken) lists
fn choose_units(pool: &[(Rank, u8)], k: u8) -> Vec<Vec<(Rank, u8)>> {
    fn recurse(
        pool: &[(Rank, u8)],
        k: u8,
        current: &mut Vec<(Rank, u8)>,
        out: &mut Vec<Vec<(Rank, u8)>>,
    ) {
        if k == 0 {
            out.push(current.clone());
            return;
        }
        let Some((&(rank, available), rest)) = pool.split_first() else {
            return;
        };
        for take in (0..=available.min(k)).rev() {
            if take > 0 {
                current.push((rank, take));
            }
            recurse(rest, k - take, current, out);
            if take > 0 {
                current.pop();
            }
        }
    }

    let mut out = Vec::new();
    recurse(pool, k, &mut Vec::new(), &mut out);
    out
}
