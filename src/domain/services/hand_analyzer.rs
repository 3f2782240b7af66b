//! Hand analyzer
//!
//! Heuristic strength of a hand. The core figure is a greedy decomposition
//! into plays: the fewer moves needed to empty the hand, the stronger it is.

use serde::Serialize;

use crate::domain::entities::{Hand, Rank, RankCounts};

/// Aggregate strength of a hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandScore {
    /// Bombs held, the rocket included
    pub bombs: u8,
    pub has_rocket: bool,
    /// Low singles that neither pair up nor sit inside a straight window
    pub isolated_singles: u8,
    /// Greedy number of plays needed to empty the hand
    pub min_moves: u8,
    pub rank_sum: u32,
}

impl HandScore {
    /// Single comparable figure, higher is stronger
    pub fn strength(&self) -> i32 {
        let control = self.bombs as i32 * 12 + if self.has_rocket { 4 } else { 0 };
        control - self.min_moves as i32 * 10 - self.isolated_singles as i32 * 3
            + self.rank_sum as i32 / 20
    }
}

/// Evaluate a hand
pub fn evaluate(hand: &Hand) -> HandScore {
    evaluate_counts(&hand.rank_counts())
}

pub fn evaluate_counts(counts: &RankCounts) -> HandScore {
    let has_rocket = counts.has_rocket();
    let quads = counts.present().filter(|&(_, c)| c == 4).count() as u8;
    let rank_sum = counts
        .present()
        .map(|(r, c)| r.value() as u32 * c as u32)
        .sum();

    let min_moves = if counts.total() == 0 {
        0
    } else {
        greedy_moves(counts, true).min(greedy_moves(counts, false))
    };

    HandScore {
        bombs: quads + has_rocket as u8,
        has_rocket,
        isolated_singles: isolated_singles(counts),
        min_moves,
        rank_sum,
    }
}

/// Strength of a dealt hand for landlord designation
pub fn claim_score(hand: &Hand) -> i32 {
    let counts = hand.rank_counts();
    let mut score = 0;
    if counts.has_rocket() {
        score += 30;
    } else {
        score += (counts.get(Rank::SmallJoker) + counts.get(Rank::BigJoker)) as i32 * 4;
    }
    for (rank, count) in counts.present() {
        score += match count {
            4 => 25,
            3 => 8,
            2 => 3,
            _ => 0,
        };
        if rank == Rank::Two {
            score += count as i32 * 4;
        }
    }
    score
}

fn isolated_singles(counts: &RankCounts) -> u8 {
    counts
        .present()
        .filter(|&(rank, count)| count == 1 && rank.is_run_rank())
        .filter(|&(rank, _)| !in_straight_window(counts, rank))
        .count() as u8
}

/// Whether `rank` lies inside some 5-wide window of present run ranks
fn in_straight_window(counts: &RankCounts, rank: Rank) -> bool {
    let v = rank.value();
    let lowest = Rank::Three.value();
    let top = Rank::MAX_RUN.value();
    (v.saturating_sub(4).max(lowest)..=v.min(top - 4)).any(|start| {
        (start..start + 5)
            .filter_map(Rank::from_value)
            .all(|r| counts.get(r) > 0)
    })
}

/// Longest run of ranks holding at least `width` cards, removed from `counts`
fn take_longest_run(counts: &mut RankCounts, width: u8, min_len: u8) -> Option<u8> {
    let mut best: Option<(u8, u8)> = None;
    let mut start = Rank::Three.value();
    while start <= Rank::MAX_RUN.value() {
        let mut len = 0u8;
        while let Some(rank) = Rank::from_value(start + len) {
            if !rank.is_run_rank() || counts.get(rank) < width {
                break;
            }
            len += 1;
        }
        if len >= min_len && best.map_or(true, |(_, l)| len > l) {
            best = Some((start, len));
        }
        start += len.max(1);
    }
    let (start, len) = best?;
    for rank in (start..start + len).filter_map(Rank::from_value) {
        counts.take(rank, width);
    }
    Some(len)
}

fn greedy_moves(counts: &RankCounts, with_straights: bool) -> u8 {
    let mut counts = *counts;
    let mut moves = 0u8;

    if counts.has_rocket() {
        counts.take(Rank::SmallJoker, 1);
        counts.take(Rank::BigJoker, 1);
        moves += 1;
    }
    for rank in Rank::ALL {
        if counts.get(rank) == 4 {
            counts.set(rank, 0);
            moves += 1;
        }
    }

    let mut airplanes: Vec<u8> = Vec::new();
    while let Some(len) = take_longest_run(&mut counts, 3, 2) {
        airplanes.push(len);
        moves += 1;
    }
    while take_longest_run(&mut counts, 2, 3).is_some() {
        moves += 1;
    }
    if with_straights {
        while take_longest_run(&mut counts, 1, 5).is_some() {
            moves += 1;
        }
    }

    let mut triples = 0u8;
    let mut pairs = 0u8;
    let mut singles = 0u8;
    for (_, count) in counts.present() {
        match count {
            3 => triples += 1,
            2 => pairs += 1,
            _ => singles += 1,
        }
    }

    // Kickers ride along with airplanes and triples
    for len in airplanes {
        if singles >= len {
            singles -= len;
        } else if pairs >= len {
            pairs -= len;
        }
    }
    for _ in 0..triples {
        if singles > 0 {
            singles -= 1;
        } else if pairs > 0 {
            pairs -= 1;
        }
    }

    moves + triples + pairs + singles
}
