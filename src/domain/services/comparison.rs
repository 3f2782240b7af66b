//! Comparison engine - decides whether a play beats the table

use crate::domain::value_objects::{Pattern, PatternKind};

/// Whether `challenger` may be played on top of `table`
///
/// An open table (`None`) accepts any pattern. The rocket beats everything,
/// a bomb beats every ordinary shape and bombs compare by rank. Any other
/// pairing needs the same shape, the same length and card count, and a
/// strictly higher primary rank.
pub fn beats(challenger: &Pattern, table: Option<&Pattern>) -> bool {
    let Some(table) = table else {
        return true;
    };

    match (challenger.kind(), table.kind()) {
        (_, PatternKind::Rocket) => false,
        (PatternKind::Rocket, _) => true,
        (PatternKind::Bomb, PatternKind::Bomb) => {
            challenger.primary_rank() > table.primary_rank()
        }
        (PatternKind::Bomb, _) => true,
        (_, PatternKind::Bomb) => false,
        (kind, table_kind) => {
            kind == table_kind
                && challenger.length() == table.length()
                && challenger.card_count() == table.card_count()
                && challenger.primary_rank() > table.primary_rank()
        }
    }
}

/// Human readable reason `challenger` does not beat `table`, if it doesn't
pub fn explain_loss(challenger: &Pattern, table: &Pattern) -> Option<String> {
    if beats(challenger, Some(table)) {
        return None;
    }
    let reason = match (challenger.kind(), table.kind()) {
        (_, PatternKind::Rocket) => "nothing beats a rocket".to_string(),
        (PatternKind::Bomb, PatternKind::Bomb) => format!(
            "bomb of {} is not higher than bomb of {}",
            challenger.primary_rank(),
            table.primary_rank()
        ),
        (_, PatternKind::Bomb) => "only a higher bomb or the rocket beats a bomb".to_string(),
        (kind, table_kind) if kind != table_kind => format!(
            "{} cannot answer {}; play a {} or a bomb",
            kind, table_kind, table_kind
        ),
        _ if challenger.length() != table.length()
            || challenger.card_count() != table.card_count() =>
        {
            format!(
                "length must match: table has {} cards, you played {}",
                table.card_count(),
                challenger.card_count()
            )
        }
        _ => format!(
            "rank {} is not higher than {}",
            challenger.primary_rank(),
            table.primary_rank()
        ),
    };
    Some(reason)
}
