//! Game service - the trick/turn state machine
//!
//! All rule enforcement for a match lives here. The `execute_*` functions
//! validate fully before touching the state, so a rejected action leaves it
//! exactly as it was. `apply_*` are the functional wrappers used by transport
//! layers that prefer to keep the previous snapshot around.

use chrono::Utc;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use super::classifier::{classify, ClassificationError};
use super::comparison::beats;
use super::hand_analyzer::claim_score;
use super::move_generator::legal_responses;
use crate::domain::entities::{
    cards_to_string, next_seat, Card, Deck, Hand, Role, BASE_HAND_SIZE, SEAT_COUNT,
};
use crate::domain::value_objects::{
    GameResult, GameState, HistoryEntry, Pattern, Phase, TableState, TurnAction,
};

/// How the landlord seat is chosen at deal time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandlordSelection {
    /// Always the given seat
    Fixed(u8),
    /// Seat whose 17 dealt cards score highest by `claim_score`, lowest seat on ties
    StrongestHand,
}

impl Default for LandlordSelection {
    fn default() -> Self {
        LandlordSelection::StrongestHand
    }
}

/// Rule violation for a play or pass
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("Not your turn: seat {expected} is to act, seat {actual} tried")]
    NotYourTurn { expected: u8, actual: u8 },
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] ClassificationError),
    #[error("Cards not in hand: {}", cards_to_string(.0))]
    CardsNotInHand(Vec<Card>),
    #[error("{played} does not beat {table}")]
    MustBeatOrLead { table: Pattern, played: Pattern },
    #[error("Cannot pass while leading an open trick")]
    IllegalPass,
    #[error("Invalid seat {0}")]
    InvalidSeat(u8),
    #[error("Game is not in progress (phase: {0})")]
    GameNotInProgress(Phase),
}

impl MoveError {
    /// Stable code for transport layers
    pub fn code(&self) -> &'static str {
        match self {
            MoveError::NotYourTurn { .. } => "NOT_YOUR_TURN",
            MoveError::InvalidPattern(_) => "INVALID_PATTERN",
            MoveError::CardsNotInHand(_) => "CARDS_NOT_IN_HAND",
            MoveError::MustBeatOrLead { .. } => "MUST_BEAT_OR_LEAD",
            MoveError::IllegalPass => "ILLEGAL_PASS",
            MoveError::InvalidSeat(_) => "INVALID_SEAT",
            MoveError::GameNotInProgress(_) => "GAME_NOT_IN_PROGRESS",
        }
    }
}

/// Failure to set up a match
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DealError {
    #[error("Invalid landlord seat {0}")]
    InvalidSeat(u8),
    #[error("Card {0} is dealt more than once")]
    DuplicateCard(Card),
    #[error("Seat {0} has no cards")]
    EmptyHand(u8),
}

/// Shuffle with `rng`, deal 17 cards each, pick the landlord and give it the
/// bottom cards. The landlord leads the first trick.
pub fn deal<R: Rng + ?Sized>(
    rng: &mut R,
    selection: LandlordSelection,
) -> Result<GameState, DealError> {
    let mut state = GameState::new();
    let deal = Deck::shuffled(rng).deal();

    let landlord = match selection {
        LandlordSelection::Fixed(seat) if seat < SEAT_COUNT => seat,
        LandlordSelection::Fixed(seat) => return Err(DealError::InvalidSeat(seat)),
        LandlordSelection::StrongestHand => strongest_seat(&deal.hands),
    };

    for (seat, cards) in deal.hands.into_iter().enumerate() {
        debug_assert_eq!(cards.len(), BASE_HAND_SIZE);
        state.players[seat].hand = Hand::new(cards);
    }
    state.bottom_cards = deal.bottom;
    let bottom = state.bottom_cards.clone();
    state.get_hand_mut(landlord).add_cards(bottom);

    begin(&mut state, landlord);
    info!(
        game_id = %state.id,
        landlord,
        bottom = %cards_to_string(&state.bottom_cards),
        "Match dealt"
    );
    Ok(state)
}

/// Deal from a seeded ChaCha8 stream
pub fn deal_with_seed(seed: u64, selection: LandlordSelection) -> Result<GameState, DealError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    deal(&mut rng, selection)
}

/// Start a match from prepared hands (the landlord's hand already includes
/// any bonus cards). Used for replays, puzzles and tests.
pub fn start_with_hands(hands: [Vec<Card>; 3], landlord: u8) -> Result<GameState, DealError> {
    if landlord >= SEAT_COUNT {
        return Err(DealError::InvalidSeat(landlord));
    }
    let mut all: Vec<Card> = hands.iter().flatten().copied().collect();
    all.sort_unstable();
    if let Some(w) = all.windows(2).find(|w| w[0] == w[1]) {
        return Err(DealError::DuplicateCard(w[0]));
    }
    if let Some(seat) = hands.iter().position(Vec::is_empty) {
        return Err(DealError::EmptyHand(seat as u8));
    }

    let mut state = GameState::new();
    for (seat, cards) in hands.into_iter().enumerate() {
        state.players[seat].hand = Hand::new(cards);
    }
    begin(&mut state, landlord);
    Ok(state)
}

fn strongest_seat(hands: &[Vec<Card>; 3]) -> u8 {
    let mut best = (0u8, i32::MIN);
    for (seat, cards) in hands.iter().enumerate() {
        let score = claim_score(&Hand::new(cards.iter().copied()));
        if score > best.1 {
            best = (seat as u8, score);
        }
    }
    best.0
}

/// Assign roles and move from Dealing to Playing
fn begin(state: &mut GameState, landlord: u8) {
    state.landlord = landlord;
    for player in state.players.iter_mut() {
        player.role = if player.seat == landlord {
            Role::Landlord
        } else {
            Role::Farmer
        };
    }
    state.current_turn = landlord;
    state.table = TableState::default();
    state.phase = Phase::Playing;
}

fn ensure_can_act(state: &GameState, seat: u8) -> Result<(), MoveError> {
    if state.phase != Phase::Playing {
        return Err(MoveError::GameNotInProgress(state.phase));
    }
    if seat >= SEAT_COUNT {
        return Err(MoveError::InvalidSeat(seat));
    }
    if seat != state.current_turn {
        return Err(MoveError::NotYourTurn {
            expected: state.current_turn,
            actual: seat,
        });
    }
    Ok(())
}

/// Validate a play without changing anything
pub fn validate_play(state: &GameState, seat: u8, cards: &[Card]) -> Result<Pattern, MoveError> {
    ensure_can_act(state, seat)?;
    let pattern = classify(cards)?;

    let missing = state.get_hand(seat).missing(pattern.cards());
    if !missing.is_empty() {
        return Err(MoveError::CardsNotInHand(missing));
    }

    if let Some(table) = state.table_pattern() {
        if !beats(&pattern, Some(table)) {
            return Err(MoveError::MustBeatOrLead {
                table: table.clone(),
                played: pattern,
            });
        }
    }
    Ok(pattern)
}

/// Validate a pass without changing anything
pub fn validate_pass(state: &GameState, seat: u8) -> Result<(), MoveError> {
    ensure_can_act(state, seat)?;
    if state.table.is_open() {
        return Err(MoveError::IllegalPass);
    }
    Ok(())
}

fn record(state: &mut GameState, seat: u8, action: TurnAction) {
    state.turn_number += 1;
    state.history.push(HistoryEntry {
        seat,
        action,
        turn: state.turn_number,
        timestamp: Utc::now().timestamp_millis(),
    });
}

/// Execute a play in place
pub fn execute_play(state: &mut GameState, seat: u8, cards: &[Card]) -> Result<Pattern, MoveError> {
    let pattern = validate_play(state, seat, cards)?;

    state.get_hand_mut(seat).remove_cards(pattern.cards());
    state.table = TableState {
        pattern: Some(pattern.clone()),
        owner: Some(seat),
        pass_count: 0,
    };
    record(state, seat, TurnAction::Play(pattern.clone()));
    debug!(
        game_id = %state.id,
        seat,
        play = %pattern,
        remaining = state.get_hand(seat).len(),
        "Play accepted"
    );

    if state.get_hand(seat).is_empty() {
        let result = GameResult::compute(seat, state.landlord, state.bombs_played());
        info!(
            game_id = %state.id,
            winner = seat,
            role = result.winning_role.as_str(),
            multiplier = result.multiplier,
            "Match finished"
        );
        state.phase = Phase::Finished;
        state.result = Some(result);
    }

    state.current_turn = next_seat(seat);
    Ok(pattern)
}

/// Execute a pass in place, returning whether it cleared the trick
pub fn execute_pass(state: &mut GameState, seat: u8) -> Result<bool, MoveError> {
    validate_pass(state, seat)?;

    state.table.pass_count += 1;
    record(state, seat, TurnAction::Pass);

    if state.table.pass_count >= SEAT_COUNT - 1 {
        // Both other seats passed: the trick owner opens the next trick
        let leader = state.table.owner.unwrap_or_else(|| next_seat(seat));
        state.table.clear();
        state.current_turn = leader;
        info!(game_id = %state.id, leader, "Trick cleared");
        Ok(true)
    } else {
        state.current_turn = next_seat(seat);
        debug!(game_id = %state.id, seat, "Pass accepted");
        Ok(false)
    }
}

/// Apply a play to a snapshot, returning the next snapshot
pub fn apply_play(state: &GameState, seat: u8, cards: &[Card]) -> Result<GameState, MoveError> {
    let mut next = state.clone();
    execute_play(&mut next, seat, cards)?;
    Ok(next)
}

/// Apply a pass to a snapshot, returning the next snapshot
pub fn apply_pass(state: &GameState, seat: u8) -> Result<GameState, MoveError> {
    let mut next = state.clone();
    execute_pass(&mut next, seat)?;
    Ok(next)
}

/// Plays `seat` could make against the current table
///
/// Empty outside the Playing phase or for an unknown seat. Seats other than
/// the current one get a preview against the same table.
pub fn legal_moves(state: &GameState, seat: u8) -> Vec<Pattern> {
    if state.phase != Phase::Playing || seat >= SEAT_COUNT {
        return Vec::new();
    }
    legal_responses(state.get_hand(seat), state.table_pattern()).collect()
}

/// Whether `seat` may pass right now
pub fn can_pass(state: &GameState, seat: u8) -> bool {
    validate_pass(state, seat).is_ok()
}

/// Winner if the match is over
pub fn winner(state: &GameState) -> Option<u8> {
    state.result.as_ref().map(|r| r.winner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Rank, Suit};
    use crate::domain::value_objects::PatternKind;

    fn c(rank: Rank, suit: Suit) -> Card {
        Card::new(rank, suit).unwrap()
    }

    fn small_state() -> GameState {
        // Seat 0 landlord
        let hands = [
            vec![
                c(Rank::Three, Suit::Spades),
                c(Rank::Three, Suit::Hearts),
                c(Rank::Nine, Suit::Spades),
            ],
            vec![c(Rank::Four, Suit::Spades), c(Rank::Four, Suit::Hearts), c(Rank::Ten, Suit::Spades)],
            vec![c(Rank::Five, Suit::Spades), c(Rank::King, Suit::Hearts)],
        ];
        start_with_hands(hands, 0).unwrap()
    }

    #[test]
    fn test_deal_with_seed() {
        let state = deal_with_seed(11, LandlordSelection::Fixed(1)).unwrap();
        assert_eq!(state.phase, Phase::Playing);
        assert_eq!(state.landlord, 1);
        assert_eq!(state.current_turn, 1);
        assert_eq!(state.hand_sizes(), [17, 20, 17]);
        assert_eq!(state.role(1), Role::Landlord);
        assert!(state.get_hand(1).contains_all(&state.bottom_cards));
    }

    #[test]
    fn test_deal_rejects_bad_seat() {
        assert_eq!(
            deal_with_seed(1, LandlordSelection::Fixed(3)).unwrap_err(),
            DealError::InvalidSeat(3)
        );
    }

    #[test]
    fn test_strongest_hand_selection_is_deterministic() {
        let a = deal_with_seed(5, LandlordSelection::StrongestHand).unwrap();
        let b = deal_with_seed(5, LandlordSelection::StrongestHand).unwrap();
        assert_eq!(a.landlord, b.landlord);
        assert_eq!(a.get_hand(a.landlord).len(), 20);
    }

    #[test]
    fn test_start_with_hands_rejects_duplicates() {
        let card = c(Rank::Three, Suit::Spades);
        let err = start_with_hands([vec![card], vec![card], vec![Card::big_joker()]], 0);
        assert_eq!(err.unwrap_err(), DealError::DuplicateCard(card));
    }

    #[test]
    fn test_rejected_play_leaves_state_untouched() {
        let mut state = small_state();
        let before = state.get_hand(0).clone();
        let err = execute_play(&mut state, 0, &[c(Rank::Three, Suit::Spades), c(Rank::Nine, Suit::Spades)]);
        assert!(matches!(err, Err(MoveError::InvalidPattern(_))));
        assert_eq!(state.get_hand(0), &before);
        assert!(state.history.is_empty());
    }

    #[test]
    fn test_out_of_turn() {
        let state = small_state();
        let err = apply_play(&state, 1, &[c(Rank::Ten, Suit::Spades)]).unwrap_err();
        assert_eq!(err, MoveError::NotYourTurn { expected: 0, actual: 1 });
        assert_eq!(err.code(), "NOT_YOUR_TURN");
    }

    #[test]
    fn test_cards_not_in_hand() {
        let state = small_state();
        let foreign = c(Rank::Ten, Suit::Spades);
        let err = apply_play(&state, 0, &[foreign]).unwrap_err();
        assert_eq!(err, MoveError::CardsNotInHand(vec![foreign]));
    }

    #[test]
    fn test_illegal_pass_on_open_table() {
        let state = small_state();
        assert_eq!(apply_pass(&state, 0).unwrap_err(), MoveError::IllegalPass);
        assert!(!can_pass(&state, 0));
    }

    #[test]
    fn test_double_pass_returns_lead_to_owner() {
        let state = small_state();
        let state = apply_play(&state, 0, &[c(Rank::Nine, Suit::Spades)]).unwrap();
        assert_eq!(state.current_turn, 1);
        let state = apply_pass(&state, 1).unwrap();
        assert_eq!(state.current_turn, 2);
        assert_eq!(state.table.pass_count, 1);
        let state = apply_pass(&state, 2).unwrap();
        assert!(state.table.is_open());
        assert_eq!(state.current_turn, 0);
    }

    #[test]
    fn test_execute_pass_reports_trick_clear() {
        let mut state = small_state();
        execute_play(&mut state, 0, &[c(Rank::Nine, Suit::Spades)]).unwrap();
        assert_eq!(execute_pass(&mut state, 1), Ok(false));
        assert_eq!(execute_pass(&mut state, 2), Ok(true));
        assert!(state.table.is_open());
        // A rejected pass clears nothing
        assert_eq!(execute_pass(&mut state, 0), Err(MoveError::IllegalPass));
    }

    #[test]
    fn test_finishing_play_ends_match() {
        let state = small_state();
        let state = apply_play(&state, 0, &[c(Rank::Nine, Suit::Spades)]).unwrap();
        let state = apply_play(&state, 1, &[c(Rank::Ten, Suit::Spades)]).unwrap();
        let state = apply_play(&state, 2, &[c(Rank::King, Suit::Hearts)]).unwrap();
        let state = apply_pass(&state, 0).unwrap();
        let state = apply_pass(&state, 1).unwrap();
        assert_eq!(state.current_turn, 2);
        let state = apply_play(&state, 2, &[c(Rank::Five, Suit::Spades)]).unwrap();

        assert_eq!(state.phase, Phase::Finished);
        assert_eq!(winner(&state), Some(2));
        let result = state.result.clone().unwrap();
        assert_eq!(result.winning_role, Role::Farmer);
        assert_eq!(result.scores, [-2, 1, 1]);
        assert_eq!(
            apply_pass(&state, state.current_turn).unwrap_err(),
            MoveError::GameNotInProgress(Phase::Finished)
        );
        assert!(legal_moves(&state, 0).is_empty());
    }

    #[test]
    fn test_legal_moves_follow_table() {
        let state = small_state();
        let state = apply_play(
            &state,
            0,
            &[c(Rank::Three, Suit::Spades), c(Rank::Three, Suit::Hearts)],
        )
        .unwrap();
        let moves = legal_moves(&state, 1);
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].kind(), PatternKind::Pair);
        assert_eq!(moves[0].primary_rank(), Rank::Four);
        assert!(legal_moves(&state, 2).is_empty());
    }
}
