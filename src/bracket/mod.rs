use rand::seq::SliceRandom;
use tracing::{info, warn};

use crate::utils::error::TournamentError;
use crate::EngineError;

/// Models for the bracket document.
///
/// These shapes are mapped one-to-one onto the persisted fixture document,
/// so changing them changes the wire format.
pub mod models;

use models::{Bracket, Entrant, ManualNames, Match, Round, RoundTag, WinnerSelection};

/// Builds a complete knockout bracket from an unordered entrant list.
///
/// The list is shuffled uniformly (fresh randomness on every call), padded
/// up to the next power of two with byes, and paired off into the opening
/// round; every later round is pre-allocated as empty slots down to the
/// final. An empty entrant list yields an empty bracket rather than an
/// error; callers check [`Bracket::is_empty`].
pub fn build_bracket(entrants: Vec<Entrant>) -> Bracket {
    if entrants.is_empty() {
        info!("No entrants in the draw; returning an empty bracket");
        return Bracket::default();
    }

    let entrant_count = entrants.len();
    let mut shuffled = entrants;
    shuffled.shuffle(&mut rand::thread_rng());

    let mut bracket_size = 1usize;
    while bracket_size < entrant_count {
        bracket_size *= 2;
    }
    let byes_needed = bracket_size - entrant_count;

    let mut drawn = shuffled.into_iter();
    let mut matches: Vec<Match> = Vec::with_capacity(bracket_size / 2);

    // The first `byes_needed` drawn entrants sit the opening round out.
    matches.extend(drawn.by_ref().take(byes_needed).map(Match::bye));

    while let Some(player1) = drawn.next() {
        match drawn.next() {
            Some(player2) => matches.push(Match::between(player1, player2)),
            // A leftover without an opponent still advances; correct bye
            // math only reaches this for a one-entrant draw.
            None => matches.push(Match::bye(player1)),
        }
    }

    let mut bracket = Bracket::default();
    let mut current_count = matches.len();
    bracket.round_order.push(RoundTag::First);
    bracket.rounds.insert(RoundTag::First, Round { matches });

    let mut round_number: u8 = 1;
    while current_count > 1 {
        round_number += 1;
        let mut next_matches = Vec::with_capacity((current_count + 1) / 2);
        let mut index = 0;
        while index < current_count {
            if index + 1 < current_count {
                next_matches.push(Match::pending());
            } else {
                // Odd trailing match: its winner advances without a play-in.
                next_matches.push(Match::pending_bye());
            }
            index += 2;
        }

        let tag = RoundTag::for_size(next_matches.len(), round_number);
        current_count = next_matches.len();
        bracket.round_order.push(tag);
        bracket.rounds.insert(
            tag,
            Round {
                matches: next_matches,
            },
        );
    }

    info!(
        "Built a {}-round bracket for {} entrants with {} byes",
        bracket.round_order.len(),
        entrant_count,
        byes_needed
    );

    bracket
}

/// Stores a result on a match and advances the winner into the next round.
///
/// `winner` must equal the match's `player1` or `player2`; `None` clears the
/// result and takes no further action. Bad coordinates and an invalid winner
/// are rejected with the match left unchanged. Results entered for the last
/// round are stored without advancing anything.
pub fn set_winner(
    bracket: &mut Bracket,
    round: RoundTag,
    index: usize,
    winner: Option<Entrant>,
) -> Result<(), EngineError> {
    let round_data = bracket
        .round_mut(round)
        .ok_or_else(|| TournamentError::RoundNotFound(round.to_string()))?;
    let cell = round_data
        .matches
        .get_mut(index)
        .ok_or_else(|| TournamentError::MatchNotFound(format!("{} match {}", round, index)))?;

    if let Some(entrant) = &winner {
        if !cell.contains(entrant) {
            return Err(TournamentError::InvalidWinnerSelection(entrant.display_name()).into());
        }
    }

    cell.winner = winner.clone();

    // Clearing a result never retracts an already-advanced entrant.
    if let Some(entrant) = winner {
        advance_winner(bracket, round, index, &entrant);
    }

    Ok(())
}

/// Records an administrator's edit of one match: optional free-text name
/// corrections followed by a winner selection (or a cleared result).
///
/// A manual name replaces the slot's structured reference with the raw
/// string for that slot only; the winner is then resolved against the
/// edited slots.
pub fn record_result(
    bracket: &mut Bracket,
    round: RoundTag,
    index: usize,
    names: &ManualNames,
    selection: Option<WinnerSelection>,
) -> Result<(), EngineError> {
    let winner = {
        let round_data = bracket
            .round_mut(round)
            .ok_or_else(|| TournamentError::RoundNotFound(round.to_string()))?;
        let cell = round_data
            .matches
            .get_mut(index)
            .ok_or_else(|| TournamentError::MatchNotFound(format!("{} match {}", round, index)))?;

        apply_manual_name(&mut cell.player1, names.player1.as_deref());
        apply_manual_name(&mut cell.player2, names.player2.as_deref());

        match selection {
            None => None,
            Some(WinnerSelection::Player1) => Some(cell.player1.clone().ok_or_else(|| {
                TournamentError::InvalidWinnerSelection("player 1 slot is empty".to_string())
            })?),
            Some(WinnerSelection::Player2) => Some(cell.player2.clone().ok_or_else(|| {
                TournamentError::InvalidWinnerSelection("player 2 slot is empty".to_string())
            })?),
        }
    };

    set_winner(bracket, round, index, winner)
}

fn apply_manual_name(slot: &mut Option<Entrant>, edit: Option<&str>) {
    let Some(name) = edit else { return };
    if name.is_empty() {
        return;
    }
    if slot.as_ref().map(Entrant::display_name).as_deref() == Some(name) {
        return;
    }
    *slot = Some(Entrant::Name(name.to_string()));
}

/// Moves a recorded winner into its slot in the following round.
///
/// The successor round comes from the bracket's stored round order; the
/// target position is `index / 2` (matches 0 and 1 feed match 0, and so on).
/// Every failure here is a logged no-op: a result entered on the final round
/// is a legitimate action, and stale coordinates must not corrupt the draw.
fn advance_winner(bracket: &mut Bracket, round: RoundTag, index: usize, winner: &Entrant) {
    let Some(next_round) = bracket.next_round_after(round) else {
        info!("No round follows {}; nothing to advance", round);
        return;
    };
    let next_index = index / 2;

    let Some(target) = bracket
        .round_mut(next_round)
        .and_then(|data| data.matches.get_mut(next_index))
    else {
        warn!(
            "{} match {} does not exist; dropping winner of {} match {}",
            next_round, next_index, round, index
        );
        return;
    };

    if target.is_bye {
        // A bye cell has a single real input line; stale occupants are
        // replaced outright.
        target.player1 = Some(winner.clone());
    } else if target.contains(winner) {
        // Re-saved result; the winner is already where it belongs.
        return;
    } else if target.player1.is_none() {
        target.player1 = Some(winner.clone());
    } else if target.player2.is_none() {
        target.player2 = Some(winner.clone());
    } else {
        // Both slots taken means a reassigned winner or a corrupted draw.
        // Overwriting could discard the sibling match's winner, so keep the
        // slots and make the drop visible in the log.
        warn!(
            "Both slots of {} match {} are occupied; winner of {} match {} was not advanced",
            next_round, next_index, round, index
        );
        return;
    }

    info!(
        "Propagated winner from {} match {} to {} match {}",
        round, index, next_round, next_index
    );
}
