//! # Candidate Validation
//!
//! Structural checks run on a freshly synthesized board, before any goal is
//! placed. The checks never mutate the board.

use super::GenerationParameters;
use crate::board::{Board, Region};
use std::fmt;

/// Reason a candidate board was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateFlaw {
    /// Not enough floor for the boxes plus the player
    TooFewFloors,
    /// The floor tiles form more than one 4-connected region
    Disconnected,
    /// Fewer interior walls than requested
    TooFewWalls,
    /// The fixed starting tile was walled over
    PlayerOnWall,
}

impl fmt::Display for CandidateFlaw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CandidateFlaw::TooFewFloors => "too few floor tiles",
            CandidateFlaw::Disconnected => "floor is not connected",
            CandidateFlaw::TooFewWalls => "too few interior walls",
            CandidateFlaw::PlayerOnWall => "initial player is on a wall",
        };
        f.write_str(text)
    }
}

/// Whether the board is usable for the requested parameters.
pub fn is_good_candidate(board: &Board, params: &GenerationParameters) -> bool {
    inspect_candidate(board, params).is_ok()
}

/// Runs every candidate check and reports the first failure.
///
/// Checks, in order: enough floor for `box_count` boxes and a player, a
/// single connected floor region, at least `min_wall_count` walls inside the
/// border, and a floor tile under the fixed initial player.
pub fn inspect_candidate(
    board: &Board,
    params: &GenerationParameters,
) -> Result<(), CandidateFlaw> {
    let floors = board.floor_positions();
    if floors.len() < params.box_count as usize + 1 {
        return Err(CandidateFlaw::TooFewFloors);
    }

    // Boxes are ignored: connectivity is about the layout alone.
    let region = Region::compute(board, &[], floors[0]);
    if region.len() != floors.len() {
        return Err(CandidateFlaw::Disconnected);
    }

    if board.interior_wall_count() < params.min_wall_count as usize {
        return Err(CandidateFlaw::TooFewWalls);
    }

    if let Some(player) = params.initial_player {
        if !board.is_floor(player) {
            return Err(CandidateFlaw::PlayerOnWall);
        }
    }

    Ok(())
}
