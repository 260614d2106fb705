//! # Goal Placement
//!
//! Goals go where a box could be pulled away from: the player needs the two
//! tiles behind the goal, in the same direction, to stand on and step back to.

use super::SeededRng;
use crate::board::{Board, Direction, Position};
use log::trace;

/// Whether a box on `pos` can be pulled at least once on an empty board.
pub fn admits_pull(board: &Board, pos: Position) -> bool {
    board.is_floor(pos)
        && Direction::ALL.iter().any(|&direction| {
            let stand = pos.step(direction);
            board.is_floor(stand) && board.is_floor(stand.step(direction))
        })
}

/// Floor tiles that admit a pull, in row-major order.
pub fn goal_candidates(board: &Board) -> Vec<Position> {
    board
        .floor_positions()
        .into_iter()
        .filter(|&pos| admits_pull(board, pos))
        .collect()
}

/// Clears the board's pieces and places `box_count` goals on random
/// qualifying tiles.
///
/// Returns `false`, leaving the board without pieces, when fewer than
/// `box_count` tiles qualify.
pub fn redeploy_goals(board: &mut Board, box_count: u32, rng: &mut SeededRng) -> bool {
    board.clear_pieces();

    let mut candidates = goal_candidates(board);
    let count = box_count as usize;
    if candidates.len() < count {
        trace!(
            "Only {} goal tiles qualify, {} needed",
            candidates.len(),
            count
        );
        return false;
    }

    rng.shuffle(&mut candidates);
    candidates.truncate(count);
    board.set_goals(candidates);
    true
}
