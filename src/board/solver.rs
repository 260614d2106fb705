//! # Forward Solver
//!
//! Breadth-first search over push moves. Walking is free, so the depth of the
//! first solved state is the minimum number of pushes.
//!
//! The generator never needs this: its reverse search already knows the exact
//! push count. The solver exists to verify generated levels independently and
//! to score levels coming from elsewhere.

use super::{Board, BoardState};
use log::debug;
use pathfinding::prelude::bfs;
use std::cell::Cell;

/// Result of a solver run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Solution {
    /// Minimum number of pushes, with the states visited along one optimal line
    Solved { pushes: u32, line: Vec<BoardState> },
    /// The whole state space was explored without reaching the goals
    Unsolvable,
    /// The state budget ran out first
    GaveUp { expanded: usize },
}

impl Solution {
    /// Minimum push count, when solved.
    pub fn pushes(&self) -> Option<u32> {
        match self {
            Solution::Solved { pushes, .. } => Some(*pushes),
            _ => None,
        }
    }
}

/// Solves a board whose player has been placed.
///
/// `max_states` bounds the number of expanded states.
/// A board without a player is reported as [`Solution::Unsolvable`].
pub fn solve(board: &Board, max_states: usize) -> Solution {
    let Some(start) = board.state() else {
        return Solution::Unsolvable;
    };

    let expanded = Cell::new(0usize);
    let line = bfs(
        &start,
        |state: &BoardState| {
            expanded.set(expanded.get() + 1);
            if expanded.get() > max_states {
                Vec::new()
            } else {
                state.pushes(board)
            }
        },
        |state: &BoardState| state.is_solved(board),
    );

    debug!("Solver expanded {} states", expanded.get());
    match line {
        Some(line) => Solution::Solved {
            pushes: (line.len() - 1) as u32,
            line,
        },
        None if expanded.get() > max_states => Solution::GaveUp {
            expanded: max_states,
        },
        None => Solution::Unsolvable,
    }
}

/// Minimum number of pushes needed to solve the board, if found within
/// `max_states` expansions.
pub fn min_pushes(board: &Board, max_states: usize) -> Option<u32> {
    solve(board, max_states).pushes()
}
