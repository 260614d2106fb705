//! # Board States
//!
//! Canonical box/player configurations used by the reverse generation search
//! and by the forward solver.
//!
//! Two configurations are the same state when they have the same boxes and the
//! player can walk from one player position to the other. [`BoardState`]
//! therefore stores the sorted box list and the smallest position of the
//! player's reachable [`Region`].

use super::{Board, Direction, Position};
use pathfinding::prelude::bfs_reach;

/// Floor tiles a player can walk to without moving any box.
#[derive(Debug, Clone)]
pub struct Region {
    /// Reachable positions, sorted row-major
    cells: Vec<Position>,
    /// Membership mask indexed by `y * width + x`
    mask: Vec<bool>,
    width: u32,
}

impl Region {
    /// Flood-fills from `start`, treating walls and `boxes` as blocked.
    ///
    /// `boxes` must be sorted. A blocked start yields an empty region.
    pub fn compute(board: &Board, boxes: &[Position], start: Position) -> Self {
        let free = |pos: Position| board.is_floor(pos) && boxes.binary_search(&pos).is_err();

        let mut cells: Vec<Position> = if free(start) {
            bfs_reach(start, |&pos: &Position| {
                pos.cardinal_adjacent_positions()
                    .into_iter()
                    .filter(|&adjacent| free(adjacent))
                    .collect::<Vec<_>>()
            })
            .collect()
        } else {
            Vec::new()
        };
        cells.sort_unstable();

        let mut mask = vec![false; (board.width * board.height) as usize];
        for pos in &cells {
            mask[(pos.y as u32 * board.width + pos.x as u32) as usize] = true;
        }

        Self {
            cells,
            mask,
            width: board.width,
        }
    }

    /// Whether the player can reach the position.
    pub fn contains(&self, pos: Position) -> bool {
        if pos.x < 0 || pos.y < 0 || pos.x as u32 >= self.width {
            return false;
        }
        self.mask
            .get((pos.y as u32 * self.width + pos.x as u32) as usize)
            .copied()
            .unwrap_or(false)
    }

    /// Reachable positions, sorted.
    pub fn cells(&self) -> &[Position] {
        &self.cells
    }

    /// Smallest reachable position; the canonical player position.
    pub fn anchor(&self) -> Option<Position> {
        self.cells.first().copied()
    }

    /// Number of reachable positions.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the region is empty.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A canonical box/player configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoardState {
    /// Box positions, sorted
    pub boxes: Vec<Position>,
    /// Smallest position of the player's region
    pub player: Position,
}

impl BoardState {
    /// Builds a canonical state from arbitrary boxes and player position.
    pub fn new(board: &Board, mut boxes: Vec<Position>, player: Position) -> Self {
        boxes.sort_unstable();
        let player = Region::compute(board, &boxes, player)
            .anchor()
            .unwrap_or(player);
        Self { boxes, player }
    }

    /// The player's reachable region in this state.
    pub fn region(&self, board: &Board) -> Region {
        Region::compute(board, &self.boxes, self.player)
    }

    /// Whether every box rests on one of the board's goals.
    pub fn is_solved(&self, board: &Board) -> bool {
        self.boxes == board.goals()
    }

    /// States reachable with exactly one push.
    ///
    /// The player pushes box `b` in direction `d` from `b - d`, which must be
    /// reachable; `b + d` must be free floor.
    pub fn pushes(&self, board: &Board) -> Vec<BoardState> {
        let region = self.region(board);
        let mut next = Vec::new();

        for (index, &current) in self.boxes.iter().enumerate() {
            for direction in Direction::ALL {
                let behind = current.step(direction.reverse());
                let target = current.step(direction);
                if !region.contains(behind) || !self.is_free(board, target) {
                    continue;
                }
                next.push(self.moved(board, index, target, current));
            }
        }

        next
    }

    /// States reachable with exactly one pull, the inverse of a push.
    ///
    /// The player stands at `b + d` and steps to `b + 2d`, dragging box `b`
    /// onto `b + d`. Both tiles must be in the player's region.
    pub fn pulls(&self, board: &Board) -> Vec<BoardState> {
        let region = self.region(board);
        let mut next = Vec::new();

        for (index, &current) in self.boxes.iter().enumerate() {
            for direction in Direction::ALL {
                let stand = current.step(direction);
                let retreat = stand.step(direction);
                if !region.contains(stand) || !region.contains(retreat) {
                    continue;
                }
                next.push(self.moved(board, index, stand, retreat));
            }
        }

        next
    }

    fn is_free(&self, board: &Board, pos: Position) -> bool {
        board.is_floor(pos) && self.boxes.binary_search(&pos).is_err()
    }

    fn moved(&self, board: &Board, index: usize, to: Position, player: Position) -> BoardState {
        let mut boxes = self.boxes.clone();
        boxes[index] = to;
        BoardState::new(board, boxes, player)
    }
}
