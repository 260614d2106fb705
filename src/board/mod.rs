//! # Board Module
//!
//! Board representation shared by the generator, the formatter and the solver.
//!
//! A [`Board`] is a rectangular grid of [`Tile`]s whose border is always wall,
//! plus the positions of the boxes, the goals and the player. Box and goal
//! sets are kept sorted so that two boards with the same content compare equal.

pub mod format;
pub mod solver;
pub mod state;

pub use format::*;
pub use solver::*;
pub use state::*;

use crate::{PushvaultError, PushvaultResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a 2D coordinate on the board.
///
/// # Examples
///
/// ```
/// use pushvault::{Direction, Position};
///
/// let pos = Position::new(3, 4);
/// assert_eq!(pos.step(Direction::Up), Position::new(3, 3));
/// assert_eq!(pos.cardinal_adjacent_positions().len(), 4);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    // Row-major ordering: `y` is compared first.
    pub y: i32,
    pub x: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the neighbouring position in the given direction.
    pub fn step(self, direction: Direction) -> Position {
        self + direction.to_delta()
    }

    /// Calculates the Manhattan distance to another position.
    pub fn manhattan_distance(self, other: Position) -> u32 {
        ((self.x - other.x).abs() + (self.y - other.y).abs()) as u32
    }

    /// Returns the 4 cardinal adjacent positions, in [`Direction::ALL`] order.
    pub fn cardinal_adjacent_positions(self) -> [Position; 4] {
        Direction::ALL.map(|direction| self.step(direction))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// Directions a player can walk, push or pull in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All four directions, in the order every search expands them.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Converts a direction to a position delta.
    ///
    /// # Examples
    ///
    /// ```
    /// use pushvault::{Direction, Position};
    ///
    /// assert_eq!(Direction::Up.to_delta(), Position::new(0, -1));
    /// ```
    pub fn to_delta(self) -> Position {
        match self {
            Direction::Up => Position::new(0, -1),
            Direction::Down => Position::new(0, 1),
            Direction::Left => Position::new(-1, 0),
            Direction::Right => Position::new(1, 0),
        }
    }

    /// Returns the opposite direction.
    pub fn reverse(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Static tile kinds. Boxes, goals and the player live on top of floor tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    Wall,
    Floor,
}

/// A push-block puzzle board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Width in tiles, border included
    pub width: u32,
    /// Height in tiles, border included
    pub height: u32,
    /// Tiles indexed as `tiles[y][x]`
    pub tiles: Vec<Vec<Tile>>,
    /// Box positions, sorted
    boxes: Vec<Position>,
    /// Goal positions, sorted
    goals: Vec<Position>,
    /// Player position, unset until the search has placed it
    player: Option<Position>,
}

impl Board {
    /// Creates a board with a wall border and an all-floor interior.
    ///
    /// # Examples
    ///
    /// ```
    /// use pushvault::{Board, Position, Tile};
    ///
    /// let board = Board::enclosed(5, 4);
    /// assert_eq!(board.get_tile(Position::new(0, 0)), Some(Tile::Wall));
    /// assert_eq!(board.get_tile(Position::new(2, 2)), Some(Tile::Floor));
    /// assert_eq!(board.floor_positions().len(), 6);
    /// ```
    pub fn enclosed(width: u32, height: u32) -> Self {
        let tiles = (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| {
                        if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
                            Tile::Wall
                        } else {
                            Tile::Floor
                        }
                    })
                    .collect()
            })
            .collect();

        Self {
            width,
            height,
            tiles,
            boxes: Vec::new(),
            goals: Vec::new(),
            player: None,
        }
    }

    /// Whether the position lies on the board.
    pub fn is_valid_position(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// Whether the position lies on the outer ring of the board.
    pub fn is_border(&self, pos: Position) -> bool {
        self.is_valid_position(pos)
            && (pos.x == 0
                || pos.y == 0
                || pos.x as u32 + 1 == self.width
                || pos.y as u32 + 1 == self.height)
    }

    /// Whether the position lies strictly inside the border.
    pub fn is_interior(&self, pos: Position) -> bool {
        self.is_valid_position(pos) && !self.is_border(pos)
    }

    /// Gets the tile at a position.
    pub fn get_tile(&self, pos: Position) -> Option<Tile> {
        if !self.is_valid_position(pos) {
            return None;
        }
        Some(self.tiles[pos.y as usize][pos.x as usize])
    }

    /// Sets the tile at an interior position.
    ///
    /// # Errors
    ///
    /// Fails when the position is outside the board, or when it would open
    /// the wall border.
    pub fn set_tile(&mut self, pos: Position, tile: Tile) -> PushvaultResult<()> {
        if !self.is_valid_position(pos) {
            return Err(PushvaultError::OutOfBounds(pos));
        }
        if tile == Tile::Floor && self.is_border(pos) {
            return Err(PushvaultError::InvalidLevel(format!(
                "border tile {pos} must stay a wall"
            )));
        }
        self.tiles[pos.y as usize][pos.x as usize] = tile;
        Ok(())
    }

    /// Whether the position holds a floor tile.
    pub fn is_floor(&self, pos: Position) -> bool {
        self.get_tile(pos) == Some(Tile::Floor)
    }

    /// Whether the position holds a wall tile. Positions off the board count
    /// as walls.
    pub fn is_wall(&self, pos: Position) -> bool {
        !self.is_floor(pos)
    }

    /// All positions strictly inside the border, in row-major order.
    pub fn interior_positions(&self) -> Vec<Position> {
        let mut positions = Vec::new();
        for y in 1..(self.height as i32 - 1) {
            for x in 1..(self.width as i32 - 1) {
                positions.push(Position::new(x, y));
            }
        }
        positions
    }

    /// All floor positions, in row-major order.
    pub fn floor_positions(&self) -> Vec<Position> {
        self.interior_positions()
            .into_iter()
            .filter(|&pos| self.is_floor(pos))
            .collect()
    }

    /// Number of wall tiles strictly inside the border.
    pub fn interior_wall_count(&self) -> usize {
        self.interior_positions()
            .into_iter()
            .filter(|&pos| self.is_wall(pos))
            .count()
    }

    /// Number of wall neighbours of a position (off-board counts as wall).
    pub fn wall_neighbours(&self, pos: Position) -> usize {
        pos.cardinal_adjacent_positions()
            .iter()
            .filter(|&&adjacent| self.is_wall(adjacent))
            .count()
    }

    /// Box positions, sorted.
    pub fn boxes(&self) -> &[Position] {
        &self.boxes
    }

    /// Goal positions, sorted.
    pub fn goals(&self) -> &[Position] {
        &self.goals
    }

    /// Player position, if placed.
    pub fn player(&self) -> Option<Position> {
        self.player
    }

    /// Whether a box occupies the position.
    pub fn has_box(&self, pos: Position) -> bool {
        self.boxes.binary_search(&pos).is_ok()
    }

    /// Whether the position is a goal.
    pub fn has_goal(&self, pos: Position) -> bool {
        self.goals.binary_search(&pos).is_ok()
    }

    /// Replaces the box set.
    pub fn set_boxes(&mut self, mut boxes: Vec<Position>) {
        boxes.sort_unstable();
        self.boxes = boxes;
    }

    /// Replaces the goal set.
    pub fn set_goals(&mut self, mut goals: Vec<Position>) {
        goals.sort_unstable();
        self.goals = goals;
    }

    /// Places or removes the player.
    pub fn set_player(&mut self, player: Option<Position>) {
        self.player = player;
    }

    /// Removes boxes, goals and player, keeping the tile layout.
    pub fn clear_pieces(&mut self) {
        self.boxes.clear();
        self.goals.clear();
        self.player = None;
    }

    /// Whether every box rests on a goal.
    pub fn is_solved(&self) -> bool {
        self.boxes == self.goals
    }

    /// Current boxes and player as a search state.
    ///
    /// Returns `None` when the player has not been placed yet.
    pub fn state(&self) -> Option<BoardState> {
        self.player
            .map(|player| BoardState::new(self, self.boxes.clone(), player))
    }

    /// Checks every board invariant.
    ///
    /// # Errors
    ///
    /// Returns [`PushvaultError::InvalidLevel`] describing the first broken
    /// invariant: open border, ragged tile rows, pieces off the floor, duplicate
    /// boxes or goals, mismatched box/goal counts, or a player on a box.
    pub fn check_invariants(&self) -> PushvaultResult<()> {
        if self.tiles.len() != self.height as usize
            || self.tiles.iter().any(|row| row.len() != self.width as usize)
        {
            return Err(PushvaultError::InvalidLevel(
                "tile rows do not match the board dimensions".to_string(),
            ));
        }

        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let pos = Position::new(x, y);
                if self.is_border(pos) && self.is_floor(pos) {
                    return Err(PushvaultError::InvalidLevel(format!(
                        "border tile {pos} is not a wall"
                    )));
                }
            }
        }

        for (name, set) in [("box", &self.boxes), ("goal", &self.goals)] {
            if set.windows(2).any(|pair| pair[0] == pair[1]) {
                return Err(PushvaultError::InvalidLevel(format!("duplicate {name}")));
            }
            if let Some(pos) = set.iter().find(|&&pos| !self.is_floor(pos)) {
                return Err(PushvaultError::InvalidLevel(format!(
                    "{name} at {pos} is not on a floor tile"
                )));
            }
        }

        if self.boxes.len() != self.goals.len() {
            return Err(PushvaultError::InvalidLevel(format!(
                "{} boxes for {} goals",
                self.boxes.len(),
                self.goals.len()
            )));
        }

        if let Some(player) = self.player {
            if !self.is_floor(player) {
                return Err(PushvaultError::InvalidLevel(format!(
                    "player at {player} is not on a floor tile"
                )));
            }
            if self.has_box(player) {
                return Err(PushvaultError::InvalidLevel(format!(
                    "player at {player} stands on a box"
                )));
            }
        }

        Ok(())
    }
}
