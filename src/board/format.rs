//! # Row Format
//!
//! Boxoban-style serialization: one character per tile, one string per row.
//!
//! | Symbol | Meaning           |
//! |--------|-------------------|
//! | `#`    | wall              |
//! | ` `    | empty floor       |
//! | `$`    | box               |
//! | `*`    | box on goal       |
//! | `.`    | empty goal        |
//! | `@`    | player            |
//! | `+`    | player on goal    |
//!
//! The mapping is part of the public output contract and must not change.

use super::{Board, Position, Tile};
use crate::{PushvaultError, PushvaultResult};
use std::fmt;

pub const WALL: char = '#';
pub const FLOOR: char = ' ';
pub const BOX: char = '$';
pub const BOX_ON_GOAL: char = '*';
pub const GOAL: char = '.';
pub const PLAYER: char = '@';
pub const PLAYER_ON_GOAL: char = '+';

impl Board {
    /// Symbol for a single position.
    pub fn symbol_at(&self, pos: Position) -> char {
        if self.is_wall(pos) {
            return WALL;
        }
        let goal = self.has_goal(pos);
        if self.has_box(pos) {
            return if goal { BOX_ON_GOAL } else { BOX };
        }
        if self.player() == Some(pos) {
            return if goal { PLAYER_ON_GOAL } else { PLAYER };
        }
        if goal {
            GOAL
        } else {
            FLOOR
        }
    }

    /// Serializes the board into fixed-width rows.
    ///
    /// # Examples
    ///
    /// ```
    /// use pushvault::{Board, Position};
    ///
    /// let mut board = Board::enclosed(5, 3);
    /// board.set_boxes(vec![Position::new(2, 1)]);
    /// board.set_goals(vec![Position::new(3, 1)]);
    /// board.set_player(Some(Position::new(1, 1)));
    /// assert_eq!(board.to_rows(), vec!["#####", "#@$.#", "#####"]);
    /// ```
    pub fn to_rows(&self) -> Vec<String> {
        (0..self.height as i32)
            .map(|y| {
                (0..self.width as i32)
                    .map(|x| self.symbol_at(Position::new(x, y)))
                    .collect()
            })
            .collect()
    }

    /// Parses rows in the format produced by [`Board::to_rows`].
    ///
    /// # Errors
    ///
    /// Fails on empty input, ragged rows, unknown symbols, several players, or
    /// any broken board invariant (see [`Board::check_invariants`]).
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> PushvaultResult<Board> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.as_ref().chars().count());
        if width == 0 || height == 0 {
            return Err(PushvaultError::InvalidLevel("empty level".to_string()));
        }

        let mut board = Board::enclosed(width as u32, height as u32);
        let mut boxes = Vec::new();
        let mut goals = Vec::new();
        let mut player = None;

        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.chars().count() != width {
                return Err(PushvaultError::InvalidLevel(format!(
                    "row {y} has {} columns, expected {width}",
                    row.chars().count()
                )));
            }

            for (x, symbol) in row.chars().enumerate() {
                let pos = Position::new(x as i32, y as i32);
                let tile = if symbol == WALL { Tile::Wall } else { Tile::Floor };
                if board.is_border(pos) {
                    if tile != Tile::Wall {
                        return Err(PushvaultError::InvalidLevel(format!(
                            "border tile {pos} is not a wall"
                        )));
                    }
                } else {
                    board.set_tile(pos, tile)?;
                }

                match symbol {
                    WALL | FLOOR => {}
                    BOX => boxes.push(pos),
                    GOAL => goals.push(pos),
                    BOX_ON_GOAL => {
                        boxes.push(pos);
                        goals.push(pos);
                    }
                    PLAYER | PLAYER_ON_GOAL => {
                        if player.replace(pos).is_some() {
                            return Err(PushvaultError::InvalidLevel(
                                "more than one player".to_string(),
                            ));
                        }
                        if symbol == PLAYER_ON_GOAL {
                            goals.push(pos);
                        }
                    }
                    other => {
                        return Err(PushvaultError::InvalidLevel(format!(
                            "unknown symbol {other:?} at {pos}"
                        )));
                    }
                }
            }
        }

        board.set_boxes(boxes);
        board.set_goals(goals);
        board.set_player(player);
        board.check_invariants()?;
        Ok(board)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rows().join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVEL: [&str; 6] = [
        "#######",
        "#.  # #",
        "# $*  #",
        "#  #$+#",
        "#     #",
        "#######",
    ];

    #[test]
    fn test_parse_pieces() {
        let board = Board::from_rows(&LEVEL).unwrap();
        assert_eq!(board.width, 7);
        assert_eq!(board.height, 6);
        assert_eq!(
            board.boxes(),
            &[Position::new(2, 2), Position::new(3, 2), Position::new(4, 3)]
        );
        assert_eq!(
            board.goals(),
            &[Position::new(1, 1), Position::new(3, 2), Position::new(5, 3)]
        );
        assert_eq!(board.player(), Some(Position::new(5, 3)));
        assert!(board.is_wall(Position::new(4, 1)));
        assert!(board.is_wall(Position::new(3, 3)));
    }

    #[test]
    fn test_round_trip() {
        let board = Board::from_rows(&LEVEL).unwrap();
        assert_eq!(board.to_rows(), LEVEL.to_vec());
        assert_eq!(Board::from_rows(&board.to_rows()).unwrap(), board);
        assert_eq!(board.to_string(), LEVEL.join("\n"));
    }

    #[test]
    fn test_symbols_are_stable() {
        assert_eq!(
            [WALL, FLOOR, BOX, BOX_ON_GOAL, GOAL, PLAYER, PLAYER_ON_GOAL],
            ['#', ' ', '$', '*', '.', '@', '+']
        );
    }

    #[test]
    fn test_rejects_malformed_levels() {
        assert!(Board::from_rows::<&str>(&[]).is_err());
        assert!(Board::from_rows(&["#####", "#@$.", "#####"]).is_err());
        assert!(Board::from_rows(&["#####", " @$.#", "#####"]).is_err());
        assert!(Board::from_rows(&["#####", "#@$x#", "#####"]).is_err());
        assert!(Board::from_rows(&["######", "#@$.@#", "######"]).is_err());
        assert!(Board::from_rows(&["#####", "#@$$#", "#####"]).is_err());
    }

    #[test]
    fn test_board_without_player_formats() {
        let mut board = Board::enclosed(4, 3);
        board.set_goals(vec![Position::new(1, 1)]);
        assert_eq!(board.to_rows(), vec!["####", "#. #", "####"]);
    }
}
