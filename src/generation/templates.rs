//! # Structure Synthesis
//!
//! Template-based room synthesis.
//!
//! The interior is covered by a lattice of 3x3 blocks. Each block receives one
//! 5x5 template, randomly rotated and mirrored:
//!
//! - the 3x3 centre is stamped onto the block
//! - the outer ring constrains the neighbouring tiles
//!
//! In the pattern strings `#` is wall, `.` is floor and `?` leaves the tile
//! unconstrained. A stamp fails when a defined cell disagrees with a tile
//! fixed by an earlier stamp. Once every block is stamped, dead-end floor
//! tiles are walled up until none are left.

use super::SeededRng;
use crate::board::{Board, Position, Tile};
use log::trace;

/// Size of a template pattern, ring included.
const PATTERN_SIZE: usize = 5;

/// Side of the block lattice.
const BLOCK: usize = 3;

type Pattern = [[u8; PATTERN_SIZE]; PATTERN_SIZE];

const TEMPLATES: [[&str; PATTERN_SIZE]; 15] = [
    ["?????", "?...?", "?...?", "?...?", "?????"],
    ["?????", "?#..?", "?...?", "?...?", "?????"],
    ["?????", "?###?", "?...?", "?...?", "?????"],
    ["?????", "?###?", "?#..?", "?#..?", "?????"],
    ["?????", "?#..?", "?...?", "?..#?", "?????"],
    ["?????", "?###?", "?#.#?", "?...?", "??.??"],
    ["?????", "?#.#?", "?...?", "?#.#?", "?????"],
    ["??.??", "?#.#?", "?#.#?", "?#.#?", "??.??"],
    ["?????", "?#..?", "?#..?", "?#..?", "?????"],
    ["?????", "?...?", "?.#.?", "?...?", "?????"],
    ["??.??", "?#.#?", "?...?", "?###?", "?????"],
    ["?????", "?##.?", "?##.?", "?...?", "?????"],
    ["?????", "?###?", "?###?", "?###?", "?????"],
    ["?????", "?###?", "?#...", "?#.#?", "??.??"],
    ["?????", "?###?", ".....", "?###?", "?????"],
];

/// Number of templates in the catalog.
pub fn template_count() -> usize {
    TEMPLATES.len()
}

/// Builds the pattern of a template under a rotation (quarter turns
/// clockwise) and an optional horizontal mirror.
fn oriented(template: usize, rotation: usize, mirrored: bool) -> Pattern {
    let mut pattern: Pattern = [[b'?'; PATTERN_SIZE]; PATTERN_SIZE];
    for (row, line) in TEMPLATES[template].iter().enumerate() {
        for (col, byte) in line.bytes().enumerate() {
            let col = if mirrored { PATTERN_SIZE - 1 - col } else { col };
            pattern[row][col] = byte;
        }
    }

    for _ in 0..rotation % 4 {
        let mut rotated: Pattern = [[b'?'; PATTERN_SIZE]; PATTERN_SIZE];
        for (row, line) in rotated.iter_mut().enumerate() {
            for (col, cell) in line.iter_mut().enumerate() {
                *cell = pattern[PATTERN_SIZE - 1 - col][row];
            }
        }
        pattern = rotated;
    }
    pattern
}

/// Defined cells of a pattern whose centre's top-left cell sits on `origin`,
/// as board positions.
fn cells(pattern: &Pattern, origin: Position) -> impl Iterator<Item = (Position, Tile)> + '_ {
    pattern.iter().enumerate().flat_map(move |(row, line)| {
        line.iter().enumerate().filter_map(move |(col, &byte)| {
            let tile = match byte {
                b'#' => Tile::Wall,
                b'.' => Tile::Floor,
                _ => return None,
            };
            let pos = Position::new(origin.x - 1 + col as i32, origin.y - 1 + row as i32);
            Some((pos, tile))
        })
    })
}

/// Tiles already decided by earlier stamps.
struct FixedTiles {
    fixed: Vec<bool>,
    width: u32,
}

impl FixedTiles {
    fn new(board: &Board) -> Self {
        Self {
            fixed: vec![false; (board.width * board.height) as usize],
            width: board.width,
        }
    }

    fn index(&self, pos: Position) -> usize {
        (pos.y as u32 * self.width + pos.x as u32) as usize
    }

    fn fits(&self, board: &Board, pattern: &Pattern, origin: Position) -> bool {
        cells(pattern, origin)
            .filter(|&(pos, _)| board.is_interior(pos))
            .all(|(pos, tile)| !self.fixed[self.index(pos)] || board.get_tile(pos) == Some(tile))
    }

    fn stamp(&mut self, board: &mut Board, pattern: &Pattern, origin: Position) {
        for (pos, tile) in cells(pattern, origin) {
            if !board.is_interior(pos) {
                continue;
            }
            board.tiles[pos.y as usize][pos.x as usize] = tile;
            let index = self.index(pos);
            self.fixed[index] = true;
        }
    }
}

/// Stamps random templates over the whole interior.
///
/// Each block gets `tries_per_block` random template/orientation draws.
/// Returns `false` as soon as a block cannot be stamped without conflict; the
/// board is then left half-stamped and must be discarded.
pub fn apply_templates(board: &mut Board, rng: &mut SeededRng, tries_per_block: u32) -> bool {
    let mut fixed = FixedTiles::new(board);

    for y in (1..board.height as i32 - 1).step_by(BLOCK) {
        for x in (1..board.width as i32 - 1).step_by(BLOCK) {
            let origin = Position::new(x, y);
            let mut placed = false;

            for _ in 0..tries_per_block {
                let template = rng.index(TEMPLATES.len());
                let rotation = rng.index(4);
                let mirrored = rng.index(2) == 1;
                let pattern = oriented(template, rotation, mirrored);

                if fixed.fits(board, &pattern, origin) {
                    fixed.stamp(board, &pattern, origin);
                    placed = true;
                    break;
                }
            }

            if !placed {
                trace!("No template fits the block at {origin}");
                return false;
            }
        }
    }

    fill_dead_ends(board);
    true
}

/// Walls up floor tiles with three or more wall neighbours, repeatedly.
///
/// Returns the number of tiles filled.
pub fn fill_dead_ends(board: &mut Board) -> usize {
    let mut filled = 0;
    loop {
        let dead_ends: Vec<Position> = board
            .floor_positions()
            .into_iter()
            .filter(|&pos| board.wall_neighbours(pos) >= 3)
            .collect();
        if dead_ends.is_empty() {
            return filled;
        }
        for pos in dead_ends {
            board.tiles[pos.y as usize][pos.x as usize] = Tile::Wall;
            filled += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_are_well_formed() {
        for template in TEMPLATES {
            for line in template {
                assert_eq!(line.len(), PATTERN_SIZE);
                assert!(line.bytes().all(|b| matches!(b, b'#' | b'.' | b'?')));
            }
            // The stamped centre is always fully defined.
            for line in &template[1..4] {
                assert!(!line[1..4].contains('?'));
            }
        }
    }

    #[test]
    fn test_rotation_cycles() {
        for template in 0..template_count() {
            let upright = oriented(template, 0, false);
            let upside_down = oriented(template, 2, false);
            for row in 0..PATTERN_SIZE {
                for col in 0..PATTERN_SIZE {
                    assert_eq!(
                        upside_down[row][col],
                        upright[PATTERN_SIZE - 1 - row][PATTERN_SIZE - 1 - col]
                    );
                }
            }
            assert_eq!(oriented(template, 0, true), {
                let mut mirrored = oriented(template, 0, false);
                for line in mirrored.iter_mut() {
                    line.reverse();
                }
                mirrored
            });
        }
    }

    #[test]
    fn test_quarter_turn_moves_corner() {
        // Template 1 has a single wall in the top-left of its centre.
        let pattern = oriented(1, 1, false);
        assert_eq!(pattern[1][3], b'#');
        assert_eq!(pattern[1][1], b'.');
    }

    #[test]
    fn test_conflicting_stamp_is_rejected() {
        let board = Board::enclosed(9, 9);
        let mut fixed = FixedTiles::new(&board);
        let mut board = board;
        let origin = Position::new(2, 2);
        fixed.stamp(&mut board, &oriented(12, 0, false), origin);
        assert!(board.is_wall(origin));
        assert!(!fixed.fits(&board, &oriented(0, 0, false), origin));
        assert!(fixed.fits(&board, &oriented(12, 2, true), origin));
        // Template 7 demands floor above its centre column.
        assert!(!fixed.fits(&board, &oriented(7, 0, false), Position::new(2, 5)));
    }

    #[test]
    fn test_apply_templates_keeps_border() {
        for seed in 0..20u64 {
            let mut board = Board::enclosed(9, 9);
            let mut rng = SeededRng::new(seed, 0);
            if apply_templates(&mut board, &mut rng, 12) {
                assert!(board.check_invariants().is_ok());
                for pos in board.floor_positions() {
                    assert!(board.wall_neighbours(pos) < 3);
                }
            }
        }
    }

    #[test]
    fn test_same_seed_same_layout() {
        let mut first = Board::enclosed(11, 8);
        let mut second = Board::enclosed(11, 8);
        let a = apply_templates(&mut first, &mut SeededRng::new(77, 0), 12);
        let b = apply_templates(&mut second, &mut SeededRng::new(77, 0), 12);
        assert_eq!(a, b);
        assert_eq!(first, second);
    }

    #[test]
    fn test_fill_dead_ends() {
        let mut board = Board::from_rows(&["#####", "#   #", "### #", "#####"]).unwrap();
        // (1, 1) and (3, 2) are dead ends; filling them exposes the rest.
        let filled = fill_dead_ends(&mut board);
        assert_eq!(filled, 4);
        assert!(board.floor_positions().is_empty());
    }
}
