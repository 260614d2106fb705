//! # Difficulty Search
//!
//! Reverse breadth-first search from the solved configuration.
//!
//! Every box starts on its goal and the player is dropped into each free
//! region in turn. A pull is the exact inverse of a push, so the depth at
//! which BFS first discovers a state is the minimum number of pushes needed
//! to bring that state back to the goals. The deepest state found becomes the
//! starting arrangement of the level.

use super::{Deadline, GenerationParameters, SeededRng};
use crate::board::{Board, BoardState, Position, Region};
use crate::config;
use log::{debug, trace};
use std::collections::{HashSet, VecDeque};

/// Bounds of one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// States expanded before the search settles for the deepest layer so far
    pub max_states: usize,
    /// Depth at which the search stops early
    pub target_depth: Option<u32>,
    /// Expansions between two deadline polls
    pub poll_interval: usize,
}

impl SearchLimits {
    /// Limits derived from the generation parameters.
    pub fn from_params(params: &GenerationParameters) -> Self {
        Self {
            max_states: params.max_search_states,
            target_depth: params.target_difficulty,
            poll_interval: config::DEADLINE_POLL_INTERVAL,
        }
    }
}

/// Result of one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The board now holds boxes and player; `difficulty` is the exact
    /// minimum push count
    Found { difficulty: u32, explored: usize },
    /// No box can be pulled off its goal, or the fixed player never fits
    DeadEnd,
    /// The deadline expired mid-search; the board's pieces are untouched
    TimedOut,
}

/// Solved states: boxes on goals, one per free player region.
fn start_states(board: &Board, goals: &[Position]) -> Vec<BoardState> {
    let mut covered = vec![false; (board.width * board.height) as usize];
    let mut starts = Vec::new();

    for pos in board.floor_positions() {
        let index = (pos.y as u32 * board.width + pos.x as u32) as usize;
        if covered[index] || goals.binary_search(&pos).is_ok() {
            continue;
        }
        let region = Region::compute(board, goals, pos);
        for cell in region.cells() {
            covered[(cell.y as u32 * board.width + cell.x as u32) as usize] = true;
        }
        if let Some(anchor) = region.anchor() {
            starts.push(BoardState {
                boxes: goals.to_vec(),
                player: anchor,
            });
        }
    }

    starts
}

/// Pulls the boxes as far from the goals as the limits allow and places the
/// hardest arrangement found on the board.
///
/// The board must carry goals and no boxes. With `fixed_player`, only states
/// whose player region contains that tile qualify and the player is put
/// there; otherwise the player lands on a random tile of its region.
pub fn generate_farthest_boxes(
    board: &mut Board,
    limits: &SearchLimits,
    fixed_player: Option<Position>,
    rng: &mut SeededRng,
    deadline: &dyn Deadline,
) -> SearchOutcome {
    let goals = board.goals().to_vec();
    let poll_interval = limits.poll_interval.max(1);

    let mut visited: HashSet<BoardState> = HashSet::new();
    let mut queue: VecDeque<(BoardState, u32)> = VecDeque::new();
    for start in start_states(board, &goals) {
        if visited.insert(start.clone()) {
            queue.push_back((start, 0));
        }
    }

    let mut explored = 0usize;
    let mut best_depth = 0u32;
    let mut deepest: Vec<BoardState> = Vec::new();

    while let Some((state, depth)) = queue.pop_front() {
        if explored % poll_interval == 0 && deadline.expired() {
            debug!("Search timed out after {explored} states");
            return SearchOutcome::TimedOut;
        }
        explored += 1;

        if depth > 0 && depth >= best_depth && qualifies(board, &state, fixed_player) {
            if depth > best_depth {
                best_depth = depth;
                deepest.clear();
            }
            deepest.push(state.clone());
        }

        if best_depth > 0 && limits.target_depth.is_some_and(|target| best_depth >= target) {
            trace!("Search reached target depth {best_depth}");
            break;
        }
        if explored >= limits.max_states {
            trace!("Search stopped at its budget of {} states", limits.max_states);
            break;
        }

        for next in state.pulls(board) {
            if !visited.contains(&next) {
                visited.insert(next.clone());
                queue.push_back((next, depth + 1));
            }
        }
    }

    let Some(chosen) = rng.choose(&deepest).cloned() else {
        return SearchOutcome::DeadEnd;
    };

    let player = match fixed_player {
        Some(player) => player,
        None => {
            let region = chosen.region(board);
            match rng.choose(region.cells()) {
                Some(&player) => player,
                None => return SearchOutcome::DeadEnd,
            }
        }
    };

    board.set_boxes(chosen.boxes);
    board.set_player(Some(player));
    debug!(
        "Search found depth {best_depth} among {} states after {explored} expansions",
        deepest.len()
    );
    SearchOutcome::Found {
        difficulty: best_depth,
        explored,
    }
}

fn qualifies(board: &Board, state: &BoardState, fixed_player: Option<Position>) -> bool {
    match fixed_player {
        Some(player) => state.region(board).contains(player),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::solver::min_pushes;
    use crate::generation::{NoDeadline, Seed};

    struct Expired;

    impl Deadline for Expired {
        fn expired(&self) -> bool {
            true
        }
    }

    fn limits(max_states: usize) -> SearchLimits {
        SearchLimits {
            max_states,
            target_depth: None,
            poll_interval: 16,
        }
    }

    fn corridor_with_goal() -> Board {
        let mut board = Board::enclosed(7, 3);
        board.set_goals(vec![Position::new(1, 1)]);
        board
    }

    #[test]
    fn test_corridor_pulls_to_the_far_end() {
        let mut board = corridor_with_goal();
        let mut rng = SeededRng::new(1, 0);
        let outcome =
            generate_farthest_boxes(&mut board, &limits(1000), None, &mut rng, &NoDeadline);
        // The box can be pulled until the player hits the far wall.
        assert!(matches!(outcome, SearchOutcome::Found { difficulty: 3, .. }));
        assert_eq!(board.boxes(), &[Position::new(4, 1)]);
        assert_eq!(board.player(), Some(Position::new(5, 1)));
        assert_eq!(min_pushes(&board, 1000), Some(3));
    }

    #[test]
    fn test_goal_that_cannot_be_pulled_is_a_dead_end() {
        let mut board = Board::enclosed(4, 3);
        board.set_goals(vec![Position::new(1, 1)]);
        let mut rng = SeededRng::new(1, 0);
        let outcome =
            generate_farthest_boxes(&mut board, &limits(1000), None, &mut rng, &NoDeadline);
        assert_eq!(outcome, SearchOutcome::DeadEnd);
        assert!(board.boxes().is_empty());
        assert_eq!(board.player(), None);
    }

    #[test]
    fn test_expired_deadline_times_out() {
        let mut board = corridor_with_goal();
        let mut rng = SeededRng::new(1, 0);
        let outcome = generate_farthest_boxes(&mut board, &limits(1000), None, &mut rng, &Expired);
        assert_eq!(outcome, SearchOutcome::TimedOut);
        assert!(board.boxes().is_empty());
    }

    #[test]
    fn test_target_depth_stops_early() {
        let mut board = corridor_with_goal();
        let mut rng = SeededRng::new(1, 0);
        let limits = SearchLimits {
            target_depth: Some(2),
            ..limits(1000)
        };
        let outcome = generate_farthest_boxes(&mut board, &limits, None, &mut rng, &NoDeadline);
        assert!(matches!(outcome, SearchOutcome::Found { difficulty: 2, .. }));
    }

    #[test]
    fn test_zero_target_depth_still_pulls() {
        let mut board = corridor_with_goal();
        let mut rng = SeededRng::new(1, 0);
        let limits = SearchLimits {
            target_depth: Some(0),
            ..limits(1000)
        };
        let outcome = generate_farthest_boxes(&mut board, &limits, None, &mut rng, &NoDeadline);
        assert!(matches!(outcome, SearchOutcome::Found { difficulty: 1, .. }));
        assert_eq!(min_pushes(&board, 1000), Some(1));
    }

    #[test]
    fn test_fixed_player_is_respected() {
        let mut board = corridor_with_goal();
        let mut rng = SeededRng::new(1, 0);
        let player = Position::new(5, 1);
        let outcome =
            generate_farthest_boxes(&mut board, &limits(1000), Some(player), &mut rng, &NoDeadline);
        assert!(matches!(outcome, SearchOutcome::Found { difficulty: 3, .. }));
        assert_eq!(board.player(), Some(player));

        // Left of the box is never reachable once the box has moved.
        let mut board = corridor_with_goal();
        let outcome = generate_farthest_boxes(
            &mut board,
            &limits(1000),
            Some(Position::new(1, 1)),
            &mut rng,
            &NoDeadline,
        );
        assert_eq!(outcome, SearchOutcome::DeadEnd);
    }

    #[test]
    fn test_difficulty_matches_forward_solver() {
        let mut board = Board::from_rows(&[
            "#######",
            "#     #",
            "# ##  #",
            "#     #",
            "#     #",
            "#######",
        ])
        .unwrap();
        board.set_goals(vec![Position::new(5, 2), Position::new(3, 3)]);
        let mut rng = SeededRng::from_seed_value(&Seed::from("room"));
        let outcome = generate_farthest_boxes(
            &mut board,
            &limits(100_000),
            None,
            &mut rng,
            &NoDeadline,
        );
        let SearchOutcome::Found { difficulty, .. } = outcome else {
            panic!("expected a level, got {outcome:?}");
        };
        assert!(difficulty > 0);
        assert_eq!(min_pushes(&board, 1_000_000), Some(difficulty));
    }

    #[test]
    fn test_small_budget_still_finds_a_level() {
        let mut board = corridor_with_goal();
        let mut rng = SeededRng::new(1, 0);
        let outcome = generate_farthest_boxes(&mut board, &limits(2), None, &mut rng, &NoDeadline);
        assert!(matches!(
            outcome,
            SearchOutcome::Found {
                difficulty: 1,
                explored: 2
            }
        ));
        assert_eq!(min_pushes(&board, 1000), Some(1));
    }
}
