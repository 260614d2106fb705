//! # Generation Module
//!
//! Procedural generation of solvable push-block levels.
//!
//! One generation call runs the pipeline below until an attempt is accepted,
//! the attempt budget is spent, or the deadline expires:
//!
//! 1. [`templates`] stamps wall patterns into an empty, walled board
//! 2. [`validator`] rejects disconnected or under-walled candidates
//! 3. [`goals`] picks goal tiles a box can be pulled away from
//! 4. [`search`] pulls boxes backwards from the goals to the farthest state
//!
//! [`driver`] owns the attempt loop and the seeded PRNG; [`vault`] derives
//! per-depth parameters for vault runs.

pub mod driver;
pub mod goals;
pub mod prng;
pub mod search;
pub mod templates;
pub mod validator;
pub mod vault;

pub use driver::*;
pub use prng::*;
pub use search::SearchOutcome;
pub use vault::*;

use crate::board::{Board, Position};
use crate::{config, PushvaultError, PushvaultResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deterministic generation key.
///
/// Integer seeds are used as-is; text seeds are hashed with FNV-1a, which is
/// stable across platforms and compiler versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seed {
    Number(u64),
    Text(String),
}

impl Seed {
    /// The 64-bit value fed to the PRNG.
    ///
    /// # Examples
    ///
    /// ```
    /// use pushvault::Seed;
    ///
    /// assert_eq!(Seed::from(7u64).to_u64(), 7);
    /// assert_eq!(Seed::from("abc").to_u64(), Seed::from("abc").to_u64());
    /// assert_ne!(Seed::from("abc").to_u64(), Seed::from("abc2").to_u64());
    /// ```
    pub fn to_u64(&self) -> u64 {
        match self {
            Seed::Number(value) => *value,
            Seed::Text(text) => fnv1a(text.as_bytes()),
        }
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes.iter().fold(OFFSET_BASIS, |hash, &byte| {
        (hash ^ u64::from(byte)).wrapping_mul(PRIME)
    })
}

impl From<u64> for Seed {
    fn from(value: u64) -> Self {
        Seed::Number(value)
    }
}

impl From<&str> for Seed {
    fn from(text: &str) -> Self {
        Seed::Text(text.to_string())
    }
}

impl From<String> for Seed {
    fn from(text: String) -> Self {
        Seed::Text(text)
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seed::Number(value) => write!(f, "{value}"),
            Seed::Text(text) => write!(f, "{text}"),
        }
    }
}

fn default_attempt_budget() -> u32 {
    config::DEFAULT_ATTEMPT_BUDGET
}

fn default_search_states() -> usize {
    config::DEFAULT_SEARCH_STATES
}

/// Parameters of one generation call.
///
/// Serialized with camelCase names; the short names `boxes`, `minWalls`,
/// `attempts` and `initialPosition` are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParameters {
    /// Board width, border included
    pub width: u32,
    /// Board height, border included
    pub height: u32,
    /// Number of boxes (and goals)
    #[serde(alias = "boxes")]
    pub box_count: u32,
    /// Minimum number of wall tiles strictly inside the border
    #[serde(alias = "minWalls", default)]
    pub min_wall_count: u32,
    /// Attempts before the run is declared exhausted
    #[serde(alias = "attempts", default = "default_attempt_budget")]
    pub attempt_budget: u32,
    /// Deterministic generation key
    pub seed: Seed,
    /// Fixed starting tile for the player
    #[serde(
        alias = "initialPosition",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub initial_player: Option<Position>,
    /// Reject levels solvable in fewer pushes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_difficulty: Option<u32>,
    /// Stop searching once a level this hard has been found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_difficulty: Option<u32>,
    /// States the difficulty search may expand per attempt
    #[serde(default = "default_search_states")]
    pub max_search_states: usize,
}

impl GenerationParameters {
    /// Creates parameters with default budgets and no wall minimum.
    ///
    /// # Examples
    ///
    /// ```
    /// use pushvault::GenerationParameters;
    ///
    /// let params = GenerationParameters::new(9, 9, 3, "abc").with_min_walls(13);
    /// assert_eq!(params.box_count, 3);
    /// assert!(params.validate().is_ok());
    /// ```
    pub fn new(width: u32, height: u32, box_count: u32, seed: impl Into<Seed>) -> Self {
        Self {
            width,
            height,
            box_count,
            min_wall_count: 0,
            attempt_budget: config::DEFAULT_ATTEMPT_BUDGET,
            seed: seed.into(),
            initial_player: None,
            min_difficulty: None,
            target_difficulty: None,
            max_search_states: config::DEFAULT_SEARCH_STATES,
        }
    }

    /// Creates small, quick parameters for tests.
    pub fn for_testing(seed: impl Into<Seed>) -> Self {
        Self {
            min_wall_count: 4,
            attempt_budget: 500,
            max_search_states: 5_000,
            ..Self::new(7, 7, 2, seed)
        }
    }

    /// Sets the interior wall minimum.
    pub fn with_min_walls(mut self, min_wall_count: u32) -> Self {
        self.min_wall_count = min_wall_count;
        self
    }

    /// Sets the attempt budget.
    pub fn with_attempts(mut self, attempt_budget: u32) -> Self {
        self.attempt_budget = attempt_budget;
        self
    }

    /// Fixes the player's starting tile.
    pub fn with_initial_player(mut self, player: Position) -> Self {
        self.initial_player = Some(player);
        self
    }

    /// Sets the difficulty floor.
    pub fn with_min_difficulty(mut self, min_difficulty: u32) -> Self {
        self.min_difficulty = Some(min_difficulty);
        self
    }

    /// Sets the difficulty at which the search stops early.
    pub fn with_target_difficulty(mut self, target_difficulty: u32) -> Self {
        self.target_difficulty = Some(target_difficulty);
        self
    }

    /// Sets the per-attempt search budget.
    pub fn with_search_states(mut self, max_search_states: usize) -> Self {
        self.max_search_states = max_search_states;
        self
    }

    /// Number of tiles strictly inside the border.
    pub fn interior_area(&self) -> u32 {
        self.width.saturating_sub(2) * self.height.saturating_sub(2)
    }

    /// Checks the input contract.
    ///
    /// A zero attempt budget is accepted: it simply produces no level.
    ///
    /// # Errors
    ///
    /// Returns [`PushvaultError::InvalidParameters`] when a dimension is out of
    /// range, there are no boxes, the interior cannot hold the boxes, the
    /// player and the wall minimum, the initial player is not strictly inside
    /// the border, or the difficulty bounds contradict each other.
    pub fn validate(&self) -> PushvaultResult<()> {
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if !(config::MIN_DIMENSION..=config::MAX_DIMENSION).contains(&value) {
                return Err(PushvaultError::InvalidParameters(format!(
                    "{name} must be between {} and {}, got {value}",
                    config::MIN_DIMENSION,
                    config::MAX_DIMENSION
                )));
            }
        }

        if self.box_count == 0 {
            return Err(PushvaultError::InvalidParameters(
                "at least one box is required".to_string(),
            ));
        }

        let interior = self.interior_area();
        let needed = u64::from(self.box_count) + 1 + u64::from(self.min_wall_count);
        if needed > u64::from(interior) {
            return Err(PushvaultError::InvalidParameters(format!(
                "{} boxes, a player and {} walls do not fit in {interior} interior tiles",
                self.box_count, self.min_wall_count
            )));
        }

        if let Some(player) = self.initial_player {
            if !Board::enclosed(self.width, self.height).is_interior(player) {
                return Err(PushvaultError::InvalidParameters(format!(
                    "initial player {player} is not inside the border"
                )));
            }
        }

        if self.max_search_states == 0 {
            return Err(PushvaultError::InvalidParameters(
                "the search needs a positive state budget".to_string(),
            ));
        }

        if self.target_difficulty == Some(0) {
            return Err(PushvaultError::InvalidParameters(
                "the target difficulty must be at least one push".to_string(),
            ));
        }

        if let (Some(min), Some(target)) = (self.min_difficulty, self.target_difficulty) {
            if target < min {
                return Err(PushvaultError::InvalidParameters(format!(
                    "target difficulty {target} is below the minimum {min}"
                )));
            }
        }

        Ok(())
    }
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self::new(9, 9, 3, 42u64).with_min_walls(13)
    }
}

/// An accepted level: fixed-width rows plus its exact difficulty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Level rows in the Boxoban alphabet
    pub rows: Vec<String>,
    /// Minimum number of pushes needed to solve the level
    pub difficulty: u32,
    pub width: u32,
    pub height: u32,
    /// Seed the level was generated from
    pub seed: Seed,
}

impl GenerationResult {
    /// Freezes an accepted board.
    pub fn from_board(board: &Board, difficulty: u32, seed: Seed) -> Self {
        Self {
            rows: board.to_rows(),
            difficulty,
            width: board.width,
            height: board.height,
            seed,
        }
    }

    /// Parses the rows back into a board.
    pub fn board(&self) -> PushvaultResult<Board> {
        Board::from_rows(&self.rows)
    }
}

/// Trait for procedural generators.
///
/// The caller owns the random number generator, so the same generator can be
/// replayed with the same stream.
pub trait Generator<T> {
    /// Generates content using the provided parameters and random number generator.
    fn generate(&self, params: &GenerationParameters, rng: &mut SeededRng) -> PushvaultResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, params: &GenerationParameters) -> PushvaultResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;

    /// Creates the seeded random number generator for a parameter set.
    pub fn create_rng(params: &GenerationParameters) -> SeededRng {
        SeededRng::from_seed_value(&params.seed)
    }

    /// Checks that an accepted level matches its parameters.
    pub fn validate_result(
        result: &GenerationResult,
        params: &GenerationParameters,
    ) -> PushvaultResult<()> {
        let board = result.board()?;

        if board.width != params.width || board.height != params.height {
            return Err(PushvaultError::InvalidLevel(format!(
                "level is {}x{}, expected {}x{}",
                board.width, board.height, params.width, params.height
            )));
        }
        if board.boxes().len() != params.box_count as usize {
            return Err(PushvaultError::InvalidLevel(format!(
                "level has {} boxes, expected {}",
                board.boxes().len(),
                params.box_count
            )));
        }
        if board.player().is_none() {
            return Err(PushvaultError::InvalidLevel("level has no player".to_string()));
        }
        if let Some(player) = params.initial_player {
            if board.player() != Some(player) {
                return Err(PushvaultError::InvalidLevel(format!(
                    "player should start at {player}"
                )));
            }
        }
        if validator::inspect_candidate(&board, params).is_err() {
            return Err(PushvaultError::InvalidLevel(
                "level layout fails candidate validation".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_parameters_creation() {
        let params = GenerationParameters::new(9, 9, 3, "abc");
        assert_eq!(params.seed, Seed::Text("abc".to_string()));
        assert_eq!(params.attempt_budget, config::DEFAULT_ATTEMPT_BUDGET);
        assert_eq!(params.interior_area(), 49);
        assert!(params.validate().is_ok());
        assert!(GenerationParameters::default().validate().is_ok());
        assert!(GenerationParameters::for_testing(1u64).validate().is_ok());
    }

    #[test]
    fn test_parameter_contract() {
        assert!(GenerationParameters::new(2, 9, 1, 1u64).validate().is_err());
        assert!(GenerationParameters::new(9, 99, 1, 1u64).validate().is_err());
        assert!(GenerationParameters::new(9, 9, 0, 1u64).validate().is_err());
        assert!(GenerationParameters::new(4, 4, 4, 1u64).validate().is_err());
        assert!(GenerationParameters::new(9, 9, 3, 1u64)
            .with_min_walls(46)
            .validate()
            .is_err());
        assert!(GenerationParameters::new(9, 9, 3, 1u64)
            .with_initial_player(Position::new(0, 4))
            .validate()
            .is_err());
        assert!(GenerationParameters::new(9, 9, 3, 1u64)
            .with_search_states(0)
            .validate()
            .is_err());
        assert!(GenerationParameters::new(9, 9, 3, 1u64)
            .with_min_difficulty(10)
            .with_target_difficulty(5)
            .validate()
            .is_err());
    }

    #[test]
    fn test_huge_counts_are_rejected_without_overflow() {
        assert!(GenerationParameters::new(9, 9, u32::MAX, 1u64).validate().is_err());
        assert!(GenerationParameters::new(9, 9, 1, 1u64)
            .with_min_walls(u32::MAX)
            .validate()
            .is_err());
    }

    #[test]
    fn test_zero_target_difficulty_is_rejected() {
        assert!(GenerationParameters::new(9, 9, 3, 1u64)
            .with_target_difficulty(0)
            .validate()
            .is_err());
        assert!(GenerationParameters::new(9, 9, 3, 1u64)
            .with_target_difficulty(1)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_zero_attempts_is_not_a_contract_violation() {
        let params = GenerationParameters::new(9, 9, 3, 1u64).with_attempts(0);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_parameters_from_json_aliases() {
        let json = r#"{
            "width": 9, "height": 9, "boxes": 3, "minWalls": 13,
            "attempts": 5000, "seed": "abc", "initialPosition": {"x": 2, "y": 3}
        }"#;
        let params: GenerationParameters = serde_json::from_str(json).unwrap();
        assert_eq!(params.box_count, 3);
        assert_eq!(params.min_wall_count, 13);
        assert_eq!(params.attempt_budget, 5000);
        assert_eq!(params.initial_player, Some(Position::new(2, 3)));
        assert_eq!(params.max_search_states, config::DEFAULT_SEARCH_STATES);

        let numeric: GenerationParameters =
            serde_json::from_str(r#"{"width": 9, "height": 9, "boxCount": 2, "seed": 17}"#)
                .unwrap();
        assert_eq!(numeric.seed, Seed::Number(17));
        assert_eq!(numeric.min_wall_count, 0);
    }

    #[test]
    fn test_text_seed_hash_is_fixed() {
        // FNV-1a reference values.
        assert_eq!(Seed::from("").to_u64(), 0xcbf2_9ce4_8422_2325);
        assert_eq!(Seed::from("a").to_u64(), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn test_result_parses_back() {
        let mut board = Board::enclosed(5, 3);
        board.set_boxes(vec![Position::new(2, 1)]);
        board.set_goals(vec![Position::new(3, 1)]);
        board.set_player(Some(Position::new(1, 1)));

        let result = GenerationResult::from_board(&board, 1, Seed::from(3u64));
        assert_eq!(result.rows, vec!["#####", "#@$.#", "#####"]);
        assert_eq!(result.board().unwrap(), board);
    }
}
