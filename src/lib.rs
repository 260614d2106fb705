//! # Pushvault
//!
//! Seeded generator of solvable push-block (Sokoban) puzzles with an exact
//! difficulty score.
//!
//! ## Architecture Overview
//!
//! The crate is organised around a single generation pipeline:
//!
//! - **Board**: tile grid, boxes, goals and player, plus the fixed-alphabet row
//!   format and a forward push solver used for verification
//! - **Generation**: seeded PRNG, template-based structure synthesis, candidate
//!   validation, goal placement and a reverse (pull) search that picks the
//!   starting arrangement farthest from the solved state
//! - **Driver**: an attempt state machine that retries the pipeline under an
//!   attempt budget, a deadline and cooperative scheduling slices
//! - **Service**: JSON request/response wrapper for the server-bound entry point
//!
//! ## Determinism
//!
//! For fixed parameters and seed, every entry point produces byte-identical rows
//! and the same difficulty. Vault runs rely on this to regenerate a level from a
//! `(seed, depth)` pair.

pub mod board;
pub mod generation;
pub mod service;

pub use board::{Board, BoardState, Direction, Position, Region, Tile};
pub use generation::{
    Deadline, GenerationOutcome, GenerationParameters, GenerationReport, GenerationResult,
    GenerationRun, Generator, LevelGenerator, NoDeadline, RejectionStats, SchedulePolicy,
    SearchOutcome, Seed, SeededRng, Stage, VaultRun, WallClock,
};
pub use service::{GenerationRequest, GenerationResponse, NoLevelReason};

/// Core error type for the Pushvault engine.
///
/// Expected generation failures (a rejected candidate, an exhausted attempt
/// budget, an expired deadline) are not errors; they are reported through
/// [`GenerationOutcome`].
#[derive(thiserror::Error, Debug)]
pub enum PushvaultError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Generation parameters violate the input contract
    #[error("Invalid generation parameters: {0}")]
    InvalidParameters(String),

    /// A level could not be parsed or breaks a board invariant
    #[error("Invalid level: {0}")]
    InvalidLevel(String),

    /// A position lies outside the board
    #[error("Position {0} is outside the board")]
    OutOfBounds(Position),
}

/// Result type used throughout the Pushvault codebase.
pub type PushvaultResult<T> = Result<T, PushvaultError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Generation configuration constants.
pub mod config {
    use std::time::Duration;

    /// Default number of attempts before a run is declared exhausted
    pub const DEFAULT_ATTEMPT_BUDGET: u32 = 5000;

    /// Default number of states the difficulty search may expand
    pub const DEFAULT_SEARCH_STATES: usize = 20_000;

    /// Largest accepted board side, border included
    pub const MAX_DIMENSION: u32 = 32;

    /// Smallest accepted board side, border included
    pub const MIN_DIMENSION: u32 = 3;

    /// Deadline applied to server-bound requests that do not carry one
    pub const SERVER_DEADLINE: Duration = Duration::from_millis(2000);

    /// Attempts per slice in the bounded profile
    pub const BOUNDED_CHUNK_SIZE: u32 = 250;

    /// Attempts per slice in the smooth profile
    pub const SMOOTH_CHUNK_SIZE: u32 = 10;

    /// Frame time the smooth profile tries not to exceed between yields
    pub const FRAME_BUDGET: Duration = Duration::from_millis(16);

    /// Random tries per template block before synthesis gives up
    pub const TEMPLATE_TRIES: u32 = 12;

    /// Search expansions between two deadline polls
    pub const DEADLINE_POLL_INTERVAL: usize = 256;

    /// State budget of the forward solver used by `solve`
    pub const SOLVER_STATES: usize = 1_000_000;
}
