//! # Generation Driver
//!
//! The attempt loop around the pipeline. A run moves from `Idle` to
//! `Attempting` and ends in exactly one of `Succeeded`, `Exhausted` or
//! `TimedOut`. Each attempt works on a fresh [`Candidate`] and stops at the
//! first stage that rejects it.
//!
//! Attempts are grouped into slices. Between two slices the caller gets
//! control back: the synchronous entry point invokes a callback, the async one
//! yields to the tokio scheduler. Slicing never changes the result, because
//! the PRNG stream only advances inside attempts.

use super::goals::redeploy_goals;
use super::search::{generate_farthest_boxes, SearchLimits, SearchOutcome};
use super::templates::apply_templates;
use super::validator::is_good_candidate;
use super::{utils, GenerationParameters, GenerationResult, Generator, SeededRng};
use crate::board::Board;
use crate::{config, PushvaultResult};
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Clock abstraction polled by the driver and the search.
pub trait Deadline {
    /// Whether the time budget is spent.
    fn expired(&self) -> bool;
}

/// A deadline that never expires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDeadline;

impl Deadline for NoDeadline {
    fn expired(&self) -> bool {
        false
    }
}

/// A wall-clock deadline.
#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    expires_at: Instant,
}

impl WallClock {
    /// Expires `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            expires_at: Instant::now() + budget,
        }
    }

    /// Time left before expiry.
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

impl Deadline for WallClock {
    fn expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// How a run is cut into slices and how long it may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulePolicy {
    /// Maximum attempts per slice
    pub chunk_size: u32,
    /// Wall-clock budget of the whole run
    pub deadline: Option<Duration>,
    /// A slice also ends once it has run this long
    pub frame_budget: Option<Duration>,
}

impl SchedulePolicy {
    /// Server profile: large slices under a wall-clock deadline.
    pub fn bounded(deadline: Duration) -> Self {
        Self {
            chunk_size: config::BOUNDED_CHUNK_SIZE,
            deadline: Some(deadline),
            frame_budget: None,
        }
    }

    /// Interactive profile: small slices that fit in a frame, no deadline.
    pub fn smooth() -> Self {
        Self {
            chunk_size: config::SMOOTH_CHUNK_SIZE,
            deadline: None,
            frame_budget: Some(config::FRAME_BUDGET),
        }
    }

    /// Large slices and no time limit; only the attempt budget ends the run.
    pub fn unbounded() -> Self {
        Self {
            chunk_size: config::BOUNDED_CHUNK_SIZE,
            deadline: None,
            frame_budget: None,
        }
    }

    /// Overrides the slice size.
    pub fn with_chunk_size(mut self, chunk_size: u32) -> Self {
        self.chunk_size = chunk_size;
        self
    }
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Pipeline stage that can reject an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Synthesis,
    Validation,
    GoalPlacement,
    Search,
    Difficulty,
}

impl Stage {
    /// Every stage, in pipeline order.
    pub const ALL: [Stage; 5] = [
        Stage::Synthesis,
        Stage::Validation,
        Stage::GoalPlacement,
        Stage::Search,
        Stage::Difficulty,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Synthesis => "synthesis",
            Stage::Validation => "validation",
            Stage::GoalPlacement => "goal placement",
            Stage::Search => "search",
            Stage::Difficulty => "difficulty",
        };
        f.write_str(name)
    }
}

/// Rejected attempts per stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionStats {
    pub synthesis: u32,
    pub validation: u32,
    pub goal_placement: u32,
    pub search: u32,
    pub difficulty: u32,
}

impl RejectionStats {
    /// Counts one rejection.
    pub fn record(&mut self, stage: Stage) {
        *self.slot(stage) += 1;
    }

    /// Rejections at one stage.
    pub fn count(&self, stage: Stage) -> u32 {
        match stage {
            Stage::Synthesis => self.synthesis,
            Stage::Validation => self.validation,
            Stage::GoalPlacement => self.goal_placement,
            Stage::Search => self.search,
            Stage::Difficulty => self.difficulty,
        }
    }

    /// Rejections over all stages.
    pub fn total(&self) -> u32 {
        Stage::ALL.iter().map(|&stage| self.count(stage)).sum()
    }

    fn slot(&mut self, stage: Stage) -> &mut u32 {
        match stage {
            Stage::Synthesis => &mut self.synthesis,
            Stage::Validation => &mut self.validation,
            Stage::GoalPlacement => &mut self.goal_placement,
            Stage::Search => &mut self.search,
            Stage::Difficulty => &mut self.difficulty,
        }
    }
}

/// Bookkeeping of a run, attached to every outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationReport {
    /// Attempts started
    pub attempts: u32,
    pub rejections: RejectionStats,
    pub elapsed: Duration,
}

/// Final state of a run.
///
/// `Exhausted` and `TimedOut` are ordinary results, not errors: they never
/// carry a partial level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Succeeded {
        result: GenerationResult,
        report: GenerationReport,
    },
    /// The attempt budget was spent without an accepted level
    Exhausted { report: GenerationReport },
    /// The deadline expired first
    TimedOut { report: GenerationReport },
}

impl GenerationOutcome {
    /// The accepted level, if any.
    pub fn result(&self) -> Option<&GenerationResult> {
        match self {
            GenerationOutcome::Succeeded { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Consumes the outcome, keeping the accepted level.
    pub fn into_result(self) -> Option<GenerationResult> {
        match self {
            GenerationOutcome::Succeeded { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn report(&self) -> &GenerationReport {
        match self {
            GenerationOutcome::Succeeded { report, .. }
            | GenerationOutcome::Exhausted { report }
            | GenerationOutcome::TimedOut { report } => report,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Succeeded { .. })
    }
}

/// Result of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Accepted(GenerationResult),
    Rejected(Stage),
    /// The deadline expired during the search
    TimedOut,
}

/// A board under construction together with the stages it has cleared.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub board: Board,
    passed: Vec<Stage>,
}

impl Candidate {
    /// An empty walled board.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            board: Board::enclosed(width, height),
            passed: Vec::new(),
        }
    }

    fn pass(&mut self, stage: Stage) {
        self.passed.push(stage);
    }

    /// Stages cleared so far, in order.
    pub fn passed(&self) -> &[Stage] {
        &self.passed
    }
}

/// Coarse state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Attempting,
    Succeeded,
    Exhausted,
    TimedOut,
}

/// One in-flight generation run.
///
/// Owns its PRNG; nothing is shared between runs.
pub struct GenerationRun {
    params: GenerationParameters,
    policy: SchedulePolicy,
    template_tries: u32,
    limits: SearchLimits,
    rng: SeededRng,
    clock: Option<WallClock>,
    attempts: u32,
    rejections: RejectionStats,
    started: Instant,
    outcome: Option<GenerationOutcome>,
}

impl GenerationRun {
    fn new(
        params: GenerationParameters,
        policy: SchedulePolicy,
        template_tries: u32,
        poll_interval: usize,
        rng: SeededRng,
    ) -> Self {
        let limits = SearchLimits {
            poll_interval,
            ..SearchLimits::from_params(&params)
        };
        Self {
            clock: policy.deadline.map(WallClock::after),
            params,
            policy,
            template_tries,
            limits,
            rng,
            attempts: 0,
            rejections: RejectionStats::default(),
            started: Instant::now(),
            outcome: None,
        }
    }

    pub fn state(&self) -> RunState {
        match &self.outcome {
            None if self.attempts == 0 => RunState::Idle,
            None => RunState::Attempting,
            Some(GenerationOutcome::Succeeded { .. }) => RunState::Succeeded,
            Some(GenerationOutcome::Exhausted { .. }) => RunState::Exhausted,
            Some(GenerationOutcome::TimedOut { .. }) => RunState::TimedOut,
        }
    }

    pub fn params(&self) -> &GenerationParameters {
        &self.params
    }

    /// Progress so far.
    pub fn report(&self) -> GenerationReport {
        GenerationReport {
            attempts: self.attempts,
            rejections: self.rejections,
            elapsed: self.started.elapsed(),
        }
    }

    /// Runs one slice against the run's own deadline.
    ///
    /// Returns the outcome once the run has finished; later calls keep
    /// returning it.
    pub fn step(&mut self) -> Option<GenerationOutcome> {
        match self.clock {
            Some(clock) => self.step_with(&clock),
            None => self.step_with(&NoDeadline),
        }
    }

    /// Runs one slice against an explicit deadline.
    pub fn step_with(&mut self, deadline: &dyn Deadline) -> Option<GenerationOutcome> {
        if self.outcome.is_some() {
            return self.outcome.clone();
        }

        let slice_started = Instant::now();
        for _ in 0..self.policy.chunk_size.max(1) {
            if self.attempts >= self.params.attempt_budget {
                let report = self.report();
                return self.finish(GenerationOutcome::Exhausted { report });
            }
            if deadline.expired() {
                let report = self.report();
                return self.finish(GenerationOutcome::TimedOut { report });
            }

            self.attempts += 1;
            match self.attempt(deadline) {
                AttemptOutcome::Accepted(result) => {
                    let report = self.report();
                    return self.finish(GenerationOutcome::Succeeded { result, report });
                }
                AttemptOutcome::Rejected(stage) => self.rejections.record(stage),
                AttemptOutcome::TimedOut => {
                    let report = self.report();
                    return self.finish(GenerationOutcome::TimedOut { report });
                }
            }

            if self
                .policy
                .frame_budget
                .is_some_and(|budget| slice_started.elapsed() >= budget)
            {
                break;
            }
        }

        None
    }

    /// Runs slices until the run finishes, calling `on_slice` in between.
    pub fn run_to_end(&mut self, mut on_slice: impl FnMut(&GenerationReport)) -> GenerationOutcome {
        loop {
            if let Some(outcome) = self.step() {
                return outcome;
            }
            on_slice(&self.report());
        }
    }

    /// One pass through the pipeline on a fresh board.
    fn attempt(&mut self, deadline: &dyn Deadline) -> AttemptOutcome {
        let params = &self.params;
        let mut candidate = Candidate::new(params.width, params.height);

        let stage = 'pipeline: {
            if !apply_templates(&mut candidate.board, &mut self.rng, self.template_tries) {
                break 'pipeline Stage::Synthesis;
            }
            candidate.pass(Stage::Synthesis);

            if !is_good_candidate(&candidate.board, params) {
                break 'pipeline Stage::Validation;
            }
            candidate.pass(Stage::Validation);

            if !redeploy_goals(&mut candidate.board, params.box_count, &mut self.rng) {
                break 'pipeline Stage::GoalPlacement;
            }
            candidate.pass(Stage::GoalPlacement);

            let difficulty = match generate_farthest_boxes(
                &mut candidate.board,
                &self.limits,
                params.initial_player,
                &mut self.rng,
                deadline,
            ) {
                SearchOutcome::Found { difficulty, .. } => difficulty,
                SearchOutcome::DeadEnd => break 'pipeline Stage::Search,
                SearchOutcome::TimedOut => return AttemptOutcome::TimedOut,
            };
            candidate.pass(Stage::Search);

            if params.min_difficulty.is_some_and(|min| difficulty < min) {
                break 'pipeline Stage::Difficulty;
            }

            debug!(
                "Attempt {} accepted with difficulty {difficulty}",
                self.attempts
            );
            return AttemptOutcome::Accepted(GenerationResult::from_board(
                &candidate.board,
                difficulty,
                params.seed.clone(),
            ));
        };

        trace!(
            "Attempt {} rejected at {stage} after {:?}",
            self.attempts,
            candidate.passed()
        );
        AttemptOutcome::Rejected(stage)
    }

    fn finish(&mut self, outcome: GenerationOutcome) -> Option<GenerationOutcome> {
        let report = outcome.report();
        match &outcome {
            GenerationOutcome::Succeeded { result, .. } => info!(
                "Generated {}x{} level with difficulty {} after {} attempts",
                result.width, result.height, result.difficulty, report.attempts
            ),
            GenerationOutcome::Exhausted { .. } => info!(
                "No level after {} attempts ({} rejected at search)",
                report.attempts, report.rejections.search
            ),
            GenerationOutcome::TimedOut { .. } => info!(
                "Generation timed out after {} attempts in {:?}",
                report.attempts, report.elapsed
            ),
        }
        self.outcome = Some(outcome.clone());
        Some(outcome)
    }
}

/// Level generator: the pipeline plus a scheduling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelGenerator {
    pub policy: SchedulePolicy,
    /// Random tries per template block
    pub template_tries: u32,
    /// Search expansions between deadline polls
    pub poll_interval: usize,
}

impl LevelGenerator {
    pub fn new(policy: SchedulePolicy) -> Self {
        Self {
            policy,
            template_tries: config::TEMPLATE_TRIES,
            poll_interval: config::DEADLINE_POLL_INTERVAL,
        }
    }

    /// Server-bound generator.
    pub fn bounded(deadline: Duration) -> Self {
        Self::new(SchedulePolicy::bounded(deadline))
    }

    /// Interactive generator.
    pub fn smooth() -> Self {
        Self::new(SchedulePolicy::smooth())
    }

    /// Starts a run after checking the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PushvaultError::InvalidParameters`] when the
    /// parameters break the input contract. No attempt is made in that case.
    pub fn start(&self, params: &GenerationParameters) -> PushvaultResult<GenerationRun> {
        params.validate()?;
        Ok(self.run_with_rng(params, utils::create_rng(params)))
    }

    fn run_with_rng(&self, params: &GenerationParameters, rng: SeededRng) -> GenerationRun {
        GenerationRun::new(
            params.clone(),
            self.policy,
            self.template_tries,
            self.poll_interval,
            rng,
        )
    }

    /// Generates a level synchronously.
    ///
    /// # Examples
    ///
    /// ```
    /// use pushvault::{GenerationParameters, LevelGenerator};
    ///
    /// let params = GenerationParameters::for_testing("doc");
    /// let outcome = LevelGenerator::default().generate_level(&params).unwrap();
    /// if let Some(level) = outcome.result() {
    ///     assert_eq!(level.rows.len(), 7);
    /// }
    /// ```
    pub fn generate_level(
        &self,
        params: &GenerationParameters,
    ) -> PushvaultResult<GenerationOutcome> {
        self.generate_with_callback(params, |_| {})
    }

    /// Generates a level synchronously, calling `on_slice` between slices.
    pub fn generate_with_callback(
        &self,
        params: &GenerationParameters,
        on_slice: impl FnMut(&GenerationReport),
    ) -> PushvaultResult<GenerationOutcome> {
        let mut run = self.start(params)?;
        Ok(run.run_to_end(on_slice))
    }

    /// Generates a level against an explicit deadline instead of the
    /// policy's own.
    pub fn generate_until(
        &self,
        params: &GenerationParameters,
        deadline: &dyn Deadline,
    ) -> PushvaultResult<GenerationOutcome> {
        let mut run = self.start(params)?;
        loop {
            if let Some(outcome) = run.step_with(deadline) {
                return Ok(outcome);
            }
        }
    }

    /// Generates a level, yielding to the tokio scheduler between slices.
    pub async fn generate_async(
        &self,
        params: &GenerationParameters,
    ) -> PushvaultResult<GenerationOutcome> {
        let mut run = self.start(params)?;
        loop {
            if let Some(outcome) = run.step() {
                return Ok(outcome);
            }
            tokio::task::yield_now().await;
        }
    }
}

impl Default for LevelGenerator {
    fn default() -> Self {
        Self::new(SchedulePolicy::default())
    }
}

impl Generator<GenerationOutcome> for LevelGenerator {
    fn generate(
        &self,
        params: &GenerationParameters,
        rng: &mut SeededRng,
    ) -> PushvaultResult<GenerationOutcome> {
        params.validate()?;
        let mut run = self.run_with_rng(params, rng.clone());
        let outcome = run.run_to_end(|_| {});
        *rng = run.rng;
        Ok(outcome)
    }

    fn validate(
        &self,
        content: &GenerationOutcome,
        params: &GenerationParameters,
    ) -> PushvaultResult<()> {
        match content.result() {
            Some(result) => utils::validate_result(result, params),
            None => Ok(()),
        }
    }

    fn generator_type(&self) -> &'static str {
        "LevelGenerator"
    }
}
