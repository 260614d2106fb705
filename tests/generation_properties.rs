//! End-to-end properties of the generation pipeline

use proptest::prelude::*;
use pushvault::board::solver::min_pushes;
use pushvault::generation::validator::inspect_candidate;
use pushvault::{
    config, Deadline, GenerationOutcome, GenerationParameters, LevelGenerator, PushvaultResult,
    SchedulePolicy,
};
use std::cell::Cell;

/// Expires once it has been polled `budget` times.
struct Countdown(Cell<u32>);

impl Deadline for Countdown {
    fn expired(&self) -> bool {
        let left = self.0.get();
        if left == 0 {
            return true;
        }
        self.0.set(left - 1);
        false
    }
}

fn scenario(seed: &str) -> GenerationParameters {
    GenerationParameters::new(9, 9, 3, seed)
        .with_min_walls(13)
        .with_attempts(5000)
}

fn count(rows: &[String], symbols: &[char]) -> usize {
    rows.iter()
        .flat_map(|row| row.chars())
        .filter(|c| symbols.contains(c))
        .count()
}

#[test]
fn test_scenario_abc() -> PushvaultResult<()> {
    let params = scenario("abc");
    let outcome = LevelGenerator::default().generate_level(&params)?;

    if let Some(result) = outcome.result() {
        assert_eq!(result.rows.len(), 9);
        assert!(result.rows.iter().all(|row| row.chars().count() == 9));
        assert_eq!(count(&result.rows, &['$', '*']), 3);
        assert_eq!(count(&result.rows, &['.', '*', '+']), 3);
        assert_eq!(count(&result.rows, &['@', '+']), 1);
    } else {
        assert_eq!(outcome.report().attempts, 5000);
    }
    Ok(())
}

#[test]
fn test_same_seed_same_rows() -> PushvaultResult<()> {
    let params = scenario("abc");
    let first = LevelGenerator::default().generate_level(&params)?;
    let second = LevelGenerator::default().generate_level(&params)?;
    assert_eq!(first.result(), second.result());
    assert_eq!(first.report().attempts, second.report().attempts);
    Ok(())
}

#[test]
fn test_different_seed_different_rows() -> PushvaultResult<()> {
    let generator = LevelGenerator::default();
    let abc = generator.generate_level(&scenario("abc"))?;
    let abc2 = generator.generate_level(&scenario("abc2"))?;
    assert!(abc.is_success() || abc2.is_success());
    assert_ne!(
        abc.result().map(|r| &r.rows),
        abc2.result().map(|r| &r.rows)
    );
    Ok(())
}

#[test]
fn test_profiles_agree() -> PushvaultResult<()> {
    let params = GenerationParameters::for_testing("profiles");
    let unbounded = LevelGenerator::default().generate_level(&params)?;
    let smooth = LevelGenerator::smooth().generate_level(&params)?;
    let bounded = LevelGenerator::bounded(std::time::Duration::from_secs(600));
    let bounded = tokio_test::block_on(bounded.generate_async(&params))?;

    assert_eq!(unbounded.result(), smooth.result());
    assert_eq!(unbounded.result(), bounded.result());
    Ok(())
}

#[test]
fn test_generated_levels_are_valid_and_exactly_scored() -> PushvaultResult<()> {
    let generator = LevelGenerator::default();
    let mut accepted = 0;

    for seed in 0..12u64 {
        let params = GenerationParameters::for_testing(seed);
        let Some(result) = generator.generate_level(&params)?.into_result() else {
            continue;
        };
        accepted += 1;

        let board = result.board()?;
        board.check_invariants()?;
        assert_eq!(board.boxes().len(), 2);
        assert_eq!(board.goals().len(), 2);
        assert!(board.player().is_some());
        assert!(!board.is_solved());
        assert!(inspect_candidate(&board, &params).is_ok());
        assert_eq!(
            min_pushes(&board, config::SOLVER_STATES),
            Some(result.difficulty),
            "seed {seed}:\n{board}"
        );
    }

    assert!(accepted > 0);
    Ok(())
}

#[test]
fn test_fixed_player_start() -> PushvaultResult<()> {
    let start = pushvault::Position::new(3, 3);
    let params = GenerationParameters::for_testing("fixed").with_initial_player(start);
    let outcome = LevelGenerator::default().generate_level(&params)?;
    let result = outcome.result().expect("level");
    let board = result.board()?;
    assert_eq!(board.player(), Some(start));
    assert_eq!(
        min_pushes(&board, config::SOLVER_STATES),
        Some(result.difficulty)
    );
    Ok(())
}

#[test]
fn test_min_difficulty_is_honoured() -> PushvaultResult<()> {
    let params = GenerationParameters::for_testing("hard").with_min_difficulty(3);
    let outcome = LevelGenerator::default().generate_level(&params)?;
    let result = outcome.result().expect("level");
    assert!(result.difficulty >= 3);
    Ok(())
}

#[test]
fn test_zero_budget_never_synthesizes() -> PushvaultResult<()> {
    let params = scenario("abc").with_attempts(0);
    let outcome = LevelGenerator::default().generate_level(&params)?;
    assert!(matches!(outcome, GenerationOutcome::Exhausted { .. }));
    assert_eq!(outcome.report().attempts, 0);
    Ok(())
}

#[test]
fn test_deadline_yields_no_partial_level() -> PushvaultResult<()> {
    let params = scenario("abc");
    let generator = LevelGenerator::new(SchedulePolicy::unbounded());
    // Allows the first attempt to start, then expires on the next poll,
    // which is either inside that attempt's search or before the second one.
    let outcome = generator.generate_until(&params, &Countdown(Cell::new(1)))?;
    assert!(matches!(outcome, GenerationOutcome::TimedOut { .. }));
    assert!(outcome.result().is_none());
    assert_eq!(outcome.report().attempts, 1);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn prop_generation_is_deterministic(seed in any::<u64>()) {
        let params = GenerationParameters::for_testing(seed).with_attempts(60);
        let generator = LevelGenerator::default();
        let first = generator.generate_level(&params).unwrap();
        let second = generator.generate_level(&params).unwrap();
        prop_assert_eq!(first.result(), second.result());
        if let Some(result) = first.result() {
            let board = result.board().unwrap();
            prop_assert_eq!(board.boxes().len(), 2);
            prop_assert!(result.difficulty > 0);
        }
    }
}
