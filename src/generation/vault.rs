//! # Vault Runs
//!
//! A vault run is an endless descent where every depth is a level derived from
//! the run seed. Nothing is stored: the `(seed, depth)` pair regenerates the
//! same level on demand.

use super::{GenerationOutcome, GenerationParameters, LevelGenerator, Seed};
use crate::PushvaultResult;
use log::debug;
use serde::{Deserialize, Serialize};

const BASE_SIZE: u32 = 8;
const MAX_SIZE: u32 = 12;
const BASE_BOXES: u32 = 2;
const MAX_BOXES: u32 = 6;
const BASE_WALLS: u32 = 8;
const MAX_MIN_DIFFICULTY: u32 = 12;
const VAULT_ATTEMPTS: u32 = 5000;

/// A seeded vault run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultRun {
    pub seed: Seed,
}

impl VaultRun {
    pub fn new(seed: impl Into<Seed>) -> Self {
        Self { seed: seed.into() }
    }

    /// Parameters of the level at `depth`.
    ///
    /// Deeper levels get larger boards, more boxes, more walls and a higher
    /// difficulty floor.
    ///
    /// # Examples
    ///
    /// ```
    /// use pushvault::{Seed, VaultRun};
    ///
    /// let run = VaultRun::new("crypt");
    /// let params = run.parameters_for_depth(3);
    /// assert_eq!(params.seed, Seed::from("crypt#3"));
    /// assert_eq!(params.box_count, 3);
    /// assert!(params.validate().is_ok());
    /// ```
    pub fn parameters_for_depth(&self, depth: u32) -> GenerationParameters {
        let size = (BASE_SIZE + depth / 4).min(MAX_SIZE);
        let boxes = (BASE_BOXES + depth / 3).min(MAX_BOXES);
        let seed = Seed::Text(format!("{}#{depth}", self.seed));

        let mut params = GenerationParameters::new(size, size, boxes, seed)
            .with_attempts(VAULT_ATTEMPTS)
            .with_min_difficulty((1 + depth / 2).min(MAX_MIN_DIFFICULTY));
        params.min_wall_count = (BASE_WALLS + depth).min(params.interior_area() / 3);
        params
    }

    /// Generates the level at `depth`.
    pub fn generate(
        &self,
        depth: u32,
        generator: &LevelGenerator,
    ) -> PushvaultResult<GenerationOutcome> {
        let params = self.parameters_for_depth(depth);
        debug!(
            "Vault {} depth {depth}: {}x{} with {} boxes",
            self.seed, params.width, params.height, params.box_count
        );
        generator.generate_level(&params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters_are_valid_at_every_depth() {
        let run = VaultRun::new(99u64);
        for depth in 0..200 {
            let params = run.parameters_for_depth(depth);
            assert!(params.validate().is_ok(), "depth {depth}: {params:?}");
        }
    }

    #[test]
    fn test_parameters_grow_with_depth() {
        let run = VaultRun::new("grow");
        let shallow = run.parameters_for_depth(0);
        let deep = run.parameters_for_depth(40);
        assert_eq!((shallow.width, shallow.box_count), (BASE_SIZE, BASE_BOXES));
        assert_eq!((deep.width, deep.box_count), (MAX_SIZE, MAX_BOXES));
        assert!(deep.min_wall_count > shallow.min_wall_count);
        assert!(deep.min_difficulty > shallow.min_difficulty);
    }

    #[test]
    fn test_depths_have_distinct_seeds() {
        let run = VaultRun::new("seeds");
        assert_ne!(
            run.parameters_for_depth(1).seed,
            run.parameters_for_depth(2).seed
        );
        assert_eq!(
            run.parameters_for_depth(5),
            VaultRun::new("seeds").parameters_for_depth(5)
        );
    }

    #[test]
    fn test_same_depth_same_level() {
        let run = VaultRun::new(2024u64);
        let generator = LevelGenerator::default();
        let first = run.generate(0, &generator).unwrap();
        let second = run.generate(0, &generator).unwrap();
        assert_eq!(first.result(), second.result());
    }
}
