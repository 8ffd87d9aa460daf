use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::candidate::Candidate;
use crate::error::{OptimError, OptimResult};
use crate::solver::Solver;
use crate::space::SearchSpace;

/// Uniform sampling of the search space in fixed-size batches.
pub struct RandomSearch {
    space: SearchSpace,
    batch: usize,
    rng: ChaCha8Rng,
}

impl RandomSearch {
    pub fn new(space: &SearchSpace, batch: usize, seed: u64) -> OptimResult<Self> {
        if batch == 0 {
            return Err(OptimError::InvalidConfig {
                what: "random search batch must be positive",
            });
        }
        Ok(Self {
            space: space.clone(),
            batch,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }
}

impl Solver for RandomSearch {
    fn name(&self) -> &'static str {
        "random"
    }

    fn ask(&mut self) -> Vec<Vec<f64>> {
        (0..self.batch)
            .map(|_| self.space.sample(&mut self.rng))
            .collect()
    }

    fn tell(&mut self, _evaluated: &[Candidate]) {}
}
