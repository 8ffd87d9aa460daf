//! NSGA-II with simulated binary crossover and polynomial mutation.

use std::cmp::Ordering;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::candidate::Candidate;
use crate::dominance::{crowding_distance, non_dominated_sort};
use crate::error::{OptimError, OptimResult};
use crate::solver::Solver;
use crate::space::SearchSpace;

#[derive(Clone, Debug, PartialEq)]
pub struct Nsga2Config {
    pub population: usize,
    pub crossover_prob: f64,
    /// SBX distribution index.
    pub eta_c: f64,
    /// Per-variable mutation probability; defaults to 1/n.
    pub mutation_prob: Option<f64>,
    /// Polynomial mutation distribution index.
    pub eta_m: f64,
}

impl Default for Nsga2Config {
    fn default() -> Self {
        Self {
            population: 40,
            crossover_prob: 0.9,
            eta_c: 15.0,
            mutation_prob: None,
            eta_m: 20.0,
        }
    }
}

pub struct Nsga2 {
    config: Nsga2Config,
    space: SearchSpace,
    lower: Vec<f64>,
    upper: Vec<f64>,
    rng: ChaCha8Rng,
    population: Vec<Candidate>,
    rank: Vec<usize>,
    crowding: Vec<f64>,
}

impl Nsga2 {
    pub fn new(config: Nsga2Config, space: &SearchSpace, seed: u64) -> OptimResult<Self> {
        if config.population < 2 {
            return Err(OptimError::InvalidConfig {
                what: "population must be at least 2",
            });
        }
        if !(0.0..=1.0).contains(&config.crossover_prob) {
            return Err(OptimError::InvalidConfig {
                what: "crossover probability must be in [0, 1]",
            });
        }
        if let Some(p) = config.mutation_prob
            && !(0.0..=1.0).contains(&p)
        {
            return Err(OptimError::InvalidConfig {
                what: "mutation probability must be in [0, 1]",
            });
        }
        if !(config.eta_c > 0.0 && config.eta_m > 0.0) {
            return Err(OptimError::InvalidConfig {
                what: "distribution indices must be positive",
            });
        }
        Ok(Self {
            config,
            lower: space.lower(),
            upper: space.upper(),
            space: space.clone(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            population: Vec::new(),
            rank: Vec::new(),
            crowding: Vec::new(),
        })
    }

    pub fn population(&self) -> &[Candidate] {
        &self.population
    }

    /// Binary tournament on (rank, crowding).
    fn tournament(&mut self) -> usize {
        let n = self.population.len();
        let a = self.rng.gen_range(0..n);
        let b = self.rng.gen_range(0..n);
        match self.rank[a].cmp(&self.rank[b]) {
            Ordering::Less => a,
            Ordering::Greater => b,
            Ordering::Equal => {
                if self.crowding[b] > self.crowding[a] {
                    b
                } else {
                    a
                }
            }
        }
    }

    fn sbx(&mut self, p1: &[f64], p2: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let mut c1 = p1.to_vec();
        let mut c2 = p2.to_vec();
        if self.rng.r#gen::<f64>() > self.config.crossover_prob {
            return (c1, c2);
        }
        let eta = self.config.eta_c;
        for i in 0..c1.len() {
            if self.rng.r#gen::<f64>() > 0.5 || (p1[i] - p2[i]).abs() <= 1e-14 {
                continue;
            }
            let (lb, ub) = (self.lower[i], self.upper[i]);
            let y1 = p1[i].min(p2[i]);
            let y2 = p1[i].max(p2[i]);
            let u: f64 = self.rng.r#gen();

            let spread = |beta: f64| {
                let alpha = 2.0 - beta.powf(-(eta + 1.0));
                if u <= 1.0 / alpha {
                    (u * alpha).powf(1.0 / (eta + 1.0))
                } else {
                    (1.0 / (2.0 - u * alpha)).powf(1.0 / (eta + 1.0))
                }
            };
            let bq1 = spread(1.0 + 2.0 * (y1 - lb) / (y2 - y1));
            let bq2 = spread(1.0 + 2.0 * (ub - y2) / (y2 - y1));
            let v1 = (0.5 * ((y1 + y2) - bq1 * (y2 - y1))).clamp(lb, ub);
            let v2 = (0.5 * ((y1 + y2) + bq2 * (y2 - y1))).clamp(lb, ub);

            if self.rng.r#gen::<bool>() {
                c1[i] = v2;
                c2[i] = v1;
            } else {
                c1[i] = v1;
                c2[i] = v2;
            }
        }
        (c1, c2)
    }

    fn mutate(&mut self, x: &mut [f64]) {
        let pm = self
            .config
            .mutation_prob
            .unwrap_or(1.0 / x.len().max(1) as f64);
        let eta = self.config.eta_m;
        let pow = 1.0 / (eta + 1.0);
        for i in 0..x.len() {
            if self.rng.r#gen::<f64>() > pm {
                continue;
            }
            let (lb, ub) = (self.lower[i], self.upper[i]);
            let width = ub - lb;
            let d1 = (x[i] - lb) / width;
            let d2 = (ub - x[i]) / width;
            let u: f64 = self.rng.r#gen();
            let dq = if u < 0.5 {
                let v = 2.0 * u + (1.0 - 2.0 * u) * (1.0 - d1).powf(eta + 1.0);
                v.powf(pow) - 1.0
            } else {
                let v = 2.0 * (1.0 - u) + 2.0 * (u - 0.5) * (1.0 - d2).powf(eta + 1.0);
                1.0 - v.powf(pow)
            };
            x[i] = (x[i] + dq * width).clamp(lb, ub);
        }
    }
}

impl Solver for Nsga2 {
    fn name(&self) -> &'static str {
        "nsga2"
    }

    fn ask(&mut self) -> Vec<Vec<f64>> {
        let n = self.config.population;
        if self.population.is_empty() {
            return (0..n).map(|_| self.space.sample(&mut self.rng)).collect();
        }
        let mut offspring = Vec::with_capacity(n + 1);
        while offspring.len() < n {
            let a = self.tournament();
            let b = self.tournament();
            let pa = self.population[a].x.clone();
            let pb = self.population[b].x.clone();
            let (mut c1, mut c2) = self.sbx(&pa, &pb);
            self.mutate(&mut c1);
            self.mutate(&mut c2);
            offspring.push(c1);
            offspring.push(c2);
        }
        offspring.truncate(n);
        offspring
    }

    /// Environmental selection over parents and offspring.
    fn tell(&mut self, evaluated: &[Candidate]) {
        let n = self.config.population;
        let mut combined = std::mem::take(&mut self.population);
        combined.extend(evaluated.iter().cloned());
        // Stable order so selection does not depend on completion order.
        combined.sort_by_key(|c| c.id);

        let fronts = non_dominated_sort(&combined);
        let mut chosen: Vec<(usize, usize, f64)> = Vec::with_capacity(n);
        for (rank, front) in fronts.iter().enumerate() {
            if chosen.len() >= n {
                break;
            }
            let points: Vec<&[f64]> = front
                .iter()
                .map(|&i| combined[i].objectives.as_slice())
                .collect();
            let d = crowding_distance(&points);
            let mut members: Vec<(usize, f64)> = front.iter().copied().zip(d).collect();
            if chosen.len() + members.len() > n {
                members.sort_by(|a, b| {
                    b.1.partial_cmp(&a.1)
                        .unwrap_or(Ordering::Equal)
                        .then(combined[a.0].id.cmp(&combined[b.0].id))
                });
                members.truncate(n - chosen.len());
            }
            chosen.extend(members.into_iter().map(|(i, c)| (i, rank, c)));
        }

        let mut keep: Vec<Option<Candidate>> = combined.into_iter().map(Some).collect();
        self.population.clear();
        self.rank.clear();
        self.crowding.clear();
        for (i, rank, c) in chosen {
            if let Some(cand) = keep[i].take() {
                self.population.push(cand);
                self.rank.push(rank);
                self.crowding.push(c);
            }
        }
        debug!(
            survivors = self.population.len(),
            fronts = fronts.len(),
            "nsga2 selection"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::DecisionVariable;
    use lf_core::ParameterVector;

    fn space() -> SearchSpace {
        SearchSpace::new(
            vec![
                DecisionVariable {
                    name: "a".into(),
                    min: 0.0,
                    max: 1.0,
                },
                DecisionVariable {
                    name: "b".into(),
                    min: -5.0,
                    max: 5.0,
                },
            ],
            ParameterVector::new(),
        )
        .unwrap()
    }

    fn evaluated(id: u64, x: Vec<f64>) -> Candidate {
        Candidate {
            id,
            generation: 0,
            objectives: vec![x[0], 1.0 - x[0] + x[1].abs()],
            params: ParameterVector::new(),
            x,
            violation: 0.0,
            evaluation: None,
            failure: None,
        }
    }

    #[test]
    fn offspring_respect_bounds() {
        let s = space();
        let mut ga = Nsga2::new(Nsga2Config { population: 10, ..Default::default() }, &s, 3).unwrap();
        let mut next_id = 0;
        for _ in 0..5 {
            let batch = ga.ask();
            assert_eq!(batch.len(), 10);
            for x in &batch {
                assert!((0.0..=1.0).contains(&x[0]));
                assert!((-5.0..=5.0).contains(&x[1]));
            }
            let cands: Vec<Candidate> = batch
                .into_iter()
                .map(|x| {
                    next_id += 1;
                    evaluated(next_id, x)
                })
                .collect();
            ga.tell(&cands);
            assert_eq!(ga.population().len(), 10);
        }
    }

    #[test]
    fn same_seed_same_proposals() {
        let s = space();
        let mut a = Nsga2::new(Nsga2Config::default(), &s, 11).unwrap();
        let mut b = Nsga2::new(Nsga2Config::default(), &s, 11).unwrap();
        assert_eq!(a.ask(), b.ask());
    }

    #[test]
    fn rejects_tiny_population() {
        let cfg = Nsga2Config {
            population: 1,
            ..Default::default()
        };
        assert!(Nsga2::new(cfg, &space(), 0).is_err());
    }
}
