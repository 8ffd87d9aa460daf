//! Non-dominated archive of evaluated candidates.

use std::cmp::Ordering;

use crate::candidate::Candidate;
use crate::dominance::{constrained_dominates, crowding_distance};

/// Mutually non-dominated candidates seen so far.
///
/// Candidates at the same point keep only the lowest id, so the final content
/// does not depend on insertion order. When a capacity is set, `truncate`
/// drops the most crowded members.
#[derive(Clone, Debug, Default)]
pub struct ParetoArchive {
    capacity: Option<usize>,
    members: Vec<Candidate>,
}

impl ParetoArchive {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            members: Vec::new(),
        }
    }

    /// Insert `candidate` unless dominated; returns whether it was kept.
    pub fn insert(&mut self, candidate: Candidate) -> bool {
        for m in &self.members {
            if constrained_dominates(m, &candidate) {
                return false;
            }
            if m.same_point(&candidate) && m.id < candidate.id {
                return false;
            }
        }
        self.members.retain(|m| {
            !(constrained_dominates(&candidate, m) || m.same_point(&candidate))
        });
        self.members.push(candidate);
        true
    }

    /// Shrink to capacity by repeatedly dropping the most crowded member.
    pub fn truncate(&mut self) {
        let Some(cap) = self.capacity else {
            return;
        };
        self.members.sort_by_key(|c| c.id);
        while self.members.len() > cap {
            let points: Vec<&[f64]> = self.members.iter().map(|c| c.objectives.as_slice()).collect();
            let d = crowding_distance(&points);
            let worst = (0..d.len())
                .min_by(|&a, &b| {
                    d[a].partial_cmp(&d[b])
                        .unwrap_or(Ordering::Equal)
                        .then(self.members[b].id.cmp(&self.members[a].id))
                })
                .unwrap_or(0);
            self.members.remove(worst);
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Candidate] {
        &self.members
    }

    /// Members ordered by id.
    pub fn into_sorted(mut self) -> Vec<Candidate> {
        self.members.sort_by_key(|c| c.id);
        self.members
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lf_core::ParameterVector;
    use proptest::prelude::*;

    fn cand(id: u64, objectives: Vec<f64>, violation: f64) -> Candidate {
        Candidate {
            id,
            generation: 0,
            x: vec![],
            params: ParameterVector::new(),
            objectives,
            violation,
            evaluation: None,
            failure: None,
        }
    }

    #[test]
    fn dominated_candidates_are_rejected_and_evicted() {
        let mut a = ParetoArchive::new(None);
        assert!(a.insert(cand(0, vec![3.0, 3.0], 0.0)));
        assert!(!a.insert(cand(1, vec![4.0, 4.0], 0.0)));
        assert!(a.insert(cand(2, vec![1.0, 5.0], 0.0)));
        assert!(a.insert(cand(3, vec![2.0, 2.0], 0.0)));
        let ids: Vec<u64> = a.into_sorted().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn ties_keep_lowest_id() {
        let mut a = ParetoArchive::new(None);
        a.insert(cand(5, vec![1.0, 1.0], 0.0));
        a.insert(cand(2, vec![1.0, 1.0], 0.0));
        a.insert(cand(9, vec![1.0, 1.0], 0.0));
        assert_eq!(a.len(), 1);
        assert_eq!(a.members()[0].id, 2);
    }

    #[test]
    fn feasible_evicts_infeasible() {
        let mut a = ParetoArchive::new(None);
        a.insert(cand(0, vec![0.0, 0.0], 3.0));
        a.insert(cand(1, vec![9.0, 9.0], 0.0));
        assert_eq!(a.len(), 1);
        assert_eq!(a.members()[0].id, 1);
        assert!(!a.insert(cand(2, vec![-1.0, -1.0], 0.1)));
    }

    #[test]
    fn truncate_keeps_extremes() {
        let mut a = ParetoArchive::new(Some(3));
        for (i, x) in [0.0, 1.0, 1.1, 2.0, 4.0].iter().enumerate() {
            a.insert(cand(i as u64, vec![*x, 4.0 - x], 0.0));
        }
        a.truncate();
        let ids: Vec<u64> = a.into_sorted().iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains(&0) && ids.contains(&4));
    }

    proptest! {
        #[test]
        fn content_independent_of_insertion_order(
            pts in prop::collection::vec((0u8..6, 0u8..6, 0u8..3), 1..25),
            seed in any::<u64>(),
        ) {
            let cands: Vec<Candidate> = pts
                .iter()
                .enumerate()
                .map(|(i, &(a, b, v))| cand(i as u64, vec![a as f64, b as f64], v as f64))
                .collect();

            let mut forward = ParetoArchive::new(None);
            for c in cands.iter().cloned() {
                forward.insert(c);
            }

            let mut shuffled = cands.clone();
            let n = shuffled.len();
            let mut s = seed;
            for i in (1..n).rev() {
                s = s.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let j = (s >> 33) as usize % (i + 1);
                shuffled.swap(i, j);
            }
            let mut other = ParetoArchive::new(None);
            for c in shuffled {
                other.insert(c);
            }

            let a: Vec<u64> = forward.into_sorted().iter().map(|c| c.id).collect();
            let b: Vec<u64> = other.into_sorted().iter().map(|c| c.id).collect();
            prop_assert_eq!(a, b);
        }
    }
}
