//! Constrained Pareto dominance, non-dominated sorting and crowding distance.

use std::cmp::Ordering;

use crate::candidate::Candidate;

/// `a` is no worse in every objective and strictly better in at least one.
pub fn pareto_dominates(a: &[f64], b: &[f64]) -> bool {
    let mut strictly = false;
    for (&x, &y) in a.iter().zip(b) {
        if x > y {
            return false;
        }
        if x < y {
            strictly = true;
        }
    }
    strictly
}

/// Feasible beats infeasible, lower violation beats higher, then Pareto.
pub fn constrained_dominates(a: &Candidate, b: &Candidate) -> bool {
    match (a.is_feasible(), b.is_feasible()) {
        (true, false) => true,
        (false, true) => false,
        (false, false) => a.violation < b.violation,
        (true, true) => pareto_dominates(&a.objectives, &b.objectives),
    }
}

/// Fronts of indices into `candidates`, best front first.
pub fn non_dominated_sort(candidates: &[Candidate]) -> Vec<Vec<usize>> {
    let n = candidates.len();
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut counts = vec![0usize; n];
    let mut fronts = vec![Vec::new()];

    for i in 0..n {
        for j in (i + 1)..n {
            if constrained_dominates(&candidates[i], &candidates[j]) {
                dominated_by[i].push(j);
                counts[j] += 1;
            } else if constrained_dominates(&candidates[j], &candidates[i]) {
                dominated_by[j].push(i);
                counts[i] += 1;
            }
        }
        if counts[i] == 0 {
            fronts[0].push(i);
        }
    }

    let mut k = 0;
    while k < fronts.len() && !fronts[k].is_empty() {
        let mut next = Vec::new();
        for &i in &fronts[k] {
            for &j in &dominated_by[i] {
                counts[j] -= 1;
                if counts[j] == 0 {
                    next.push(j);
                }
            }
        }
        next.sort_unstable();
        if next.is_empty() {
            break;
        }
        fronts.push(next);
        k += 1;
    }
    if fronts[0].is_empty() {
        fronts.clear();
    }
    fronts
}

/// Crowding distance of each point within one front; boundary points get +inf.
pub fn crowding_distance(points: &[&[f64]]) -> Vec<f64> {
    let n = points.len();
    let mut distance = vec![0.0; n];
    if n <= 2 {
        return vec![f64::INFINITY; n];
    }
    let m = points[0].len();
    let mut order: Vec<usize> = (0..n).collect();
    for k in 0..m {
        order.sort_by(|&a, &b| {
            points[a][k]
                .partial_cmp(&points[b][k])
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(&b))
        });
        let lo = points[order[0]][k];
        let hi = points[order[n - 1]][k];
        distance[order[0]] = f64::INFINITY;
        distance[order[n - 1]] = f64::INFINITY;
        let range = hi - lo;
        if !(range.is_finite() && range > 0.0) {
            continue;
        }
        for w in 1..(n - 1) {
            let gap = points[order[w + 1]][k] - points[order[w - 1]][k];
            distance[order[w]] += gap / range;
        }
    }
    distance
}

#[cfg(test)]
mod tests {
    use super::*;
    use lf_core::ParameterVector;

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
    fn pareto_basics() {
        assert!(pareto_dominates(&[1.0, 1.0], &[1.0, 2.0]));
        assert!(!pareto_dominates(&[1.0, 2.0], &[1.0, 2.0]));
        assert!(!pareto_dominates(&[0.0, 3.0], &[1.0, 2.0]));
    }

    #[test]
    fn feasibility_first() {
        let feasible = cand(0, vec![100.0, 100.0], 0.0);
        let infeasible = cand(1, vec![0.0, 0.0], 0.5);
        assert!(constrained_dominates(&feasible, &infeasible));
        assert!(!constrained_dominates(&infeasible, &feasible));

        let worse = cand(2, vec![0.0, 0.0], 2.0);
        assert!(constrained_dominates(&infeasible, &worse));
    }

    #[test]
    fn sorts_into_fronts() {
        let cs = vec![
            cand(0, vec![1.0, 4.0], 0.0),
            cand(1, vec![2.0, 2.0], 0.0),
            cand(2, vec![4.0, 1.0], 0.0),
            cand(3, vec![3.0, 3.0], 0.0),
            cand(4, vec![5.0, 5.0], 0.0),
            cand(5, vec![0.0, 0.0], 1.0),
        ];
        let fronts = non_dominated_sort(&cs);
        assert_eq!(fronts[0], vec![0, 1, 2]);
        assert_eq!(fronts[1], vec![3]);
        assert_eq!(fronts[2], vec![4]);
        assert_eq!(fronts[3], vec![5]);
    }

    #[test]
    fn crowding_boundaries_are_infinite() {
        let pts: Vec<Vec<f64>> = vec![vec![0.0, 4.0], vec![1.0, 2.0], vec![4.0, 0.0]];
        let refs: Vec<&[f64]> = pts.iter().map(|p| p.as_slice()).collect();
        let d = crowding_distance(&refs);
        assert!(d[0].is_infinite() && d[2].is_infinite());
        assert!((d[1] - 2.0).abs() < 1e-12);
    }
}
