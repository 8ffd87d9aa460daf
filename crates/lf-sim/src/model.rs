//! DailyModel trait for pluggable engines.

use lf_core::Horizon;

use crate::error::SimResult;

/// An engine that advances one day at a time.
///
/// `step` must be a pure function of its inputs: the previous state plus
/// whatever immutable forcing and configuration the model holds. Running the
/// same model twice therefore yields identical records.
pub trait DailyModel {
    /// Per-day state, including the day's recorded fluxes.
    type State: Clone;

    fn horizon(&self) -> &Horizon;

    /// State before the first simulated day.
    fn initial_state(&self) -> SimResult<Self::State>;

    /// Advance from `prev` through day `day` (index into the horizon).
    fn step(&self, day: usize, prev: &Self::State) -> SimResult<Self::State>;

    /// Names of the recorded outputs, in the order `record` writes them.
    fn output_names(&self) -> Vec<String>;

    /// Write the day's outputs into `out` (same length as `output_names`).
    fn record(&self, state: &Self::State, out: &mut [f64]);
}
