use crate::candidate::Candidate;

/// Ask/tell search strategy.
///
/// `ask` proposes the next batch of decision vectors; `tell` receives the
/// candidates that were actually evaluated from it (possibly fewer when a
/// budget ran out mid-batch). Implementations must be deterministic for a
/// given seed and sequence of `tell` calls.
pub trait Solver: Send {
    fn name(&self) -> &'static str;

    fn ask(&mut self) -> Vec<Vec<f64>>;

    fn tell(&mut self, evaluated: &[Candidate]);
}
