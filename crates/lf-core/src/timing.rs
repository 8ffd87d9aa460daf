//! Wall-clock accounting for engine stages.
//!
//! Off unless switched on with [`enable_timing`] or the `LF_TIMING`
//! environment variable; a disabled [`Timer`] records nothing.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

static ENABLED: AtomicBool = AtomicBool::new(false);

pub fn enable_timing() {
    ENABLED.store(true, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed) || std::env::var_os("LF_TIMING").is_some()
}

/// Measures one stage invocation.
pub struct Timer {
    started: Option<Instant>,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            started: is_enabled().then(Instant::now),
        }
    }

    /// Elapsed time, or `None` when timing was off at `start`.
    pub fn stop(self) -> Option<Duration> {
        self.started.map(|s| s.elapsed())
    }

    pub fn stop_into(self, acc: &StageTimer) {
        if let Some(elapsed) = self.stop() {
            acc.record(elapsed);
        }
    }
}

/// Running totals for one stage, shared between rayon workers.
pub struct StageTimer {
    total_ns: AtomicU64,
    max_ns: AtomicU64,
    calls: AtomicU64,
}

impl Default for StageTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl StageTimer {
    pub const fn new() -> Self {
        Self {
            total_ns: AtomicU64::new(0),
            max_ns: AtomicU64::new(0),
            calls: AtomicU64::new(0),
        }
    }

    pub fn record(&self, elapsed: Duration) {
        let ns = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.total_ns.fetch_add(ns, Ordering::Relaxed);
        self.max_ns.fetch_max(ns, Ordering::Relaxed);
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> Duration {
        Duration::from_nanos(self.total_ns.load(Ordering::Relaxed))
    }

    /// Slowest single call.
    pub fn max(&self) -> Duration {
        Duration::from_nanos(self.max_ns.load(Ordering::Relaxed))
    }

    pub fn mean(&self) -> Duration {
        match self.calls() {
            0 => Duration::ZERO,
            n => self.total() / n as u32,
        }
    }

    pub fn reset(&self) {
        self.total_ns.store(0, Ordering::Relaxed);
        self.max_ns.store(0, Ordering::Relaxed);
        self.calls.store(0, Ordering::Relaxed);
    }
}

/// Stage timers filled by the scenario runner.
pub mod engine_timing {
    use super::StageTimer;

    pub static HYDROLOGY: StageTimer = StageTimer::new();
    pub static NUTRIENT: StageTimer = StageTimer::new();
    /// Objective and constraint reduction.
    pub static EVALUATION: StageTimer = StageTimer::new();

    fn stages() -> [(&'static str, &'static StageTimer); 3] {
        [
            ("hydrology", &HYDROLOGY),
            ("nutrient", &NUTRIENT),
            ("evaluation", &EVALUATION),
        ]
    }

    pub fn reset_all() {
        for (_, t) in stages() {
            t.reset();
        }
    }

    pub fn print_summary() {
        if !super::is_enabled() {
            return;
        }
        println!("\nEngine stages:");
        for (label, t) in stages() {
            if t.calls() == 0 {
                continue;
            }
            println!(
                "  {:<11} {:>6} calls  {:>9.3}s total  {:>8.2}ms mean  {:>8.2}ms max",
                label,
                t.calls(),
                t.total().as_secs_f64(),
                t.mean().as_secs_f64() * 1e3,
                t.max().as_secs_f64() * 1e3
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_timer_totals() {
        let t = StageTimer::new();
        assert_eq!(t.mean(), Duration::ZERO);
        t.record(Duration::from_millis(500));
        t.record(Duration::from_millis(1500));
        assert_eq!(t.calls(), 2);
        assert_eq!(t.total(), Duration::from_secs(2));
        assert_eq!(t.mean(), Duration::from_secs(1));
        assert_eq!(t.max(), Duration::from_millis(1500));
        t.reset();
        assert_eq!(t.calls(), 0);
        assert_eq!(t.max(), Duration::ZERO);
    }

    #[test]
    fn disabled_timer_records_nothing() {
        let t = Timer { started: None };
        assert!(t.stop().is_none());
    }
}
