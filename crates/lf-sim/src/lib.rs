//! Daily simulation framework for lakeflow engines.
//!
//! Provides:
//! - the `DailyModel` trait: one pure step per simulated day
//! - `run_daily`, the fold that records every output into a `SeriesSet`
//! - guards that enforce the fail-on-nonphysical policy shared by engines

pub mod error;
pub mod guards;
pub mod model;
pub mod sim;

pub use error::{SimError, SimResult};
pub use guards::{check_mass, check_physical, snap_roundoff};
pub use model::DailyModel;
pub use sim::{DailyRun, run_daily};
