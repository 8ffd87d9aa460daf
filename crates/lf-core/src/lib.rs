//! lf-core: stable foundation for lakeflow.
//!
//! Contains:
//! - units (uom SI types + water-resources conversions)
//! - numeric (Real, the round-off band, table interpolation, finite checks)
//! - series (dated daily series and the named series store)
//! - horizon, params, input, run (data shared by engines, evaluator and optimizer)
//! - error (shared error types)

pub mod error;
pub mod horizon;
pub mod input;
pub mod numeric;
pub mod params;
pub mod run;
pub mod series;
pub mod timing;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use horizon::Horizon;
pub use input::InputData;
pub use numeric::*;
pub use params::ParameterVector;
pub use run::CompletedRun;
pub use series::{SeriesSet, TimeSeries};
pub use units::*;

pub use chrono::NaiveDate;
