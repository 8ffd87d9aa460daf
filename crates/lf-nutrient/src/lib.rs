//! Daily total phosphorus mass balance driven by hydrology output.
//!
//! Two pools: phosphorus in the water column and in the active sediment.
//! Outflow and settling losses are linear in water-column mass and are taken
//! implicitly so the pool cannot overshoot below zero on large-flow days.
//! Sediment release and burial are explicit fractions of yesterday's pool.

pub mod config;
pub mod engine;

pub use config::NutrientConfig;
pub use engine::{NutrientModel, NutrientState, simulate_nutrients};
