//! Daily hydrology engine for a regulated lake.
//!
//! The lake is operated from a seasonal regulation schedule: the previous
//! day's stage selects an operating zone, the zone and tributary condition
//! select a release level, and each outlet structure turns the level into a
//! flow. A water balance then limits ET, water supply and releases to the
//! water actually held and derives the new storage and stage.
//!
//! Entry point: [`simulate_hydrology`].

pub mod config;
pub mod engine;
pub mod forcing;
pub mod geometry;
pub mod optimized;
pub mod protocol;
pub mod release;
pub mod schedule;
pub mod structure;
pub mod supply;
pub mod tributary;

pub use config::{EtMode, HydroConfig, InitialCondition, ReleaseMode};
pub use engine::{HydroModel, HydroState, StructureDay, simulate_hydrology};
pub use geometry::LakeGeometry;
pub use optimized::OptimizedRule;
pub use protocol::{AdaptiveProtocol, EwsMode, LowChanceLine};
pub use release::{ReleaseLevel, release_level, season};
pub use schedule::{LineKind, RegulationSchedule, ScheduleLine, Zone};
pub use structure::{Augmentation, BackflowRule, LevelRates, PulsePattern, Structure};
pub use supply::{DemandSource, WaterSupply};
pub use tributary::{ThcClass, TributaryClassifier};
