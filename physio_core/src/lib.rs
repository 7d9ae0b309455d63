#![forbid(unsafe_code)]

//! Closed-form human-factors calculators with a trajectory and sweep harness.
//!
//! This crate provides:
//! - Point estimators (atmosphere, hypoxia, heat stress, thermal comfort,
//!   fatigue, chemical exposure, target acquisition, aviation)
//! - A bounded trajectory sampler and a two-parameter sweep grid
//! - A model catalog and name-based dispatch for front ends
//! - CSV export, configuration, and logging setup

pub mod types;
pub mod error;
pub mod atmosphere;
pub mod hypoxia;
pub mod heat;
pub mod phs;
pub mod utci;
pub mod circadian;
pub mod two_process;
pub mod exposure;
pub mod acquisition;
pub mod aviation;
pub mod sampler;
pub mod sweep;
pub mod catalog;
pub mod engine;
pub mod export;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{get_default_catalog, Catalog, ModelFamily, ModelInfo};
pub use config::{Config, OutputFormat};
pub use sampler::{simulate, trajectory, Trajectory, TrajectoryPoint, DEFAULT_MAX_POINTS};
pub use sweep::{sweep, sweep_with, Axis, SweepGrid, SweepLimits};
pub use engine::{run_model, simulate_model, sweep_model, Overrides, SimulateRequest};
