//! Kinetic Monte Carlo simulation of vacancies and interstitials in a crystal.
//!
//! Defects hop by a fixed nearest-neighbour distance in random directions with
//! Arrhenius rates per species, and a vacancy and an interstitial annihilate
//! when they come within the recombination distance. Each run reports the
//! surviving defect count and the jump count of each species, and can stream
//! an extended-XYZ trajectory.
//!
//! ```no_run
//! use defectsim::{driver, trajectory::XyzWriter, RunConfig};
//!
//! # fn main() -> defectsim::error::Result<()> {
//! let config = RunConfig::new(150, 150, 1500.0, 4.0, 1e9, 1000, 1).with_seed(12345);
//! let mut out = XyzWriter::create("vi.xyz")?;
//! let result = driver::run_seeded(&config, 12345, &mut out)?;
//! println!("{} defects survive", result.defects_surviving);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod driver;
pub mod error;
pub mod stats;
pub mod trajectory;

pub use crate::config::RunConfig;
pub use crate::core::{Material, Population, Simulation, Species, Vec3};
pub use crate::driver::{Ensemble, RunResult, StopSignal, Termination};
pub use crate::error::{Error, Result};
pub use crate::stats::{EnsembleStats, Summary};
