//! Kinetic Monte Carlo engine for vacancy-interstitial diffusion and recombination.
//!
//! Leaf-first: vector math and random sampling, material parameters, the
//! defect population store, the rate catalog, and the Gillespie stepper.

pub mod material;
pub mod population;
pub mod random;
pub mod rates;
pub mod sim;
pub mod vec3;

pub use material::Material;
pub use population::{Population, Species};
pub use random::{SimRng, UniformSource};
pub use rates::RateCatalog;
pub use sim::{Simulation, StepReport};
pub use vec3::Vec3;
