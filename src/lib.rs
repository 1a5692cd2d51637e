pub mod controller;
mod error;
pub mod experiment;
mod linear;
mod prelude;
mod quadratic;
pub mod riccati;
mod system;

#[cfg(feature = "proptest-support")]
pub mod proptest;

pub use controller::{Controller, Lqr, Mpc, SamplingConfig, SamplingControl, StaticGain};
pub use error::{Error, ExperimentError, Result};
pub use linear::{DynamicsMatrix, LinearPolicy};
pub use prelude::*;
pub use quadratic::{CostMatrix, QuadraticCost, QuadraticStateCost};
pub use system::{LinearQuadraticSystem, Simulation};
