mod lqr;
mod mpc;
mod sampling;
mod static_gain;

pub use lqr::Lqr;
pub use mpc::Mpc;
pub use sampling::{importance_weights, SamplingConfig, SamplingControl};
pub use static_gain::StaticGain;

use crate::error::{Error, Result};
use crate::prelude::*;

/// A feedback law queried once per simulation step.
///
/// Implementations may carry state between calls (`SamplingControl` does), so an instance must not be shared between concurrent runs.
pub trait Controller {
	fn label(&self) -> &str;

	/// Number of steps this controller is configured to run for.
	fn horizon(&self) -> usize;

	fn act(&mut self, x: &Vector, t: usize) -> Result<Vector>;

	/// Restores the state a fresh run starts from.
	fn reset(&mut self) {}
}

impl<C: Controller + ?Sized> Controller for Box<C> {
	fn label(&self) -> &str {
		(**self).label()
	}

	fn horizon(&self) -> usize {
		(**self).horizon()
	}

	fn act(&mut self, x: &Vector, t: usize) -> Result<Vector> {
		(**self).act(x, t)
	}

	fn reset(&mut self) {
		(**self).reset()
	}
}

pub(crate) fn ensure_horizon(horizon: usize) -> Result<()> {
	if horizon == 0 {
		return Err(Error::InvalidConfiguration("horizon must be positive".into()));
	}
	Ok(())
}

pub(crate) fn ensure_within_horizon(t: usize, horizon: usize) -> Result<()> {
	if t >= horizon {
		return Err(Error::InvalidConfiguration(format!(
			"time step {} is outside the horizon of {} steps",
			t, horizon
		)));
	}
	Ok(())
}
