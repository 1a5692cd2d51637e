use log::debug;

use super::{ensure_horizon, ensure_within_horizon, Controller};
use crate::error::Result;
use crate::prelude::*;
use crate::riccati::riccati_policies;
use crate::{LinearPolicy, LinearQuadraticSystem, QuadraticStateCost};

/// Finite-horizon linear-quadratic regulator with gains precomputed at construction.
#[derive(Debug, PartialEq, Clone)]
pub struct Lqr {
	policies: Vec<LinearPolicy>,
	label: String,
}

impl Lqr {
	/// Uses `Cxx` as the terminal cost.
	pub fn new(system: &LinearQuadraticSystem, horizon: usize) -> Result<Self> {
		Self::with_terminal_cost(system, horizon, system.cost().cxx().clone())
	}

	pub fn with_terminal_cost(
		system: &LinearQuadraticSystem,
		horizon: usize,
		terminal_cost: Matrix,
	) -> Result<Self> {
		ensure_horizon(horizon)?;
		let n = system.state_dim();
		ensure_shape("terminal cost", &terminal_cost, n, n)?;
		let policies = riccati_policies(
			system.dynamics(),
			system.cost(),
			&QuadraticStateCost { p: terminal_cost },
			horizon,
		)?;
		debug!("LQR precomputed {} gains", policies.len());
		Ok(Lqr {
			policies,
			label: "LQR".into(),
		})
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = label.into();
		self
	}

	/// Feedback gains `K[0..horizon]`.
	pub fn gains(&self) -> impl Iterator<Item = &Matrix> {
		self.policies.iter().map(|policy| &policy.k)
	}
}

impl Controller for Lqr {
	fn label(&self) -> &str {
		&self.label
	}

	fn horizon(&self) -> usize {
		self.policies.len()
	}

	fn act(&mut self, x: &Vector, t: usize) -> Result<Vector> {
		ensure_within_horizon(t, self.policies.len())?;
		ensure_len("state", x, self.policies[t].k.ncols())?;
		Ok(self.policies[t].apply(x))
	}
}
