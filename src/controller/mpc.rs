use log::debug;

use super::{ensure_horizon, ensure_within_horizon, Controller};
use crate::error::{Error, Result};
use crate::prelude::*;
use crate::riccati::riccati_policies;
use crate::{CostMatrix, DynamicsMatrix, LinearQuadraticSystem, QuadraticStateCost};

/// Receding-horizon control: every call re-solves an LQR problem over the next `predictive_horizon` steps and applies its first action.
#[derive(Debug, PartialEq, Clone)]
pub struct Mpc {
	dynamics: DynamicsMatrix,
	cost: CostMatrix,
	terminal_cost: QuadraticStateCost,
	predictive_horizon: usize,
	horizon: usize,
	label: String,
}

impl Mpc {
	pub fn new(system: &LinearQuadraticSystem, predictive_horizon: usize, horizon: usize) -> Result<Self> {
		ensure_horizon(horizon)?;
		if predictive_horizon == 0 {
			return Err(Error::InvalidConfiguration("predictive horizon must be positive".into()));
		}
		let mpc = Mpc {
			dynamics: system.dynamics().clone(),
			cost: system.cost().clone(),
			terminal_cost: system.terminal_cost(),
			predictive_horizon,
			horizon,
			label: "MPC".into(),
		};
		// The recursion does not depend on the state, so the longest plan fails here if any plan would.
		riccati_policies(&mpc.dynamics, &mpc.cost, &mpc.terminal_cost, mpc.lookahead(0))?;
		Ok(mpc)
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = label.into();
		self
	}

	pub fn predictive_horizon(&self) -> usize {
		self.predictive_horizon
	}

	/// Steps planned at time `t`, shrinking as the end of the overall horizon approaches.
	///
	/// At least one for every `t < horizon`; zero past the end.
	pub fn lookahead(&self, t: usize) -> usize {
		self.predictive_horizon.min(self.horizon.saturating_sub(t))
	}
}

impl Controller for Mpc {
	fn label(&self) -> &str {
		&self.label
	}

	fn horizon(&self) -> usize {
		self.horizon
	}

	fn act(&mut self, x: &Vector, t: usize) -> Result<Vector> {
		ensure_within_horizon(t, self.horizon)?;
		ensure_len("state", x, self.dynamics.state_dim())?;
		let lookahead = self.lookahead(t);
		let policies = riccati_policies(&self.dynamics, &self.cost, &self.terminal_cost, lookahead)?;
		if lookahead < self.predictive_horizon {
			debug!("{} lookahead clipped to {} at t={}", self.label, lookahead, t);
		}
		Ok(policies[0].apply(x))
	}
}
