use log::{debug, trace};

use crate::controller::Controller;
use crate::error::{Error, Result};
use crate::prelude::*;
use crate::{CostMatrix, DynamicsMatrix, QuadraticStateCost};

/// A discrete-time linear system with quadratic stage cost.
///
/// Read-only once built: controllers copy what they need from it, and any number of simulations may borrow it at once.
#[derive(Debug, PartialEq, Clone)]
pub struct LinearQuadraticSystem {
	dynamics: DynamicsMatrix,
	cost: CostMatrix,
	dt: f64,
	x0: Vector,
}

impl LinearQuadraticSystem {
	pub fn new(dynamics: DynamicsMatrix, cost: CostMatrix, dt: f64, x0: Vector) -> Result<Self> {
		cost.ensure_compatible(&dynamics)?;
		ensure_len("x0", &x0, dynamics.state_dim())?;
		if !(dt.is_finite() && dt > 0.0) {
			return Err(Error::InvalidConfiguration(format!("dt must be positive, got {}", dt)));
		}
		if x0.iter().any(|c| !c.is_finite()) {
			return Err(Error::InvalidConfiguration("x0 contains non-finite entries".into()));
		}
		Ok(LinearQuadraticSystem { dynamics, cost, dt, x0 })
	}

	pub fn dynamics(&self) -> &DynamicsMatrix {
		&self.dynamics
	}

	pub fn cost(&self) -> &CostMatrix {
		&self.cost
	}

	pub fn dt(&self) -> f64 {
		self.dt
	}

	pub fn x0(&self) -> &Vector {
		&self.x0
	}

	pub fn state_dim(&self) -> usize {
		self.dynamics.state_dim()
	}

	pub fn action_dim(&self) -> usize {
		self.dynamics.action_dim()
	}

	pub fn step(&self, x: &Vector, u: &Vector) -> Vector {
		self.dynamics.step(x, u)
	}

	pub fn stage_cost(&self, x: &Vector, u: &Vector) -> f64 {
		self.cost.compute(x, u)
	}

	/// The default terminal value used by planners, `xᵀ Cxx x`.
	pub fn terminal_cost(&self) -> QuadraticStateCost {
		QuadraticStateCost {
			p: self.cost.cxx().clone(),
		}
	}

	/// Rolls `controller` forward from `x0` over its horizon.
	pub fn simulate_policy<C: Controller + ?Sized>(&self, controller: &mut C) -> Result<Simulation> {
		self.simulate_policy_from(controller, &self.x0)
	}

	pub fn simulate_policy_from<C: Controller + ?Sized>(
		&self,
		controller: &mut C,
		x0: &Vector,
	) -> Result<Simulation> {
		ensure_len("x0", x0, self.state_dim())?;
		let horizon = controller.horizon();
		if horizon == 0 {
			return Err(Error::InvalidConfiguration("horizon must be positive".into()));
		}
		controller.reset();

		let mut trajectory = Vec::with_capacity(horizon + 1);
		let mut actions = Vec::with_capacity(horizon);
		let mut cost = 0.0;
		trajectory.push(x0.clone());
		for t in 0..horizon {
			let x = &trajectory[t];
			let u = controller.act(x, t)?;
			ensure_len("action", &u, self.action_dim())?;
			if !is_finite(&u) {
				return Err(Error::NumericalInstability(format!(
					"{} produced a non-finite action at step {}",
					controller.label(),
					t
				)));
			}
			let stage_cost = self.stage_cost(x, &u);
			let x_next = self.step(x, &u);
			if !is_finite(&x_next) {
				return Err(Error::NumericalInstability(format!(
					"state diverged at step {}",
					t + 1
				)));
			}
			trace!("{} t={} u={:?} cost={}", controller.label(), t, u.as_slice(), stage_cost);
			cost += stage_cost;
			trajectory.push(x_next);
			actions.push(u);
		}
		if !cost.is_finite() {
			return Err(Error::NumericalInstability(format!(
				"{} accumulated a non-finite cost",
				controller.label()
			)));
		}
		debug!("{} finished {} steps with cost {}", controller.label(), horizon, cost);
		Ok(Simulation {
			trajectory,
			actions,
			cost,
			dt: self.dt,
		})
	}
}

/// The outcome of one simulation run.
#[derive(Debug, PartialEq, Clone)]
pub struct Simulation {
	/// States `x[0..=horizon]`.
	pub trajectory: Vec<Vector>,
	/// Actions `u[0..horizon]` as applied.
	pub actions: Vec<Vector>,
	/// Sum of the stage costs.
	pub cost: f64,
	dt: f64,
}

impl Simulation {
	pub fn horizon(&self) -> usize {
		self.actions.len()
	}

	/// Sample times `dt * [0..=horizon]`.
	pub fn times(&self) -> Vec<f64> {
		(0..self.trajectory.len()).map(|t| t as f64 * self.dt).collect()
	}

	/// The trajectory as a `(horizon + 1) × n` matrix, one state per row.
	pub fn trajectory_matrix(&self) -> Matrix {
		let n = self.trajectory.first().map_or(0, Vector::len);
		Matrix::from_fn(self.trajectory.len(), n, |t, i| self.trajectory[t][i])
	}
}
