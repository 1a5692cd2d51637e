use itertools::izip;
use log::trace;

use crate::error::{Error, Result};
use crate::prelude::*;
use crate::{CostMatrix, DynamicsMatrix, LinearPolicy, QuadraticStateCost};

/// Runs the backward Riccati recursion from `terminal_cost` and returns the feedback gains for steps `0..horizon`.
pub fn riccati_policies(
	dynamics: &DynamicsMatrix,
	cost: &CostMatrix,
	terminal_cost: &QuadraticStateCost,
	horizon: usize,
) -> Result<Vec<LinearPolicy>> {
	let mut policies = Vec::with_capacity(horizon);
	let mut value = terminal_cost.clone();
	for t in (0..horizon).rev() {
		let (policy, next_value) = value
			.backstep(dynamics, cost)
			.optimal_policy_and_cost()
			.ok_or_else(|| {
				Error::NumericalInstability(format!("Cuu + BᵀPB is singular at step {}", t))
			})?;
		if policy.k.iter().chain(next_value.p.iter()).any(|c| !c.is_finite()) {
			return Err(Error::NumericalInstability(format!(
				"Riccati recursion diverged at step {}",
				t
			)));
		}
		policies.push(policy);
		value = next_value;
	}
	trace!("Riccati recursion produced {} gains", policies.len());
	policies.reverse();
	Ok(policies)
}

pub fn rollout(dynamics: &DynamicsMatrix, x0: Vector, us: &[Vector]) -> Vec<Vector> {
	let mut xs = Vec::with_capacity(us.len() + 1);
	xs.push(x0);
	for u in us {
		let x = dynamics.step(&xs[xs.len() - 1], u);
		xs.push(x);
	}
	xs
}

/// Sums the stage costs along a rollout plus the terminal cost of its final state.
pub fn compute_total_cost(
	cost: &CostMatrix,
	terminal_cost: &QuadraticStateCost,
	xs: &[Vector],
	us: &[Vector],
) -> f64 {
	let mut total_cost = xs.last().map_or(0.0, |x| terminal_cost.compute(x));
	for (x, u) in izip!(xs, us) {
		total_cost += cost.compute(x, u);
	}
	total_cost
}
