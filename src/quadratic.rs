use crate::error::{Error, Result};
use crate::prelude::*;
use crate::{DynamicsMatrix, LinearPolicy};

const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Smallest admissible ratio between the squared extreme Cholesky pivots of `Quu`.
const PIVOT_RATIO_TOLERANCE: f64 = 1e-12;

/// Stage cost `xᵀ Cxx x + uᵀ Cuu u + 2 xᵀ Cxu u`.
#[derive(Debug, PartialEq, Clone)]
pub struct CostMatrix {
	cxx: Matrix,
	cuu: Matrix,
	cxu: Option<Matrix>,
}

impl CostMatrix {
	pub fn new(cxx: Matrix, cuu: Matrix) -> Result<Self> {
		ensure_symmetric("Cxx", &cxx)?;
		ensure_symmetric("Cuu", &cuu)?;
		Ok(CostMatrix { cxx, cuu, cxu: None })
	}

	pub fn with_cross_term(mut self, cxu: Matrix) -> Result<Self> {
		ensure_shape("Cxu", &cxu, self.state_dim(), self.action_dim())?;
		self.cxu = Some(cxu);
		Ok(self)
	}

	pub fn cxx(&self) -> &Matrix {
		&self.cxx
	}

	pub fn cuu(&self) -> &Matrix {
		&self.cuu
	}

	pub fn cxu(&self) -> Option<&Matrix> {
		self.cxu.as_ref()
	}

	pub fn state_dim(&self) -> usize {
		self.cxx.nrows()
	}

	pub fn action_dim(&self) -> usize {
		self.cuu.nrows()
	}

	/// Computes the cost at a given state and control.
	pub fn compute(&self, x: &Vector, u: &Vector) -> f64 {
		let mut cost = (&self.cxx * x).dot(x) + (&self.cuu * u).dot(u);
		if let Some(cxu) = &self.cxu {
			cost += 2.0 * (cxu * u).dot(x);
		}
		cost
	}

	pub(crate) fn ensure_compatible(&self, dynamics: &DynamicsMatrix) -> Result<()> {
		let (n, m) = (dynamics.state_dim(), dynamics.action_dim());
		ensure_shape("Cxx", &self.cxx, n, n)?;
		ensure_shape("Cuu", &self.cuu, m, m)
	}
}

pub(crate) fn ensure_symmetric(what: &'static str, m: &Matrix) -> Result<()> {
	if !m.is_square() {
		return Err(Error::dimension(what, (m.nrows(), m.nrows()), m.shape()));
	}
	if m.iter().any(|c| !c.is_finite()) {
		return Err(Error::InvalidConfiguration(format!("{} contains non-finite entries", what)));
	}
	let asymmetry = (m - m.transpose()).amax();
	if asymmetry > SYMMETRY_TOLERANCE * (1.0 + m.amax()) {
		return Err(Error::InvalidConfiguration(format!("{} is not symmetric", what)));
	}
	Ok(())
}

/// A quadratic cost over states, `xᵀ P x`.
#[derive(Debug, PartialEq, Clone)]
pub struct QuadraticStateCost {
	pub p: Matrix,
}

impl QuadraticStateCost {
	/// Computes the cost at a given state.
	pub fn compute(&self, x: &Vector) -> f64 {
		(&self.p * x).dot(x)
	}

	/// Returns the cost over states and controls of paying `stage` now and this cost at the state produced by applying the given dynamics.
	pub fn backstep(&self, dynamics: &DynamicsMatrix, stage: &CostMatrix) -> QuadraticCost {
		let pa = &self.p * dynamics.a();
		let pb = &self.p * dynamics.b();
		let mut q_ux = dynamics.b().tr_mul(&pa);
		if let Some(cxu) = stage.cxu() {
			q_ux += cxu.transpose();
		}
		QuadraticCost {
			q_xx: stage.cxx() + dynamics.a().tr_mul(&pa),
			q_ux,
			q_uu: stage.cuu() + dynamics.b().tr_mul(&pb),
		}
	}
}

/// A joint quadratic cost `xᵀ Qxx x + uᵀ Quu u + 2 uᵀ Qux x`.
#[derive(Debug, PartialEq, Clone)]
pub struct QuadraticCost {
	pub q_xx: Matrix,
	pub q_ux: Matrix,
	pub q_uu: Matrix,
}

impl QuadraticCost {
	/// Computes the cost at a given state and control.
	pub fn compute(&self, x: &Vector, u: &Vector) -> f64 {
		(&self.q_xx * x).dot(x) + (&self.q_uu * u).dot(u) + 2.0 * (&self.q_ux * x).dot(u)
	}

	/// Solves for the linear policy that minimizes the cost, or `None` when `Quu` is not safely positive definite.
	pub fn optimal_policy_and_cost(&self) -> Option<(LinearPolicy, QuadraticStateCost)> {
		let s = self.q_uu.clone().cholesky()?;
		let pivots = s.l_dirty().diagonal();
		let (lo, hi) = pivots
			.iter()
			.fold((f64::INFINITY, 0.0f64), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
		if !(lo * lo > PIVOT_RATIO_TOLERANCE * hi * hi) {
			return None;
		}
		let k = -s.solve(&self.q_ux);
		let k_tr_q_ux = k.tr_mul(&self.q_ux);
		let k_tr_q_uu = k.tr_mul(&self.q_uu);
		let p = &self.q_xx + &k_tr_q_ux + k_tr_q_ux.transpose() + &k_tr_q_uu * &k;
		Some((LinearPolicy { k }, QuadraticStateCost { p }))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::proptest::*;
	use more_asserts::*;
	use proptest::prelude::*;

	#[test]
	fn cross_term_cost() {
		let cost = CostMatrix::new(Matrix::identity(2, 2), Matrix::identity(1, 1) * 3.0)
			.unwrap()
			.with_cross_term(Matrix::from_column_slice(2, 1, &[0.5, -1.0]))
			.unwrap();
		let x = Vector::from_column_slice(&[1.0, 2.0]);
		let u = Vector::from_column_slice(&[2.0]);
		// 5 + 12 + 2 * (0.5 * 2 - 1.0 * 4)
		assert_eq!(cost.compute(&x, &u), 11.0);
	}

	#[test]
	fn asymmetric_cost() {
		let cxx = Matrix::from_row_slice(2, 2, &[1.0, 0.5, 0.0, 1.0]);
		let err = CostMatrix::new(cxx, Matrix::identity(1, 1)).unwrap_err();
		assert!(matches!(err, Error::InvalidConfiguration(_)));
	}

	#[test]
	fn mismatched_cross_term() {
		let cost = CostMatrix::new(Matrix::identity(2, 2), Matrix::identity(1, 1)).unwrap();
		let err = cost.with_cross_term(Matrix::zeros(1, 2)).unwrap_err();
		assert_eq!(err, Error::dimension("Cxu", (2, 1), (1, 2)));
	}

	#[test]
	fn singular_quu() {
		let cost = QuadraticCost {
			q_xx: Matrix::identity(2, 2),
			q_ux: Matrix::zeros(1, 2),
			q_uu: Matrix::zeros(1, 1),
		};
		assert!(cost.optimal_policy_and_cost().is_none());
	}

	proptest! {
		#[test]
		fn backstep(dynamics in dynamics_matrix(3, 2),
					stage in cost_matrix(3, 2),
					value in quadratic_state_cost(3),
					x in vector(3), u in vector(2)) {
			let backstep_cost = value.backstep(&dynamics, &stage);
			let expected = stage.compute(&x, &u) + value.compute(&dynamics.step(&x, &u));

			const EPSILON: f64 = 1e-8;
			assert_lt!(backstep_cost.compute(&x, &u), expected + EPSILON);
			assert_gt!(backstep_cost.compute(&x, &u), expected - EPSILON);
		}

		#[test]
		fn backstep_with_cross_term(dynamics in dynamics_matrix(3, 2),
									stage in cross_cost_matrix(3, 2),
									value in quadratic_state_cost(3),
									x in vector(3), u in vector(2)) {
			let backstep_cost = value.backstep(&dynamics, &stage);
			let expected = stage.compute(&x, &u) + value.compute(&dynamics.step(&x, &u));

			const EPSILON: f64 = 1e-8;
			assert_lt!(backstep_cost.compute(&x, &u), expected + EPSILON);
			assert_gt!(backstep_cost.compute(&x, &u), expected - EPSILON);
		}

		#[test]
		fn optimal_policy_with_cross_term(dynamics in dynamics_matrix(3, 2),
										stage in cross_cost_matrix(3, 2),
										value in quadratic_state_cost(3),
										x in vector(3), u in vector(2)) {
			let cost = value.backstep(&dynamics, &stage);
			let (policy, state_cost) = cost.optimal_policy_and_cost().unwrap();
			let u_star = policy.apply(&x);

			const EPSILON: f64 = 1e-8;
			assert_gt!(cost.compute(&x, &u) + EPSILON, cost.compute(&x, &u_star));
			assert_lt!((state_cost.compute(&x) - cost.compute(&x, &u_star)).abs(), EPSILON);
		}

		#[test]
		fn optimal_policy(dynamics in dynamics_matrix(3, 2),
						stage in cost_matrix(3, 2),
						value in quadratic_state_cost(3),
						x in vector(3), u in vector(2)) {
			let cost = value.backstep(&dynamics, &stage);
			let (policy, _) = cost.optimal_policy_and_cost().unwrap();
			let u_star = policy.apply(&x);

			const EPSILON: f64 = 1e-8;
			assert_gt!(cost.compute(&x, &u) + EPSILON, cost.compute(&x, &u_star));
		}

		#[test]
		fn optimal_cost(dynamics in dynamics_matrix(3, 2),
						stage in cost_matrix(3, 2),
						value in quadratic_state_cost(3),
						x in vector(3)) {
			let cost = value.backstep(&dynamics, &stage);
			let (policy, state_cost) = cost.optimal_policy_and_cost().unwrap();
			let u_star = policy.apply(&x);

			const EPSILON: f64 = 1e-8;
			assert_lt!(state_cost.compute(&x), cost.compute(&x, &u_star) + EPSILON);
			assert_gt!(state_cost.compute(&x), cost.compute(&x, &u_star) - EPSILON);
		}
	}
}
