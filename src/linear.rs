use crate::error::{Error, Result};
use crate::prelude::*;

/// Discrete-time linear dynamics `x' = A x + B u`.
#[derive(Debug, PartialEq, Clone)]
pub struct DynamicsMatrix {
	a: Matrix,
	b: Matrix,
}

impl DynamicsMatrix {
	/// `a` must be a non-empty n×n matrix and `b` an n×m matrix with m > 0.
	pub fn new(a: Matrix, b: Matrix) -> Result<Self> {
		let n = a.nrows();
		if n == 0 || a.ncols() != n {
			return Err(Error::dimension("A", (n.max(1), n.max(1)), a.shape()));
		}
		if b.nrows() != n || b.ncols() == 0 {
			return Err(Error::dimension("B", (n, b.ncols().max(1)), b.shape()));
		}
		Ok(DynamicsMatrix { a, b })
	}

	pub fn from_rows(a: &[Vec<f64>], b: &[Vec<f64>]) -> Result<Self> {
		Self::new(matrix_from_rows("A", a)?, matrix_from_rows("B", b)?)
	}

	pub fn a(&self) -> &Matrix {
		&self.a
	}

	pub fn b(&self) -> &Matrix {
		&self.b
	}

	pub fn state_dim(&self) -> usize {
		self.a.nrows()
	}

	pub fn action_dim(&self) -> usize {
		self.b.ncols()
	}

	/// Panics if `x` or `u` do not match the state and action dimensions.
	pub fn step(&self, x: &Vector, u: &Vector) -> Vector {
		&self.a * x + &self.b * u
	}
}

/// Time-varying feedback law `u = K x`.
#[derive(Debug, PartialEq, Clone)]
pub struct LinearPolicy {
	pub k: Matrix,
}

impl LinearPolicy {
	pub fn apply(&self, x: &Vector) -> Vector {
		&self.k * x
	}
}
