use std::ops::RangeInclusive;

use crate::{prelude::*, CostMatrix, DynamicsMatrix, QuadraticStateCost};
use nalgebra::Dynamic;
use proptest::strategy::Strategy;

fn scalar() -> RangeInclusive<f64> {
	-2.0..=2.0
}

pub fn matrix(rows: usize, cols: usize) -> impl Strategy<Value = Matrix> {
	nalgebra::proptest::matrix(scalar(), Dynamic::new(rows), Dynamic::new(cols))
}

pub fn vector(n: usize) -> impl Strategy<Value = Vector> {
	matrix(n, 1).prop_map(|m| m.column(0).into_owned())
}

fn psd_matrix(n: usize) -> impl Strategy<Value = Matrix> {
	matrix(n, n).prop_map(|a| a.tr_mul(&a))
}

fn pd_matrix(n: usize) -> impl Strategy<Value = Matrix> {
	psd_matrix(n).prop_map(move |a| a + Matrix::identity(n, n) * 0.1)
}

pub fn dynamics_matrix(n: usize, m: usize) -> impl Strategy<Value = DynamicsMatrix> {
	(matrix(n, n), matrix(n, m)).prop_map(|(a, b)| DynamicsMatrix::new(a, b).unwrap())
}

/// Stage costs with `Cxx` positive semi-definite and `Cuu` positive definite.
pub fn cost_matrix(n: usize, m: usize) -> impl Strategy<Value = CostMatrix> {
	(psd_matrix(n), pd_matrix(m)).prop_map(|(cxx, cuu)| {
		// Products of a matrix with its transpose are symmetric only up to rounding.
		let cxx = (&cxx + cxx.transpose()) * 0.5;
		let cuu = (&cuu + cuu.transpose()) * 0.5;
		CostMatrix::new(cxx, cuu).unwrap()
	})
}

/// Stage costs with a cross term, drawn as one positive definite matrix over the stacked `[x; u]` so the stage cost stays convex.
pub fn cross_cost_matrix(n: usize, m: usize) -> impl Strategy<Value = CostMatrix> {
	pd_matrix(n + m).prop_map(move |joint| {
		let joint = (&joint + joint.transpose()) * 0.5;
		let cxx = joint.slice((0, 0), (n, n)).into_owned();
		let cuu = joint.slice((n, n), (m, m)).into_owned();
		let cxu = joint.slice((0, n), (n, m)).into_owned();
		CostMatrix::new(cxx, cuu).unwrap().with_cross_term(cxu).unwrap()
	})
}

pub fn quadratic_state_cost(n: usize) -> impl Strategy<Value = QuadraticStateCost> {
	psd_matrix(n).prop_map(|p| QuadraticStateCost { p })
}
