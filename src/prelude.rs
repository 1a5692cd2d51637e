use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};

pub type Matrix = DMatrix<f64>;
pub type Vector = DVector<f64>;

/// Builds a matrix from row-major nested arrays, rejecting ragged rows.
pub fn matrix_from_rows(what: &'static str, rows: &[Vec<f64>]) -> Result<Matrix> {
	let ncols = rows.first().map_or(0, Vec::len);
	if let Some(row) = rows.iter().find(|row| row.len() != ncols) {
		return Err(Error::dimension(what, (rows.len(), ncols), (rows.len(), row.len())));
	}
	Ok(Matrix::from_fn(rows.len(), ncols, |i, j| rows[i][j]))
}

pub(crate) fn ensure_shape(what: &'static str, m: &Matrix, rows: usize, cols: usize) -> Result<()> {
	if m.shape() != (rows, cols) {
		return Err(Error::dimension(what, (rows, cols), m.shape()));
	}
	Ok(())
}

pub(crate) fn ensure_len(what: &'static str, v: &Vector, len: usize) -> Result<()> {
	if v.len() != len {
		return Err(Error::dimension(what, (len, 1), (v.len(), 1)));
	}
	Ok(())
}

pub(crate) fn is_finite(v: &Vector) -> bool {
	v.iter().all(|x| x.is_finite())
}

pub(crate) fn ensure_finite(what: &str, v: &Vector) -> Result<()> {
	if is_finite(v) {
		Ok(())
	} else {
		Err(Error::NumericalInstability(format!("{} contains non-finite values", what)))
	}
}
