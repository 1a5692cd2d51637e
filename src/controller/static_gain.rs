use super::{ensure_horizon, ensure_within_horizon, Controller};
use crate::error::{Error, Result};
use crate::prelude::*;

#[derive(Debug, PartialEq, Clone)]
enum Law {
	Feedback(Matrix),
	Constant(Vector),
}

/// A fixed feedback gain `u = K x`, or a fixed action.
#[derive(Debug, PartialEq, Clone)]
pub struct StaticGain {
	law: Law,
	horizon: usize,
	label: String,
}

impl StaticGain {
	/// `gain` is m×n.
	pub fn new(gain: Matrix, horizon: usize) -> Result<Self> {
		ensure_horizon(horizon)?;
		if gain.is_empty() {
			return Err(Error::dimension("gain", (1, 1), gain.shape()));
		}
		Ok(Self::with_law(Law::Feedback(gain), horizon))
	}

	/// A single-input gain given as an n-vector.
	pub fn from_row(gain: &[f64], horizon: usize) -> Result<Self> {
		Self::new(Matrix::from_row_slice(1, gain.len(), gain), horizon)
	}

	/// Applies `u` at every step regardless of the state.
	pub fn constant(u: Vector, horizon: usize) -> Result<Self> {
		ensure_horizon(horizon)?;
		Ok(Self::with_law(Law::Constant(u), horizon))
	}

	fn with_law(law: Law, horizon: usize) -> Self {
		StaticGain {
			law,
			horizon,
			label: "Static".into(),
		}
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = label.into();
		self
	}
}

impl Controller for StaticGain {
	fn label(&self) -> &str {
		&self.label
	}

	fn horizon(&self) -> usize {
		self.horizon
	}

	fn act(&mut self, x: &Vector, t: usize) -> Result<Vector> {
		ensure_within_horizon(t, self.horizon)?;
		match &self.law {
			Law::Feedback(k) => {
				if k.ncols() != x.len() {
					return Err(Error::dimension("gain", (k.nrows(), x.len()), k.shape()));
				}
				Ok(k * x)
			}
			Law::Constant(u) => Ok(u.clone()),
		}
	}
}
