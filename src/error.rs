use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures raised while building systems and controllers or running a simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
	#[error("invalid dimension for {what}: expected {expected:?}, got {got:?}")]
	InvalidDimension {
		what: &'static str,
		expected: (usize, usize),
		got: (usize, usize),
	},

	#[error("invalid configuration: {0}")]
	InvalidConfiguration(String),

	#[error("numerical instability: {0}")]
	NumericalInstability(String),
}

impl Error {
	pub(crate) fn dimension(what: &'static str, expected: (usize, usize), got: (usize, usize)) -> Self {
		Error::InvalidDimension { what, expected, got }
	}
}

/// Failures raised while loading or running an experiment.
#[derive(Debug, Error)]
pub enum ExperimentError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error(transparent)]
	Control(#[from] Error),
}
