//! Compare several controllers on one system.
//!
//! Every run builds its own controller from configuration, so runs share nothing mutable and execute in parallel.

use std::path::Path;

use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, ExperimentError, Result};
use crate::prelude::*;
use crate::{
	Controller, CostMatrix, DynamicsMatrix, LinearQuadraticSystem, Lqr, Mpc, SamplingConfig,
	SamplingControl, Simulation, StaticGain,
};

/// System matrices as plain row-major arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
	pub a: Vec<Vec<f64>>,
	pub b: Vec<Vec<f64>>,
	pub cxx: Vec<Vec<f64>>,
	pub cuu: Vec<Vec<f64>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cxu: Option<Vec<Vec<f64>>>,
	pub dt: f64,
	pub x0: Vec<f64>,
}

impl SystemConfig {
	pub fn build(&self) -> Result<LinearQuadraticSystem> {
		let dynamics = DynamicsMatrix::from_rows(&self.a, &self.b)?;
		let mut cost = CostMatrix::new(
			matrix_from_rows("Cxx", &self.cxx)?,
			matrix_from_rows("Cuu", &self.cuu)?,
		)?;
		if let Some(cxu) = &self.cxu {
			cost = cost.with_cross_term(matrix_from_rows("Cxu", cxu)?)?;
		}
		LinearQuadraticSystem::new(dynamics, cost, self.dt, Vector::from_column_slice(&self.x0))
	}
}

fn default_static_label() -> String {
	"Static".into()
}
fn default_lqr_label() -> String {
	"LQR".into()
}
fn default_mpc_label() -> String {
	"MPC".into()
}
fn default_sampling_label() -> String {
	"Sampling".into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControllerConfig {
	StaticGain {
		#[serde(default = "default_static_label")]
		label: String,
		/// m×n gain, or a single row for one input.
		gain: Vec<Vec<f64>>,
	},
	Lqr {
		#[serde(default = "default_lqr_label")]
		label: String,
	},
	Mpc {
		#[serde(default = "default_mpc_label")]
		label: String,
		predictive_horizon: usize,
	},
	Sampling {
		#[serde(default = "default_sampling_label")]
		label: String,
		#[serde(default)]
		sampling: SamplingConfig,
	},
}

impl ControllerConfig {
	/// Builds a fresh controller instance for one run.
	pub fn build(&self, system: &LinearQuadraticSystem, horizon: usize) -> Result<Box<dyn Controller>> {
		let controller: Box<dyn Controller> = match self {
			ControllerConfig::StaticGain { label, gain } => Box::new(
				StaticGain::new(matrix_from_rows("gain", gain)?, horizon)?.with_label(label.as_str()),
			),
			ControllerConfig::Lqr { label } => {
				Box::new(Lqr::new(system, horizon)?.with_label(label.as_str()))
			}
			ControllerConfig::Mpc {
				label,
				predictive_horizon,
			} => Box::new(Mpc::new(system, *predictive_horizon, horizon)?.with_label(label.as_str())),
			ControllerConfig::Sampling { label, sampling } => Box::new(
				SamplingControl::new(system, horizon, sampling.clone())?.with_label(label.as_str()),
			),
		};
		Ok(controller)
	}
}

const fn default_horizon() -> usize {
	100
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
	#[serde(default = "default_horizon")]
	pub horizon: usize,
	pub system: SystemConfig,
	pub controllers: Vec<ControllerConfig>,
}

impl ExperimentConfig {
	/// Unit mass on a frictionless line, `x = [position, velocity]`, compared under static, LQR, MPC and sampling control.
	pub fn double_integrator() -> Self {
		let dt = 0.1;
		ExperimentConfig {
			horizon: default_horizon(),
			system: SystemConfig {
				a: vec![vec![1.0, dt], vec![0.0, 1.0]],
				b: vec![vec![0.0], vec![dt]],
				cxx: vec![vec![dt, 0.0], vec![0.0, dt]],
				cuu: vec![vec![dt]],
				cxu: None,
				dt,
				x0: vec![1.0, 0.0],
			},
			controllers: vec![
				ControllerConfig::StaticGain {
					label: default_static_label(),
					gain: vec![vec![-1.0, -1.0]],
				},
				ControllerConfig::Lqr {
					label: default_lqr_label(),
				},
				ControllerConfig::Mpc {
					label: default_mpc_label(),
					predictive_horizon: 10,
				},
				ControllerConfig::Sampling {
					label: default_sampling_label(),
					sampling: SamplingConfig::default(),
				},
			],
		}
	}

	pub fn from_toml_str(content: &str) -> Result<Self, ExperimentError> {
		let config: Self = toml::from_str(content)?;
		config.validate()?;
		Ok(config)
	}

	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ExperimentError> {
		let content = std::fs::read_to_string(path)?;
		Self::from_toml_str(&content)
	}

	pub fn validate(&self) -> Result<()> {
		if self.horizon == 0 {
			return Err(Error::InvalidConfiguration("horizon must be positive".into()));
		}
		for controller in &self.controllers {
			if let ControllerConfig::Sampling { sampling, .. } = controller {
				sampling.validate()?;
			}
		}
		Ok(())
	}
}

/// One controller's run.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
	pub label: String,
	pub simulation: Simulation,
}

/// Simulates every configured controller once, in configuration order.
pub fn run(config: &ExperimentConfig) -> Result<Vec<Outcome>> {
	config.validate()?;
	let system = config.system.build()?;
	config
		.controllers
		.par_iter()
		.map(|controller_config| {
			let mut controller = controller_config.build(&system, config.horizon)?;
			let simulation = system.simulate_policy(&mut controller)?;
			info!("{}: {}", controller.label(), simulation.cost);
			Ok(Outcome {
				label: controller.label().to_string(),
				simulation,
			})
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use more_asserts::*;

	const DOUBLE_INTEGRATOR: &str = r#"
horizon = 40

[system]
a = [[1.0, 0.1], [0.0, 1.0]]
b = [[0.0], [0.1]]
cxx = [[0.1, 0.0], [0.0, 0.1]]
cuu = [[0.1]]
dt = 0.1
x0 = [1.0, 0.0]

[[controllers]]
kind = "static_gain"
gain = [[-1.0, -1.0]]

[[controllers]]
kind = "lqr"
label = "Optimal"

[[controllers]]
kind = "mpc"
predictive_horizon = 5

[[controllers]]
kind = "sampling"

[controllers.sampling]
burn_in = 20
samples = 8
seed = 11
"#;

	#[test]
	fn parse_toml() {
		let config = ExperimentConfig::from_toml_str(DOUBLE_INTEGRATOR).unwrap();
		assert_eq!(config.horizon, 40);
		assert_eq!(config.controllers.len(), 4);
		assert_eq!(
			config.controllers[2],
			ControllerConfig::Mpc {
				label: "MPC".into(),
				predictive_horizon: 5,
			}
		);
		match &config.controllers[3] {
			ControllerConfig::Sampling { sampling, .. } => {
				assert_eq!(sampling.burn_in, 20);
				assert_eq!(sampling.kl_weight, 1.0);
				assert_eq!(sampling.exploration_covariance, 10.0);
			}
			other => panic!("unexpected controller {:?}", other),
		}
	}

	#[test]
	fn run_in_order() {
		let config = ExperimentConfig::from_toml_str(DOUBLE_INTEGRATOR).unwrap();
		let outcomes = run(&config).unwrap();
		let labels: Vec<&str> = outcomes.iter().map(|o| o.label.as_str()).collect();
		assert_eq!(labels, ["Static", "Optimal", "MPC", "Sampling"]);
		for outcome in &outcomes {
			assert_eq!(outcome.simulation.trajectory.len(), 41);
			assert!(outcome.simulation.cost.is_finite());
		}
		assert_lt!(outcomes[1].simulation.cost, outcomes[0].simulation.cost);
	}

	#[test]
	fn invalid_sampling_config() {
		let content = DOUBLE_INTEGRATOR.replace("burn_in = 20", "exploration_covariance = 0.0");
		let err = ExperimentConfig::from_toml_str(&content).unwrap_err();
		assert!(matches!(err, ExperimentError::Control(Error::InvalidConfiguration(_))));
	}

	#[test]
	fn mismatched_system() {
		let mut config = ExperimentConfig::double_integrator();
		config.system.b = vec![vec![0.0], vec![0.1], vec![0.0]];
		let err = run(&config).unwrap_err();
		assert!(matches!(err, Error::InvalidDimension { what: "B", .. }));
	}

	#[test]
	fn malformed_toml() {
		let err = ExperimentConfig::from_toml_str("horizon = \"long\"").unwrap_err();
		assert!(matches!(err, ExperimentError::Toml(_)));
	}

	#[test]
	fn default_round_trips_through_toml() {
		let config = ExperimentConfig::double_integrator();
		let content = toml::to_string(&config).unwrap();
		assert_eq!(ExperimentConfig::from_toml_str(&content).unwrap(), config);
	}
}
