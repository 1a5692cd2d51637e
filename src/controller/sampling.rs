use std::collections::VecDeque;

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use super::{ensure_horizon, ensure_within_horizon, Controller};
use crate::error::{Error, Result};
use crate::prelude::*;
use crate::quadratic::ensure_symmetric;
use crate::riccati::{compute_total_cost, rollout};
use crate::{CostMatrix, DynamicsMatrix, LinearQuadraticSystem, QuadraticStateCost};

const fn default_kl_weight() -> f64 {
	1.0
}
const fn default_burn_in() -> usize {
	100
}
const fn default_exploration_covariance() -> f64 {
	10.0
}
const fn default_samples() -> usize {
	32
}
const fn default_iterations_per_step() -> usize {
	1
}

/// Tuning for [`SamplingControl`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
	/// Temperature of the softmin reweighting. Smaller values concentrate weight on the cheapest samples.
	#[serde(default = "default_kl_weight")]
	pub kl_weight: f64,

	/// Refinement iterations run on the first call after a reset.
	#[serde(default = "default_burn_in")]
	pub burn_in: usize,

	/// Isotropic exploration intensity per unit time; one step samples from `Normal(0, exploration_covariance * dt)`.
	#[serde(default = "default_exploration_covariance")]
	pub exploration_covariance: f64,

	/// Perturbed sequences drawn per iteration, in addition to the unperturbed nominal.
	#[serde(default = "default_samples")]
	pub samples: usize,

	#[serde(default = "default_iterations_per_step")]
	pub iterations_per_step: usize,

	#[serde(default)]
	pub seed: u64,
}

impl Default for SamplingConfig {
	fn default() -> Self {
		Self {
			kl_weight: default_kl_weight(),
			burn_in: default_burn_in(),
			exploration_covariance: default_exploration_covariance(),
			samples: default_samples(),
			iterations_per_step: default_iterations_per_step(),
			seed: 0,
		}
	}
}

impl SamplingConfig {
	pub fn validate(&self) -> Result<()> {
		if !(self.kl_weight.is_finite() && self.kl_weight > 0.0) {
			return Err(Error::InvalidConfiguration(format!(
				"kl_weight must be positive, got {}",
				self.kl_weight
			)));
		}
		if !(self.exploration_covariance.is_finite() && self.exploration_covariance > 0.0) {
			return Err(Error::InvalidConfiguration(format!(
				"exploration_covariance must be positive, got {}",
				self.exploration_covariance
			)));
		}
		if self.samples == 0 {
			return Err(Error::InvalidConfiguration("samples must be positive".into()));
		}
		Ok(())
	}
}

/// Normalized softmin weights `w_k ∝ exp(-cost_k / kl_weight)`.
///
/// The exponent is shifted by the minimum cost, so the cheapest sample always has an unnormalized weight of one and the sum never overflows.
pub fn importance_weights(costs: &[f64], kl_weight: f64) -> Result<Vec<f64>> {
	if costs.is_empty() {
		return Err(Error::InvalidConfiguration("no samples to weight".into()));
	}
	if !(kl_weight.is_finite() && kl_weight > 0.0) {
		return Err(Error::InvalidConfiguration(format!(
			"kl_weight must be positive, got {}",
			kl_weight
		)));
	}
	if costs.iter().any(|c| !c.is_finite()) {
		return Err(Error::NumericalInstability("sampled cost is not finite".into()));
	}
	let min = costs.iter().copied().fold(f64::INFINITY, f64::min);
	let mut weights: Vec<f64> = costs.iter().map(|c| (-(c - min) / kl_weight).exp()).collect();
	let total: f64 = weights.iter().sum();
	for w in &mut weights {
		*w /= total;
	}
	Ok(weights)
}

/// Path-integral style controller that refines a nominal action sequence by importance-weighted random perturbations.
///
/// Exploration covariances are intensities per unit time: each step perturbs an action with `Normal(0, Σ·dt)`, so a covariance of 10 at `dt = 0.1` gives a per-step variance of 1.
///
/// The nominal sequence and the random number generator evolve across calls within a run, so each concurrent run needs its own instance.
#[derive(Debug, Clone)]
pub struct SamplingControl {
	dynamics: DynamicsMatrix,
	cost: CostMatrix,
	terminal_cost: QuadraticStateCost,
	dt: f64,
	horizon: usize,
	config: SamplingConfig,
	/// Lower-triangular factor of the per-step perturbation covariance.
	noise_factor: Matrix,
	initial_nominal: Vec<Vector>,
	nominal: VecDeque<Vector>,
	rng: ChaCha8Rng,
	warmed_up: bool,
	label: String,
}

impl SamplingControl {
	pub fn new(system: &LinearQuadraticSystem, horizon: usize, config: SamplingConfig) -> Result<Self> {
		ensure_horizon(horizon)?;
		config.validate()?;
		let m = system.action_dim();
		let noise_factor = Matrix::identity(m, m) * (config.exploration_covariance * system.dt()).sqrt();
		let initial_nominal = vec![Vector::zeros(m); horizon];
		Ok(SamplingControl {
			dynamics: system.dynamics().clone(),
			cost: system.cost().clone(),
			terminal_cost: system.terminal_cost(),
			dt: system.dt(),
			horizon,
			noise_factor,
			nominal: initial_nominal.iter().cloned().collect(),
			initial_nominal,
			rng: ChaCha8Rng::seed_from_u64(config.seed),
			warmed_up: false,
			config,
			label: "Sampling".into(),
		})
	}

	/// Replaces the isotropic exploration with a full m×m covariance per unit time, which must be positive definite.
	pub fn with_exploration_covariance(mut self, covariance: Matrix) -> Result<Self> {
		let m = self.dynamics.action_dim();
		ensure_shape("exploration covariance", &covariance, m, m)?;
		ensure_symmetric("exploration covariance", &covariance)?;
		let factor = (covariance * self.dt).cholesky().ok_or_else(|| {
			Error::InvalidConfiguration("exploration covariance must be positive definite".into())
		})?;
		self.noise_factor = factor.unpack();
		Ok(self)
	}

	/// Warm-starts the nominal sequence. Shorter sequences are padded with zeros.
	pub fn with_nominal(mut self, nominal: Vec<Vector>) -> Result<Self> {
		if nominal.len() > self.horizon {
			return Err(Error::dimension("nominal", (self.horizon, 1), (nominal.len(), 1)));
		}
		let m = self.dynamics.action_dim();
		for u in &nominal {
			ensure_len("nominal action", u, m)?;
			ensure_finite("nominal action", u)?;
		}
		let mut nominal = nominal;
		nominal.resize(self.horizon, Vector::zeros(m));
		self.initial_nominal = nominal;
		self.reset();
		Ok(self)
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = label.into();
		self
	}

	pub fn config(&self) -> &SamplingConfig {
		&self.config
	}

	/// The current nominal sequence, starting at the next action to be applied.
	pub fn nominal(&self) -> impl Iterator<Item = &Vector> {
		self.nominal.iter()
	}

	fn sample_noise(&mut self) -> Vector {
		let m = self.noise_factor.ncols();
		let rng = &mut self.rng;
		let z = Vector::from_fn(m, |_, _| rng.sample::<f64, _>(StandardNormal));
		&self.noise_factor * z
	}

	/// One reweighting pass over the first `steps` entries of the nominal sequence.
	fn refine(&mut self, x: &Vector, steps: usize) -> Result<()> {
		let m = self.dynamics.action_dim();
		let mut perturbations = Vec::with_capacity(self.config.samples + 1);
		perturbations.push(vec![Vector::zeros(m); steps]);
		for _ in 0..self.config.samples {
			let noise: Vec<Vector> = (0..steps).map(|_| self.sample_noise()).collect();
			perturbations.push(noise);
		}

		let costs: Vec<f64> = perturbations
			.iter()
			.map(|noise| {
				let us: Vec<Vector> = self.nominal.iter().zip(noise).map(|(u, e)| u + e).collect();
				let xs = rollout(&self.dynamics, x.clone(), &us);
				compute_total_cost(&self.cost, &self.terminal_cost, &xs, &us)
			})
			.collect();
		let weights = importance_weights(&costs, self.config.kl_weight)?;

		for (i, u) in self.nominal.iter_mut().take(steps).enumerate() {
			for (w, noise) in weights.iter().zip(&perturbations) {
				*u += &noise[i] * *w;
			}
			ensure_finite("nominal action", u)?;
		}
		Ok(())
	}
}

impl Controller for SamplingControl {
	fn label(&self) -> &str {
		&self.label
	}

	fn horizon(&self) -> usize {
		self.horizon
	}

	fn act(&mut self, x: &Vector, t: usize) -> Result<Vector> {
		ensure_within_horizon(t, self.horizon)?;
		ensure_len("state", x, self.dynamics.state_dim())?;
		let remaining = self.horizon - t;

		let mut iterations = self.config.iterations_per_step;
		if !self.warmed_up {
			debug!("{} burning in for {} iterations", self.label, self.config.burn_in);
			iterations += self.config.burn_in;
			self.warmed_up = true;
		}
		for _ in 0..iterations {
			self.refine(x, remaining)?;
		}

		let m = self.dynamics.action_dim();
		let u = self.nominal.pop_front().unwrap_or_else(|| Vector::zeros(m));
		self.nominal.push_back(Vector::zeros(m));
		Ok(u)
	}

	fn reset(&mut self) {
		self.nominal = self.initial_nominal.iter().cloned().collect();
		self.rng = ChaCha8Rng::seed_from_u64(self.config.seed);
		self.warmed_up = false;
	}
}
