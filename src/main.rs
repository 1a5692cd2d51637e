//! Runs a controller comparison and prints each controller's total cost.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use lqcontrol::experiment::{self, ControllerConfig, ExperimentConfig};
use lqcontrol::ExperimentError;

/// Compare feedback controllers on a linear-quadratic system.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
	/// Experiment description in TOML. Defaults to the double integrator.
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Override the simulation horizon.
	#[arg(long)]
	horizon: Option<usize>,

	/// Override the seed of every sampling controller.
	#[arg(short, long)]
	seed: Option<u64>,

	/// Also print every trajectory as CSV rows `label,time,x0,x1,...`.
	#[arg(short, long)]
	trajectories: bool,
}

fn load(cli: &Cli) -> Result<ExperimentConfig, ExperimentError> {
	let mut config = match &cli.config {
		Some(path) => ExperimentConfig::from_file(path)?,
		None => ExperimentConfig::double_integrator(),
	};
	if let Some(horizon) = cli.horizon {
		config.horizon = horizon;
	}
	if let Some(seed) = cli.seed {
		for controller in &mut config.controllers {
			if let ControllerConfig::Sampling { sampling, .. } = controller {
				sampling.seed = seed;
			}
		}
	}
	Ok(config)
}

fn run(cli: &Cli) -> Result<(), ExperimentError> {
	let config = load(cli)?;
	let outcomes = experiment::run(&config)?;

	println!("\nComparing Controllers\n");
	for outcome in &outcomes {
		println!("{}: {}", outcome.label, outcome.simulation.cost);
	}

	if cli.trajectories {
		println!();
		for outcome in &outcomes {
			for (t, x) in outcome.simulation.times().iter().zip(&outcome.simulation.trajectory) {
				let state: Vec<String> = x.iter().map(f64::to_string).collect();
				println!("{},{},{}", outcome.label, t, state.join(","));
			}
		}
	}
	Ok(())
}

fn main() -> ExitCode {
	env_logger::init();
	let cli = Cli::parse();
	match run(&cli) {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			eprintln!("error: {}", err);
			ExitCode::FAILURE
		}
	}
}
