use lqcontrol::experiment::{self, ExperimentConfig};
use lqcontrol::{
	Controller, CostMatrix, DynamicsMatrix, Error, LinearQuadraticSystem, Lqr, Matrix, Mpc,
	SamplingConfig, SamplingControl, StaticGain, Vector,
};
use more_asserts::*;
use plotters::prelude::*;

const T: usize = 100;
const DT: f64 = 0.1;

fn double_integrator() -> LinearQuadraticSystem {
	let a = Matrix::identity(2, 2) + Matrix::from_row_slice(2, 2, &[0.0, 1.0, 0.0, 0.0]) * DT;
	let b = Matrix::from_column_slice(2, 1, &[0.0, 1.0]) * DT;
	let dynamics = DynamicsMatrix::new(a, b).unwrap();
	let cost = CostMatrix::new(Matrix::identity(2, 2) * DT, Matrix::from_element(1, 1, DT)).unwrap();
	LinearQuadraticSystem::new(dynamics, cost, DT, Vector::from_column_slice(&[1.0, 0.0])).unwrap()
}

fn cost_of(system: &LinearQuadraticSystem, controller: &mut impl Controller) -> f64 {
	system.simulate_policy(controller).unwrap().cost
}

#[test]
fn static_gain_regression() {
	let system = double_integrator();
	let mut controller = StaticGain::from_row(&[-1.0, -1.0], T).unwrap();
	let sim = system.simulate_policy(&mut controller).unwrap();

	const EXPECTED: f64 = 2.222044014418314;
	assert_eq!(sim.trajectory.len(), T + 1);
	assert_lt!((sim.cost - EXPECTED).abs(), 1e-9);
}

#[test]
fn lqr_beats_static_gain() {
	let system = double_integrator();
	let static_cost = cost_of(&system, &mut StaticGain::from_row(&[-1.0, -1.0], T).unwrap());
	let lqr_cost = cost_of(&system, &mut Lqr::new(&system, T).unwrap());
	assert_lt!(lqr_cost, static_cost);
	assert_lt!((lqr_cost - 1.8342156422646676).abs(), 1e-9);
}

#[test]
fn mpc_between_lqr_and_static_gain() {
	let system = double_integrator();
	let static_cost = cost_of(&system, &mut StaticGain::from_row(&[-1.0, -1.0], T).unwrap());
	let lqr_cost = cost_of(&system, &mut Lqr::new(&system, T).unwrap());
	let mpc_cost = cost_of(&system, &mut Mpc::new(&system, 10, T).unwrap());
	assert_lt!(lqr_cost, mpc_cost);
	assert_lt!(mpc_cost, static_cost);
}

#[test]
fn full_lookahead_mpc_is_lqr() {
	let system = double_integrator();
	let lqr = system.simulate_policy(&mut Lqr::new(&system, T).unwrap()).unwrap();
	let mpc = system.simulate_policy(&mut Mpc::new(&system, T, T).unwrap()).unwrap();
	assert_eq!(mpc.actions, lqr.actions);
	assert_eq!(mpc.trajectory, lqr.trajectory);
}

#[test]
fn sampling_improves_on_idle() {
	let system = double_integrator();
	let idle_cost = cost_of(&system, &mut StaticGain::constant(Vector::zeros(1), T).unwrap());
	let mut sampling = SamplingControl::new(&system, T, SamplingConfig::default()).unwrap();
	let sim = system.simulate_policy(&mut sampling).unwrap();
	assert_eq!(sim.trajectory.len(), T + 1);
	assert_lt!(sim.cost, idle_cost);
}

#[test]
fn mismatched_rows_fail() {
	let err = DynamicsMatrix::new(Matrix::identity(2, 2), Matrix::zeros(1, 1)).unwrap_err();
	assert!(matches!(err, Error::InvalidDimension { what: "B", .. }));
}

#[test]
fn demo_config_matches_builtin() {
	let config = ExperimentConfig::from_file("demos/double_integrator.toml").unwrap();
	assert_eq!(config, ExperimentConfig::double_integrator());
}

#[test]
fn compare_and_plot() {
	let config = ExperimentConfig::double_integrator();
	let outcomes = experiment::run(&config).unwrap();
	assert_eq!(outcomes.len(), 4);

	let drawing_area =
		BitMapBackend::new("test_images/double_integrator.png", (1024, 768)).into_drawing_area();
	drawing_area.fill(&WHITE).unwrap();
	let mut chart = ChartBuilder::on(&drawing_area)
		.build_cartesian_2d(0f64..DT * T as f64, -1f64..1.5f64)
		.unwrap();
	for (outcome, color) in outcomes.iter().zip([RED, BLUE, GREEN, BLACK]) {
		let shape_style = Into::<ShapeStyle>::into(&color).stroke_width(3);
		chart
			.draw_series(LineSeries::new(
				outcome
					.simulation
					.times()
					.into_iter()
					.zip(&outcome.simulation.trajectory)
					.map(|(t, x)| (t, x[0])),
				shape_style,
			))
			.unwrap();
	}
}
