//! Pendulum forward dynamics over single steps and trajectories.
//!
//! The pendulum is a unit-mass rod of length 2 pivoting about `z` at one end,
//! horizontal at rest. Under gravity `-9.8 y` its angular acceleration from
//! rest is `-m g l / I = -9.8 / (4 / 3) = -7.35` wherever `q = 0`.

use approx::assert_relative_eq;
use nalgebra::Vector3;
use sim_dynamics::keys::time_key;
use sim_dynamics::{
    joint_accels, joint_angles, joint_vels, models, zero_values, zero_values_trajectory,
    CostModels, DynamicsGraph,
};
use sim_factor_graph::{
    LevenbergMarquardtOptimizer, LevenbergMarquardtParams, ManifoldOptimizer,
    ManifoldOptimizerParams, NoiseModel, PriorFactor,
};
use sim_types::{CollocationScheme, Gravity, PlanarAxis, TrajectoryConfig};

fn graph() -> DynamicsGraph {
    DynamicsGraph::new(
        CostModels::default(),
        Gravity::custom(Vector3::new(0.0, -9.8, 0.0)),
        Some(PlanarAxis::Z),
    )
}

/// Test: one-step forward dynamics by least squares and on the manifold.
#[test]
fn single_step_forward_dynamics() {
    let robot = models::pendulum().expect("pendulum");
    let graph = graph();
    let mut factors = graph.dynamics_factor_graph(&robot, 0, None).expect("graph");
    factors.extend(
        &graph
            .forward_dynamics_priors(&robot, 0, &[0.0], &[0.0], &[0.0])
            .expect("priors"),
    );
    let initial = zero_values(&robot, 0, None).expect("values");

    let lm = LevenbergMarquardtOptimizer::new(LevenbergMarquardtParams::precise())
        .optimize(&factors, &initial)
        .expect("lm");
    assert_relative_eq!(joint_accels(&robot, &lm.values, 0).expect("a")[0], -7.35, epsilon = 1e-6);

    // Every factor is hard, so the whole problem is one fully constrained
    // manifold and the solution comes out of its initial retraction.
    let manifold = ManifoldOptimizer::new(ManifoldOptimizerParams::default())
        .optimize(&factors, &initial)
        .expect("manifold");
    assert_relative_eq!(
        joint_accels(&robot, &manifold.values, 0).expect("a")[0],
        -7.35,
        epsilon = 1e-5
    );
}

/// Test: two Euler steps from rest with zero torque.
#[test]
fn euler_trajectory() {
    let robot = models::pendulum().expect("pendulum");
    let graph = graph();
    let config = TrajectoryConfig::new(2, 0.1);

    let mut factors = graph.trajectory_factor_graph(&robot, &config, None).expect("graph");
    factors.extend(
        &graph
            .trajectory_fd_priors(&robot, 2, &[0.0], &[0.0], &vec![vec![0.0]; 3])
            .expect("priors"),
    );
    let initial = zero_values_trajectory(&robot, &config, None).expect("values");
    let result = LevenbergMarquardtOptimizer::new(LevenbergMarquardtParams::precise())
        .optimize(&factors, &initial)
        .expect("optimize");
    assert!(result.error < 1e-8, "residual {}", result.error);

    let q = |t| joint_angles(&robot, &result.values, t).expect("q")[0];
    let v = |t| joint_vels(&robot, &result.values, t).expect("v")[0];
    assert_relative_eq!(q(1), 0.0, epsilon = 1e-6);
    assert_relative_eq!(v(1), -0.735, epsilon = 1e-6);
    assert_relative_eq!(q(2), -0.0735, epsilon = 1e-6);
    assert_relative_eq!(v(2), -1.47, epsilon = 1e-6);
}

/// Test: a variable step duration pinned by a prior reproduces the fixed-step
/// trajectory, starting from a zero duration guess.
#[test]
fn variable_duration_trajectory() {
    let robot = models::pendulum().expect("pendulum");
    let graph = graph();
    let config = TrajectoryConfig::new(2, 0.1)
        .with_scheme(CollocationScheme::Euler)
        .with_variable_time(0);

    let mut factors = graph.trajectory_factor_graph(&robot, &config, None).expect("graph");
    factors.extend(
        &graph
            .trajectory_fd_priors(&robot, 2, &[0.0], &[0.0], &vec![vec![0.0]; 3])
            .expect("priors"),
    );
    factors.add(PriorFactor::new(time_key(0), 0.1, NoiseModel::constrained(1)));

    let initial = zero_values_trajectory(&robot, &config, None).expect("values");
    assert_eq!(initial.scalar(time_key(0)).expect("dt"), 0.0);

    let result = LevenbergMarquardtOptimizer::new(LevenbergMarquardtParams::precise())
        .optimize(&factors, &initial)
        .expect("optimize");
    assert_relative_eq!(result.values.scalar(time_key(0)).expect("dt"), 0.1, epsilon = 1e-6);
    assert_relative_eq!(joint_vels(&robot, &result.values, 2).expect("v")[0], -1.47, epsilon = 1e-5);
}
