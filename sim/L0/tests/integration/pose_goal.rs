//! Pose-goal inverse kinematics of a planar two-link arm.
//!
//! Both rods are 2 long, so commanding `(π/4, 0)` puts the tip at
//! `4 (cos π/4, sin π/4, 0)` rotated by `π/4` about `z`. The goal is a soft
//! cost on the tip pose; the kinematic chain is hard.

use std::f64::consts::FRAC_PI_4;

use approx::assert_relative_eq;
use nalgebra::{Isometry3, Vector3};
use sim_dynamics::{joint_angles, models, zero_values, DynamicsGraph, Robot};
use sim_factor_graph::{
    FactorGraph, LevenbergMarquardtOptimizer, LevenbergMarquardtParams, ManifoldOptimizer,
    ManifoldOptimizerParams, NoiseModel, OptimizationResult, Values,
};

fn problem() -> (Robot, FactorGraph, Values) {
    let robot = models::simple_rr().expect("arm");
    let graph = DynamicsGraph::default();
    let mut factors = graph.kinematics_factor_graph(&robot, 0).expect("kinematics");

    let reach = 2.0 * models::ROD_LENGTH;
    let goal = Isometry3::new(
        Vector3::new(reach * FRAC_PI_4.cos(), reach * FRAC_PI_4.sin(), 0.0),
        Vector3::z() * FRAC_PI_4,
    );
    factors.add(
        graph
            .pose_goal_factor(&robot, "link2", 0, goal, models::simple_rr_tip(), NoiseModel::isotropic(6, 0.1))
            .expect("goal"),
    );
    let initial = zero_values(&robot, 0, None).expect("values");
    (robot, factors, initial)
}

fn check(robot: &Robot, result: &OptimizationResult) {
    assert!(result.error < 1e-6, "residual {} should vanish", result.error);
    let q = joint_angles(robot, &result.values, 0).expect("angles");
    assert_relative_eq!(q[0], FRAC_PI_4, epsilon = 1e-3);
    assert_relative_eq!(q[1], 0.0, epsilon = 1e-3);
}

/// Test: hard kinematics weighted into one least-squares problem.
#[test]
fn converges_by_least_squares() {
    let (robot, factors, initial) = problem();
    let result = LevenbergMarquardtOptimizer::new(LevenbergMarquardtParams::precise())
        .optimize(&factors, &initial)
        .expect("optimize");
    check(&robot, &result);
}

/// Test: kinematics reduced to a two-dimensional constraint manifold.
#[test]
fn converges_on_constraint_manifold() {
    let (robot, factors, initial) = problem();
    let params =
        ManifoldOptimizerParams::default().with_lm_params(LevenbergMarquardtParams::precise());
    let result = ManifoldOptimizer::new(params)
        .optimize(&factors, &initial)
        .expect("optimize");
    check(&robot, &result);

    // The chain stays exactly assembled along the way.
    let kinematics = DynamicsGraph::default()
        .kinematics_factor_graph(&robot, 0)
        .expect("kinematics");
    assert!(kinematics.error(&result.values).expect("error") < 1e-8);
}
