//! Forward dynamics of a closed four-bar loop.
//!
//! The loop is grounded at `l1`. Driving `j1` and `j3` with unit torque from
//! rest must produce accelerations along the single mode the loop allows,
//! `(1, -1, 1, 1)`, with every hard constraint satisfied.

use approx::assert_relative_eq;
use sim_dynamics::{
    joint_accels, joint_torques, models, zero_values, CostModels, DynamicsGraph,
};
use sim_factor_graph::{LevenbergMarquardtOptimizer, LevenbergMarquardtParams};
use sim_types::{Gravity, PlanarAxis};

/// Test: four-bar forward dynamics under torques `(1, 0, 1, 0)`.
#[test]
fn forward_dynamics_respects_loop_closure() {
    let robot = models::four_bar().expect("four-bar");
    let graph = DynamicsGraph::new(CostModels::default(), Gravity::zero(), Some(PlanarAxis::X));

    let mut factors = graph.dynamics_factor_graph(&robot, 0, None).expect("graph");
    let torques = [1.0, 0.0, 1.0, 0.0];
    factors.extend(
        &graph
            .forward_dynamics_priors(&robot, 0, &[0.0; 4], &[0.0; 4], &torques)
            .expect("priors"),
    );

    let initial = zero_values(&robot, 0, None).expect("values");
    let result = LevenbergMarquardtOptimizer::new(LevenbergMarquardtParams::precise())
        .optimize(&factors, &initial)
        .expect("optimize");
    assert!(result.error < 1e-8, "residual {} should vanish", result.error);

    let tau = joint_torques(&robot, &result.values, 0).expect("torques");
    for (solved, commanded) in tau.iter().zip(torques) {
        assert_relative_eq!(*solved, commanded, epsilon = 1e-6);
    }

    let qdd = joint_accels(&robot, &result.values, 0).expect("accels");
    assert!(qdd[0].abs() > 1e-3, "driven loop must accelerate, got {qdd:?}");
    assert_relative_eq!(qdd[0] + qdd[1] + qdd[2] - qdd[3], 0.0, epsilon = 1e-5);
    assert_relative_eq!(qdd[2], qdd[0], epsilon = 1e-5);
    assert_relative_eq!(qdd[1], -qdd[0], epsilon = 1e-5);
    assert_relative_eq!(qdd[3], qdd[0], epsilon = 1e-5);
}

/// Test: the loop stays still without torque.
#[test]
fn unforced_loop_stays_at_rest() {
    let robot = models::four_bar().expect("four-bar");
    let graph = DynamicsGraph::new(CostModels::default(), Gravity::zero(), Some(PlanarAxis::X));

    let mut factors = graph.dynamics_factor_graph(&robot, 0, None).expect("graph");
    factors.extend(
        &graph
            .forward_dynamics_priors(&robot, 0, &[0.0; 4], &[0.0; 4], &[0.0; 4])
            .expect("priors"),
    );

    let values = zero_values(&robot, 0, None).expect("values");
    assert!(factors.error(&values).expect("error") < 1e-12);
}
