//! Static equilibrium of open chains at rest.
//!
//! With zero gravity and zero torque the rest configuration, with every
//! twist, acceleration and wrench zero, satisfies every physical law.

use nalgebra::Vector3;
use sim_dynamics::{models, zero_values, CostModels, DynamicsGraph};
use sim_types::{Gravity, PlanarAxis};

/// Test: zero assignment satisfies the arm's dynamics graph.
#[test]
fn rest_satisfies_dynamics() {
    let robot = models::simple_rr().expect("arm");
    for planar in [None, Some(PlanarAxis::Z)] {
        let graph = DynamicsGraph::new(CostModels::default(), Gravity::zero(), planar);
        let factors = graph.dynamics_factor_graph(&robot, 0, None).expect("graph");
        let values = zero_values(&robot, 0, None).expect("values");
        let error = factors.error(&values).expect("error");
        assert!(error < 1e-12, "rest should be an equilibrium, error {error}");
    }
}

/// Test: gravity breaks the equilibrium of the zero assignment.
#[test]
fn gravity_needs_support() {
    let robot = models::simple_rr().expect("arm");
    let graph = DynamicsGraph::new(
        CostModels::default(),
        Gravity::custom(Vector3::new(0.0, -9.8, 0.0)),
        Some(PlanarAxis::Z),
    );
    let factors = graph.dynamics_factor_graph(&robot, 0, None).expect("graph");
    let values = zero_values(&robot, 0, None).expect("values");
    assert!(factors.error(&values).expect("error") > 1.0);
}
