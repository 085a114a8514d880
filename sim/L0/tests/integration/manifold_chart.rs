//! Constraint manifolds built from robot kinematics.
//!
//! The arm's kinematic chain has six pose variables per link and one
//! coordinate per joint; with the base pinned it leaves a two-dimensional
//! manifold of assembled configurations.

use std::sync::Arc;

use approx::assert_relative_eq;
use nalgebra::DVector;
use sim_dynamics::{joint_angles, models, zero_values, DynamicsGraph};
use sim_factor_graph::{ConnectedComponent, ConstraintManifold, Key, ManifoldParams, RetractType};

fn manifold(retract_type: RetractType) -> (Arc<ConnectedComponent>, ConstraintManifold) {
    let robot = models::simple_rr().expect("arm");
    let (constraints, costs) = DynamicsGraph::default()
        .kinematics_factor_graph(&robot, 0)
        .expect("kinematics")
        .split_constrained();
    assert!(costs.is_empty());

    let mut components = ConnectedComponent::identify(&constraints);
    assert_eq!(components.len(), 1);
    let cc = Arc::new(components.remove(0));
    let values = zero_values(&robot, 0, None).expect("values");
    let manifold = ConstraintManifold::new(
        Arc::clone(&cc),
        &values,
        Arc::new(ManifoldParams::kernel(retract_type)),
        true,
        true,
        vec![],
    )
    .expect("manifold");
    (cc, manifold)
}

/// Test: declared dimension and basis agree, and the basis spans the null
/// space of the linearized chain.
#[test]
fn basis_is_null_space_of_kinematics() {
    let (cc, manifold) = manifold(RetractType::Unconstrained);
    assert_eq!(manifold.dim(), 2);
    assert_eq!(manifold.basis().ncols(), 2);

    let ordering: Vec<Key> = cc.keys.iter().copied().collect();
    let jacobian = cc
        .merit_graph
        .linearize(manifold.values(), &ordering)
        .expect("linearize")
        .jacobian;
    assert_relative_eq!((jacobian * manifold.basis()).norm(), 0.0, epsilon = 1e-6);
}

/// Test: local coordinates invert retraction near the origin.
#[test]
fn chart_round_trip() {
    for retract_type in [RetractType::Unconstrained, RetractType::Projection] {
        let (_, manifold) = manifold(retract_type);
        let same = manifold.retract(&DVector::zeros(2)).expect("retract");
        assert_relative_eq!(
            manifold.local_coordinates(&same).expect("local").norm(),
            0.0,
            epsilon = 1e-8
        );

        let xi = DVector::from_vec(vec![1e-3, -2e-3]);
        let moved = manifold.retract(&xi).expect("retract");
        let back = manifold.local_coordinates(&moved).expect("local");
        assert_relative_eq!(back, xi, epsilon = 1e-5);

        // The retracted point is a real arm configuration.
        let robot = models::simple_rr().expect("arm");
        let chain = DynamicsGraph::default()
            .kinematics_factor_graph(&robot, 0)
            .expect("kinematics");
        let mut values = zero_values(&robot, 0, None).expect("values");
        values.assign(moved.values());
        assert!(chain.error(&values).expect("error") < 1e-8);
        assert!(joint_angles(&robot, &values, 0).expect("q").iter().any(|q| q.abs() > 1e-5));
    }
}
