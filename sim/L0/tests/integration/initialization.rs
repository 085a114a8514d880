//! Initial guesses feeding trajectory optimization.

use approx::assert_relative_eq;
use nalgebra::{Isometry3, Vector3};
use sim_dynamics::{
    initialize_solution, joint_vels, models, ContactPoint, ContactPoints, CostModels,
    DynamicsGraph, DynamicsError, InitializationTechnique, PoseInterpolation,
};
use sim_factor_graph::{LevenbergMarquardtOptimizer, LevenbergMarquardtParams};
use sim_types::{Gravity, PlanarAxis, TrajectoryConfig};

fn swing() -> PoseInterpolation {
    let robot = models::pendulum().expect("pendulum");
    let rest = robot.link("rod").expect("rod").w_t_com();
    let lowered = Isometry3::rotation(Vector3::z() * -0.3) * rest;
    PoseInterpolation::new("rod", rest, lowered, 0.0, 0.2, 0.1)
}

/// Test: an interpolated guess covers every variable of the trajectory graph
/// and the solve lands on the same trajectory as from rest.
#[test]
fn interpolated_guess_solves_trajectory() {
    let robot = models::pendulum().expect("pendulum");
    let graph = DynamicsGraph::new(
        CostModels::default(),
        Gravity::custom(Vector3::new(0.0, -9.8, 0.0)),
        Some(PlanarAxis::Z),
    );
    let config = TrajectoryConfig::new(2, 0.1);
    let mut factors = graph.trajectory_factor_graph(&robot, &config, None).expect("graph");
    factors.extend(
        &graph
            .trajectory_fd_priors(&robot, 2, &[0.0], &[0.0], &vec![vec![0.0]; 3])
            .expect("priors"),
    );

    let initial = initialize_solution(InitializationTechnique::Interpolation, &robot, &swing(), None)
        .expect("initial values");
    assert!(factors.keys().iter().all(|k| initial.contains(*k)));

    let result = LevenbergMarquardtOptimizer::new(LevenbergMarquardtParams::precise())
        .optimize(&factors, &initial)
        .expect("optimize");
    assert!(result.error < 1e-8, "residual {}", result.error);
    assert_relative_eq!(joint_vels(&robot, &result.values, 2).expect("v")[0], -1.47, epsilon = 1e-5);
}

/// Test: contact frames follow the interpolated link.
#[test]
fn contact_frames_follow_link() {
    let robot = models::pendulum().expect("pendulum");
    let contact = ContactPoint::new(Vector3::new(1.0, 0.0, 0.0), 0).expect("contact");
    let contacts = ContactPoints::new().with("rod", contact);
    let motion = swing();
    let values = initialize_solution(InitializationTechnique::Interpolation, &robot, &motion, Some(&contacts))
        .expect("initial values");

    let rod = robot.link_id("rod").expect("rod");
    let tip = values
        .pose(sim_dynamics::keys::contact_pose_key(rod, 0, 2))
        .expect("contact pose");
    let expected = motion.goal * Isometry3::translation(1.0, 0.0, 0.0);
    assert_relative_eq!(tip.translation.vector, expected.translation.vector, epsilon = 1e-12);
}

/// Test: inverse kinematics initialization is reported, not faked.
#[test]
fn unimplemented_technique_is_an_error() {
    let robot = models::pendulum().expect("pendulum");
    let err = initialize_solution(InitializationTechnique::InverseKinematics, &robot, &swing(), None)
        .unwrap_err();
    assert!(matches!(err, DynamicsError::UnimplementedInitialization(_)));
}
