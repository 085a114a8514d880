//! Action and reaction across a joint between two free links.

use approx::assert_relative_eq;
use nalgebra::Vector6;
use sim_dynamics::factors::WrenchEquivalenceFactor;
use sim_dynamics::keys::{joint_angle_key, wrench_key};
use sim_dynamics::models;
use sim_factor_graph::{Factor, NoiseModel, Values};

/// Test: the residual vanishes exactly when the wrenches are related by the
/// joint transform and grows linearly with a perturbation.
#[test]
fn wrench_equivalence_is_linear_in_the_mismatch() {
    let robot = models::simple_rr().expect("arm");
    let joint = robot.joint("j2").expect("j2");
    let (kp, kc, kq) = (
        wrench_key(joint.parent(), joint.id(), 0),
        wrench_key(joint.child(), joint.id(), 0),
        joint_angle_key(joint.id(), 0),
    );
    let motion = *joint.child_motion();
    let factor = WrenchEquivalenceFactor::new(kp, kc, kq, NoiseModel::constrained(6), motion);

    let q = 0.4;
    let f_c = Vector6::new(0.1, -0.2, 0.3, 1.0, -2.0, 0.5);
    let f_p = -(motion.adjoint(q).transpose() * f_c);
    let values = |f_p: Vector6<f64>, f_c: Vector6<f64>| {
        let mut v = Values::new();
        v.insert(kp, f_p).unwrap();
        v.insert(kc, f_c).unwrap();
        v.insert(kq, q).unwrap();
        v
    };

    let balanced = factor.unwhitened_error(&values(f_p, f_c), None).expect("error");
    assert_relative_eq!(balanced.norm(), 0.0, epsilon = 1e-12);

    let delta = Vector6::new(0.0, 0.0, 1e-4, 0.0, -2e-4, 0.0);
    let e = factor.unwhitened_error(&values(f_p + delta, f_c), None).expect("error");
    assert_relative_eq!(e.norm(), delta.norm(), epsilon = 1e-12);

    let e1 = factor.unwhitened_error(&values(f_p, f_c + delta), None).expect("error");
    let e2 = factor.unwhitened_error(&values(f_p, f_c + 2.0 * delta), None).expect("error");
    assert!(e1.norm() > 0.0);
    assert_relative_eq!(e2.norm(), 2.0 * e1.norm(), epsilon = 1e-12);
}
