//! Physical-law factors.
//!
//! Each factor is a residual over dynamics variables named by the key
//! functions of [`crate::keys`]. Factors with cheap closed-form derivatives
//! provide analytic Jacobians; pose-valued residuals fall back to central
//! differences through [`numerical_jacobians`](sim_factor_graph::numerical_jacobians).

mod collocation;
mod contact;
mod joint_limit;
mod pose;
mod pose_goal;
mod torque;
mod twist;
mod twist_accel;
mod wrench;
mod wrench_equivalence;
mod wrench_planar;

pub use collocation::{CollocationFactor, StepDuration};
pub use contact::{
    ContactPoseFactor, PreintegratedPointContactFactor, PreintegratedPointContactMeasurements,
    PreintegratedRigidContactFactor, PreintegratedRigidContactMeasurements,
};
pub use joint_limit::JointLimitFactor;
pub use pose::PoseFactor;
pub use pose_goal::PoseGoalFactor;
pub use torque::TorqueFactor;
pub use twist::TwistFactor;
pub use twist_accel::TwistAccelFactor;
pub use wrench::{WrenchFactor, MAX_WRENCHES};
pub use wrench_equivalence::WrenchEquivalenceFactor;
pub use wrench_planar::WrenchPlanarFactor;

use nalgebra::{storage::Storage, DMatrix, DVector, Dim, Matrix};

/// Copy a statically sized block into a Jacobian.
pub(crate) fn dense<R: Dim, C: Dim, S: Storage<f64, R, C>>(m: &Matrix<f64, R, C, S>) -> DMatrix<f64> {
    DMatrix::from_iterator(m.nrows(), m.ncols(), m.iter().copied())
}

/// Copy a statically sized vector into a residual.
pub(crate) fn residual<R: Dim, S: Storage<f64, R>>(v: &Matrix<f64, R, nalgebra::U1, S>) -> DVector<f64> {
    DVector::from_iterator(v.nrows(), v.iter().copied())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared checks for factor tests.

    use approx::assert_relative_eq;
    use sim_factor_graph::{numerical_jacobians, Factor, Jacobians, Values};

    /// Compare a factor's analytic Jacobians with central differences.
    #[allow(clippy::unwrap_used)]
    pub fn assert_jacobians_match(factor: &dyn Factor, values: &Values, tolerance: f64) {
        let mut analytic = Jacobians::new();
        factor.unwhitened_error(values, Some(&mut analytic)).unwrap();
        let numeric =
            numerical_jacobians(|v| factor.unwhitened_error(v, None), factor.keys(), values).unwrap();
        assert_eq!(analytic.len(), numeric.len());
        for (a, n) in analytic.iter().zip(&numeric) {
            assert_eq!(a.shape(), n.shape());
            assert_relative_eq!(a, n, epsilon = tolerance);
        }
    }
}
