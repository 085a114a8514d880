//! Noise models per constraint family.
//!
//! Every factor the assembly emits takes its noise model from here. The
//! default makes every physical law a hard constraint; soft variants are
//! useful when the graph is solved by plain least squares.

use sim_factor_graph::NoiseModel;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Noise model of each factor family.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CostModels {
    /// Prior pinning a fixed link's pose.
    pub fixed_pose: NoiseModel,
    /// Prior pinning a fixed link's twist.
    pub fixed_twist: NoiseModel,
    /// Prior pinning a fixed link's twist acceleration.
    pub fixed_accel: NoiseModel,
    /// Joint pose consistency.
    pub pose: NoiseModel,
    /// Twist propagation.
    pub twist: NoiseModel,
    /// Twist-acceleration propagation.
    pub twist_accel: NoiseModel,
    /// Link wrench balance.
    pub wrench: NoiseModel,
    /// Joint action and reaction.
    pub wrench_equivalence: NoiseModel,
    /// Torque projection and effort factors.
    pub torque: NoiseModel,
    /// Planar wrench components.
    pub planar: NoiseModel,
    /// Collocation of joint coordinates.
    pub q_collocation: NoiseModel,
    /// Collocation of joint velocities.
    pub v_collocation: NoiseModel,
    /// Prior on joint coordinates.
    pub prior_q: NoiseModel,
    /// Prior on joint velocities.
    pub prior_v: NoiseModel,
    /// Prior on joint accelerations.
    pub prior_a: NoiseModel,
    /// Prior on joint torques.
    pub prior_torque: NoiseModel,
    /// Joint limit penalties.
    pub joint_limit: NoiseModel,
    /// Contact frame kinematics.
    pub contact_pose: NoiseModel,
}

impl Default for CostModels {
    fn default() -> Self {
        Self::constrained()
    }
}

impl CostModels {
    /// Every family a hard constraint, joint limits a stiff penalty.
    #[must_use]
    pub fn constrained() -> Self {
        let c6 = NoiseModel::constrained(6);
        let c1 = NoiseModel::constrained(1);
        Self {
            fixed_pose: c6.clone(),
            fixed_twist: c6.clone(),
            fixed_accel: c6.clone(),
            pose: c6.clone(),
            twist: c6.clone(),
            twist_accel: c6.clone(),
            wrench: c6.clone(),
            wrench_equivalence: c6.clone(),
            torque: c1.clone(),
            planar: NoiseModel::constrained(3),
            q_collocation: c1.clone(),
            v_collocation: c1.clone(),
            prior_q: c1.clone(),
            prior_v: c1.clone(),
            prior_a: c1.clone(),
            prior_torque: c1,
            joint_limit: NoiseModel::isotropic(1, 1e-3),
            contact_pose: c6,
        }
    }

    /// Every family an isotropic Gaussian with standard deviation `sigma`.
    #[must_use]
    pub fn isotropic(sigma: f64) -> Self {
        let s6 = NoiseModel::isotropic(6, sigma);
        let s1 = NoiseModel::isotropic(1, sigma);
        Self {
            fixed_pose: s6.clone(),
            fixed_twist: s6.clone(),
            fixed_accel: s6.clone(),
            pose: s6.clone(),
            twist: s6.clone(),
            twist_accel: s6.clone(),
            wrench: s6.clone(),
            wrench_equivalence: s6.clone(),
            torque: s1.clone(),
            planar: NoiseModel::isotropic(3, sigma),
            q_collocation: s1.clone(),
            v_collocation: s1.clone(),
            prior_q: s1.clone(),
            prior_v: s1.clone(),
            prior_a: s1.clone(),
            prior_torque: s1,
            joint_limit: NoiseModel::isotropic(1, 1e-3),
            contact_pose: s6,
        }
    }

    /// Set the joint limit penalty.
    #[must_use]
    pub fn with_joint_limit(mut self, sigma: f64) -> Self {
        self.joint_limit = NoiseModel::isotropic(1, sigma);
        self
    }

    /// Set the noise of all joint priors.
    #[must_use]
    pub fn with_priors(mut self, noise: NoiseModel) -> Self {
        self.prior_q = noise.clone();
        self.prior_v = noise.clone();
        self.prior_a = noise.clone();
        self.prior_torque = noise;
        self
    }

    /// Set the noise of both collocation families.
    #[must_use]
    pub fn with_collocation(mut self, noise: NoiseModel) -> Self {
        self.q_collocation = noise.clone();
        self.v_collocation = noise;
        self
    }
}
