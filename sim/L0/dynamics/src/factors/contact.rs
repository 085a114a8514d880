//! Contact factors.
//!
//! A contact keeps a frame on a link (the foot) stationary in the world over
//! an interval of steps. Rather than an exact constraint, the stationarity
//! is encoded as a preintegrated measurement whose covariance grows with the
//! elapsed time, so these factors are always soft.

use nalgebra::{DMatrix, DVector, Isometry3, Matrix3, Matrix6, UnitQuaternion, Vector3};
use sim_factor_graph::lie::{pose_local, skew};
use sim_factor_graph::{numerical_jacobians, Factor, Jacobians, Key, NoiseModel, Values};

use super::{dense, residual};

// ============================================================================
// Point-foot model
// ============================================================================

/// Accumulated 3×3 covariance of a point contact's translation drift.
#[derive(Debug, Clone, PartialEq)]
pub struct PreintegratedPointContactMeasurements {
    covariance: Matrix3<f64>,
    velocity_covariance: Matrix3<f64>,
}

impl PreintegratedPointContactMeasurements {
    /// Start with zero covariance and the given discrete velocity noise.
    #[must_use]
    pub fn new(velocity_covariance: Matrix3<f64>) -> Self {
        Self {
            covariance: Matrix3::zeros(),
            velocity_covariance,
        }
    }

    /// First interval: noise is rotated from the contact into the base frame.
    pub fn initialize(&mut self, w_t_base: &Isometry3<f64>, w_t_contact: &Isometry3<f64>, dt: f64) {
        let b = (w_t_base.rotation.inverse() * w_t_contact.rotation)
            .to_rotation_matrix()
            .into_inner()
            * dt;
        self.accumulate(&b);
    }

    /// Later intervals, with `delta_r` the base rotation since the first step.
    pub fn integrate(&mut self, w_t_contact: &Isometry3<f64>, delta_r: &UnitQuaternion<f64>, dt: f64) {
        let b = (delta_r * w_t_contact.rotation).to_rotation_matrix().into_inner() * dt;
        self.accumulate(&b);
    }

    fn accumulate(&mut self, b: &Matrix3<f64>) {
        self.covariance += b * self.velocity_covariance * b.transpose();
    }

    /// Accumulated covariance.
    #[must_use]
    pub fn covariance(&self) -> &Matrix3<f64> {
        &self.covariance
    }

    /// Gaussian noise model of the accumulated covariance.
    pub fn noise_model(&self) -> sim_factor_graph::Result<NoiseModel> {
        NoiseModel::from_covariance(&dense(&self.covariance))
    }
}

/// Residual `R_biᵀ (t_cj - t_ci)`: contact translation drift between steps
/// `i` and `j`, expressed in the base frame at `i`.
///
/// Keys: base pose at `i`, contact pose at `i`, base pose at `j`, contact
/// pose at `j`.
#[derive(Debug, Clone)]
pub struct PreintegratedPointContactFactor {
    keys: [Key; 4],
    noise: NoiseModel,
}

impl PreintegratedPointContactFactor {
    /// Create from preintegrated measurements.
    pub fn new(
        base_i: Key,
        contact_i: Key,
        base_j: Key,
        contact_j: Key,
        measurements: &PreintegratedPointContactMeasurements,
    ) -> sim_factor_graph::Result<Self> {
        Ok(Self {
            keys: [base_i, contact_i, base_j, contact_j],
            noise: measurements.noise_model()?,
        })
    }
}

impl Factor for PreintegratedPointContactFactor {
    fn keys(&self) -> &[Key] {
        &self.keys
    }

    fn dim(&self) -> usize {
        3
    }

    fn noise_model(&self) -> &NoiseModel {
        &self.noise
    }

    fn name(&self) -> &'static str {
        "point_contact"
    }

    fn unwhitened_error(
        &self,
        values: &Values,
        jacobians: Option<&mut Jacobians>,
    ) -> sim_factor_graph::Result<DVector<f64>> {
        let w_t_bi = values.pose(self.keys[0])?;
        let w_t_ci = values.pose(self.keys[1])?;
        let w_t_cj = values.pose(self.keys[3])?;

        let r_bi_inv = w_t_bi.rotation.inverse();
        let e: Vector3<f64> =
            r_bi_inv * (w_t_cj.translation.vector - w_t_ci.translation.vector);

        if let Some(h) = jacobians {
            let block = |angular: Matrix3<f64>, linear: Matrix3<f64>| {
                let mut m = DMatrix::zeros(3, 6);
                m.view_mut((0, 0), (3, 3)).copy_from(&angular);
                m.view_mut((0, 3), (3, 3)).copy_from(&linear);
                m
            };
            let rot = |q: UnitQuaternion<f64>| q.to_rotation_matrix().into_inner();
            *h = vec![
                block(skew(&e), Matrix3::zeros()),
                block(Matrix3::zeros(), -rot(r_bi_inv * w_t_ci.rotation)),
                DMatrix::zeros(3, 6),
                block(Matrix3::zeros(), rot(r_bi_inv * w_t_cj.rotation)),
            ];
        }
        Ok(residual(&e))
    }
}

// ============================================================================
// Rigid-foot model
// ============================================================================

/// Accumulated 6×6 covariance of a rigid contact's pose drift.
#[derive(Debug, Clone, PartialEq)]
pub struct PreintegratedRigidContactMeasurements {
    covariance: Matrix6<f64>,
    angular_covariance: Matrix3<f64>,
    linear_covariance: Matrix3<f64>,
    elapsed: f64,
}

impl PreintegratedRigidContactMeasurements {
    /// Start with zero covariance and the given angular and linear velocity noise.
    #[must_use]
    pub fn new(angular_covariance: Matrix3<f64>, linear_covariance: Matrix3<f64>) -> Self {
        Self {
            covariance: Matrix6::zeros(),
            angular_covariance,
            linear_covariance,
            elapsed: 0.0,
        }
    }

    /// Add one interval of duration `dt`; the covariance is `blockdiag(Σw, Σv)·ΔT`.
    pub fn integrate(&mut self, dt: f64) {
        self.elapsed += dt;
        let mut cov = Matrix6::zeros();
        cov.fixed_view_mut::<3, 3>(0, 0).copy_from(&self.angular_covariance);
        cov.fixed_view_mut::<3, 3>(3, 3).copy_from(&self.linear_covariance);
        self.covariance = cov * self.elapsed;
    }

    /// Total integrated time.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Accumulated covariance.
    #[must_use]
    pub fn covariance(&self) -> &Matrix6<f64> {
        &self.covariance
    }

    /// Gaussian noise model of the accumulated covariance.
    pub fn noise_model(&self) -> sim_factor_graph::Result<NoiseModel> {
        NoiseModel::from_covariance(&dense(&self.covariance))
    }
}

/// Residual `local(I, wTci⁻¹ wTcj)`: the contact frame does not move between
/// steps `i` and `j`.
#[derive(Debug, Clone)]
pub struct PreintegratedRigidContactFactor {
    keys: [Key; 2],
    noise: NoiseModel,
}

impl PreintegratedRigidContactFactor {
    /// Create from preintegrated measurements.
    pub fn new(
        contact_i: Key,
        contact_j: Key,
        measurements: &PreintegratedRigidContactMeasurements,
    ) -> sim_factor_graph::Result<Self> {
        Ok(Self {
            keys: [contact_i, contact_j],
            noise: measurements.noise_model()?,
        })
    }

    fn evaluate(&self, values: &Values) -> sim_factor_graph::Result<DVector<f64>> {
        let w_t_ci = values.pose(self.keys[0])?;
        let w_t_cj = values.pose(self.keys[1])?;
        Ok(residual(&pose_local(&w_t_ci, &w_t_cj)))
    }
}

impl Factor for PreintegratedRigidContactFactor {
    fn keys(&self) -> &[Key] {
        &self.keys
    }

    fn dim(&self) -> usize {
        6
    }

    fn noise_model(&self) -> &NoiseModel {
        &self.noise
    }

    fn name(&self) -> &'static str {
        "rigid_contact"
    }

    fn unwhitened_error(
        &self,
        values: &Values,
        jacobians: Option<&mut Jacobians>,
    ) -> sim_factor_graph::Result<DVector<f64>> {
        if let Some(h) = jacobians {
            *h = numerical_jacobians(|v| self.evaluate(v), &self.keys, values)?;
        }
        self.evaluate(values)
    }
}

// ============================================================================
// Contact frame kinematics
// ============================================================================

/// Residual `local(wTc, wTcom · comTc)` tying a contact pose variable to the
/// link it sits on.
#[derive(Debug, Clone)]
pub struct ContactPoseFactor {
    keys: [Key; 2],
    noise: NoiseModel,
    com_t_contact: Isometry3<f64>,
}

impl ContactPoseFactor {
    /// Create for a contact frame at `com_t_contact` in the link COM frame.
    #[must_use]
    pub fn new(link_pose: Key, contact_pose: Key, noise: NoiseModel, com_t_contact: Isometry3<f64>) -> Self {
        Self {
            keys: [link_pose, contact_pose],
            noise,
            com_t_contact,
        }
    }

    fn evaluate(&self, values: &Values) -> sim_factor_graph::Result<DVector<f64>> {
        let predicted = values.pose(self.keys[0])? * self.com_t_contact;
        let w_t_c = values.pose(self.keys[1])?;
        Ok(residual(&pose_local(&w_t_c, &predicted)))
    }
}

impl Factor for ContactPoseFactor {
    fn keys(&self) -> &[Key] {
        &self.keys
    }

    fn dim(&self) -> usize {
        6
    }

    fn noise_model(&self) -> &NoiseModel {
        &self.noise
    }

    fn name(&self) -> &'static str {
        "contact_pose"
    }

    fn unwhitened_error(
        &self,
        values: &Values,
        jacobians: Option<&mut Jacobians>,
    ) -> sim_factor_graph::Result<DVector<f64>> {
        if let Some(h) = jacobians {
            *h = numerical_jacobians(|v| self.evaluate(v), &self.keys, values)?;
        }
        self.evaluate(values)
    }
}
