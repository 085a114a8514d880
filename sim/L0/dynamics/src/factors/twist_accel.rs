//! Twist-acceleration propagation across a joint.

use nalgebra::{DVector, Matrix6};
use sim_factor_graph::lie::ad;
use sim_factor_graph::{Factor, Jacobians, Key, NoiseModel, Values};

use super::{dense, residual};
use crate::joint::ScrewMotion;

/// Residual `Ad(cTp(q)) A_p + ad(V_c) S q̇ + S q̈ - A_c`.
///
/// Keys: child twist, parent acceleration, child acceleration, joint
/// coordinate, velocity and acceleration.
#[derive(Debug, Clone)]
pub struct TwistAccelFactor {
    keys: [Key; 6],
    noise: NoiseModel,
    motion: ScrewMotion,
}

impl TwistAccelFactor {
    /// Create a twist-acceleration factor from the child-side screw motion.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        child_twist: Key,
        parent_accel: Key,
        child_accel: Key,
        q: Key,
        qdot: Key,
        qddot: Key,
        noise: NoiseModel,
        motion: ScrewMotion,
    ) -> Self {
        Self {
            keys: [child_twist, parent_accel, child_accel, q, qdot, qddot],
            noise,
            motion,
        }
    }
}

impl Factor for TwistAccelFactor {
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
        "twist_accel"
    }

    fn unwhitened_error(
        &self,
        values: &Values,
        jacobians: Option<&mut Jacobians>,
    ) -> sim_factor_graph::Result<DVector<f64>> {
        let v_c = values.vector6(self.keys[0])?;
        let a_p = values.vector6(self.keys[1])?;
        let a_c = values.vector6(self.keys[2])?;
        let q = values.scalar(self.keys[3])?;
        let qdot = values.scalar(self.keys[4])?;
        let qddot = values.scalar(self.keys[5])?;

        let s = self.motion.axis;
        let e = self.motion.accel(q, qdot, qddot, &v_c, &a_p) - a_c;
        if let Some(h) = jacobians {
            *h = vec![
                dense(&(ad(&s) * -qdot)),
                dense(&self.motion.adjoint(q)),
                dense(&-Matrix6::<f64>::identity()),
                dense(&self.motion.adjoint_derivative(q, &a_p)),
                dense(&(ad(&v_c) * s)),
                dense(&s),
            ];
        }
        Ok(residual(&e))
    }
}
