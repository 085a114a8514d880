//! Twist propagation across a joint.

use nalgebra::{DVector, Matrix6};
use sim_factor_graph::{Factor, Jacobians, Key, NoiseModel, Values};

use super::{dense, residual};
use crate::joint::ScrewMotion;

/// Residual `Ad(cTp(q)) V_p + S q̇ - V_c`.
///
/// Keys: parent twist, child twist, joint coordinate, joint velocity.
#[derive(Debug, Clone)]
pub struct TwistFactor {
    keys: [Key; 4],
    noise: NoiseModel,
    motion: ScrewMotion,
}

impl TwistFactor {
    /// Create a twist factor from the child-side screw motion.
    #[must_use]
    pub fn new(
        parent_twist: Key,
        child_twist: Key,
        q: Key,
        qdot: Key,
        noise: NoiseModel,
        motion: ScrewMotion,
    ) -> Self {
        Self {
            keys: [parent_twist, child_twist, q, qdot],
            noise,
            motion,
        }
    }
}

impl Factor for TwistFactor {
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
        "twist"
    }

    fn unwhitened_error(
        &self,
        values: &Values,
        jacobians: Option<&mut Jacobians>,
    ) -> sim_factor_graph::Result<DVector<f64>> {
        let v_p = values.vector6(self.keys[0])?;
        let v_c = values.vector6(self.keys[1])?;
        let q = values.scalar(self.keys[2])?;
        let qdot = values.scalar(self.keys[3])?;

        let e = self.motion.twist(q, qdot, &v_p) - v_c;
        if let Some(h) = jacobians {
            *h = vec![
                dense(&self.motion.adjoint(q)),
                dense(&-Matrix6::<f64>::identity()),
                dense(&self.motion.adjoint_derivative(q, &v_p)),
                dense(&self.motion.axis),
            ];
        }
        Ok(residual(&e))
    }
}
