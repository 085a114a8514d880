//! Pose consistency across a joint.

use nalgebra::DVector;
use sim_factor_graph::lie::pose_local;
use sim_factor_graph::{numerical_jacobians, Factor, Jacobians, Key, NoiseModel, Values};

use crate::joint::ScrewMotion;

/// Residual `local(wTc, wTp · pTc(q))` closing the pose loop through the
/// joint coordinate.
///
/// Keys: parent pose, child pose, joint coordinate.
#[derive(Debug, Clone)]
pub struct PoseFactor {
    keys: [Key; 3],
    noise: NoiseModel,
    motion: ScrewMotion,
}

impl PoseFactor {
    /// Create a pose factor from the child-side screw motion.
    #[must_use]
    pub fn new(
        parent_pose: Key,
        child_pose: Key,
        q: Key,
        noise: NoiseModel,
        motion: ScrewMotion,
    ) -> Self {
        Self {
            keys: [parent_pose, child_pose, q],
            noise,
            motion,
        }
    }

    fn evaluate(&self, values: &Values) -> sim_factor_graph::Result<DVector<f64>> {
        let w_t_p = values.pose(self.keys[0])?;
        let w_t_c = values.pose(self.keys[1])?;
        let q = values.scalar(self.keys[2])?;
        let predicted = w_t_p * self.motion.transform(q).inverse();
        Ok(super::residual(&pose_local(&w_t_c, &predicted)))
    }
}

impl Factor for PoseFactor {
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
        "pose"
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
