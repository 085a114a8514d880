//! Action and reaction across a joint.

use nalgebra::{DVector, Matrix6};
use sim_factor_graph::{Factor, Jacobians, Key, NoiseModel, Values};

use super::{dense, residual};
use crate::joint::ScrewMotion;

/// Residual `F_p + Ad(cTp(q))ᵀ F_c`: the wrench the joint exerts on the
/// parent balances the one it exerts on the child.
///
/// Keys: parent-side wrench, child-side wrench, joint coordinate.
#[derive(Debug, Clone)]
pub struct WrenchEquivalenceFactor {
    keys: [Key; 3],
    noise: NoiseModel,
    motion: ScrewMotion,
}

impl WrenchEquivalenceFactor {
    /// Create a wrench-equivalence factor from the child-side screw motion.
    #[must_use]
    pub fn new(
        parent_wrench: Key,
        child_wrench: Key,
        q: Key,
        noise: NoiseModel,
        motion: ScrewMotion,
    ) -> Self {
        Self {
            keys: [parent_wrench, child_wrench, q],
            noise,
            motion,
        }
    }
}

impl Factor for WrenchEquivalenceFactor {
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
        "wrench_equivalence"
    }

    fn unwhitened_error(
        &self,
        values: &Values,
        jacobians: Option<&mut Jacobians>,
    ) -> sim_factor_graph::Result<DVector<f64>> {
        let f_p = values.vector6(self.keys[0])?;
        let f_c = values.vector6(self.keys[1])?;
        let q = values.scalar(self.keys[2])?;

        let ad_t = self.motion.adjoint(q).transpose();
        if let Some(h) = jacobians {
            *h = vec![
                dense(&Matrix6::<f64>::identity()),
                dense(&ad_t),
                dense(&self.motion.coadjoint_derivative(q, &f_c)),
            ];
        }
        Ok(residual(&(f_p + ad_t * f_c)))
    }
}
