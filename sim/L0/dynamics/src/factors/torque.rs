//! Torque projection.

use nalgebra::DVector;
use sim_factor_graph::lie::SpatialVector;
use sim_factor_graph::{Factor, Jacobians, Key, NoiseModel, Values};

use super::dense;

/// Residual `Sᵀ F - τ`: the joint torque is the child-side wrench projected
/// on the screw axis.
///
/// Keys: child-side wrench, torque.
#[derive(Debug, Clone)]
pub struct TorqueFactor {
    keys: [Key; 2],
    noise: NoiseModel,
    axis: SpatialVector,
}

impl TorqueFactor {
    /// Create a torque factor for the child-side screw axis.
    #[must_use]
    pub fn new(wrench: Key, torque: Key, noise: NoiseModel, axis: SpatialVector) -> Self {
        Self {
            keys: [wrench, torque],
            noise,
            axis,
        }
    }
}

impl Factor for TorqueFactor {
    fn keys(&self) -> &[Key] {
        &self.keys
    }

    fn dim(&self) -> usize {
        1
    }

    fn noise_model(&self) -> &NoiseModel {
        &self.noise
    }

    fn name(&self) -> &'static str {
        "torque"
    }

    fn unwhitened_error(
        &self,
        values: &Values,
        jacobians: Option<&mut Jacobians>,
    ) -> sim_factor_graph::Result<DVector<f64>> {
        let wrench = values.vector6(self.keys[0])?;
        let torque = values.scalar(self.keys[1])?;
        if let Some(h) = jacobians {
            *h = vec![dense(&self.axis.transpose()), nalgebra::DMatrix::from_element(1, 1, -1.0)];
        }
        Ok(DVector::from_element(1, self.axis.dot(&wrench) - torque))
    }
}
