//! Soft bounds on joint quantities.

use nalgebra::{DMatrix, DVector};
use sim_factor_graph::{Factor, Jacobians, Key, NoiseModel, Values};

/// Hinge residual keeping a scalar inside `[lower + threshold, upper - threshold]`.
///
/// Zero inside the band, growing linearly outside it. Used for joint
/// coordinates, velocities, accelerations and torques alike.
#[derive(Debug, Clone)]
pub struct JointLimitFactor {
    keys: [Key; 1],
    noise: NoiseModel,
    low: f64,
    high: f64,
}

impl JointLimitFactor {
    /// Create a limit factor on `key`.
    #[must_use]
    pub fn new(key: Key, noise: NoiseModel, lower: f64, upper: f64, threshold: f64) -> Self {
        Self {
            keys: [key],
            noise,
            low: lower + threshold,
            high: upper - threshold,
        }
    }
}

impl Factor for JointLimitFactor {
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
        "joint_limit"
    }

    fn unwhitened_error(
        &self,
        values: &Values,
        jacobians: Option<&mut Jacobians>,
    ) -> sim_factor_graph::Result<DVector<f64>> {
        let x = values.scalar(self.keys[0])?;
        let (e, slope) = if x < self.low {
            (self.low - x, -1.0)
        } else if x > self.high {
            (x - self.high, 1.0)
        } else {
            (0.0, 0.0)
        };
        if let Some(h) = jacobians {
            *h = vec![DMatrix::from_element(1, 1, slope)];
        }
        Ok(DVector::from_element(1, e))
    }
}
