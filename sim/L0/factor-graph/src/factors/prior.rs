//! Prior factor: pins one variable to a known value.

use nalgebra::{DMatrix, DVector};

use crate::factor::{numerical_jacobians, Factor, Jacobians};
use crate::key::Key;
use crate::noise::NoiseModel;
use crate::values::{Value, Values};
use crate::Result;

/// Residual `local(prior, x)`.
#[derive(Debug, Clone)]
pub struct PriorFactor {
    keys: [Key; 1],
    prior: Value,
    noise: NoiseModel,
}

impl PriorFactor {
    /// Create a prior on `key`.
    #[must_use]
    pub fn new(key: Key, prior: impl Into<Value>, noise: NoiseModel) -> Self {
        Self {
            keys: [key],
            prior: prior.into(),
            noise,
        }
    }

    /// The prior value.
    #[must_use]
    pub fn prior(&self) -> &Value {
        &self.prior
    }

    fn evaluate(&self, values: &Values) -> Result<DVector<f64>> {
        self.prior.local_coordinates(values.at(self.keys[0])?)
    }
}

impl Factor for PriorFactor {
    fn keys(&self) -> &[Key] {
        &self.keys
    }

    fn dim(&self) -> usize {
        self.prior.dim()
    }

    fn noise_model(&self) -> &NoiseModel {
        &self.noise
    }

    fn name(&self) -> &'static str {
        "prior"
    }

    fn unwhitened_error(
        &self,
        values: &Values,
        jacobians: Option<&mut Jacobians>,
    ) -> Result<DVector<f64>> {
        let e = self.evaluate(values)?;
        if let Some(h) = jacobians {
            *h = match self.prior {
                Value::Scalar(_) | Value::Vector(_) | Value::Vector6(_) => {
                    vec![DMatrix::identity(e.len(), e.len())]
                }
                Value::Pose(_) | Value::Manifold(_) => {
                    numerical_jacobians(|v| self.evaluate(v), &self.keys, values)?
                }
            };
        }
        Ok(e)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::key::Symbol;
    use approx::assert_relative_eq;
    use nalgebra::{Isometry3, Vector3, Vector6};

    #[test]
    fn test_scalar_prior() {
        let key = Symbol::new(b'q', 0).key();
        let factor = PriorFactor::new(key, 1.0, NoiseModel::unit(1));
        let mut values = Values::new();
        values.insert(key, 3.0).unwrap();
        let mut h = Jacobians::new();
        let e = factor.unwhitened_error(&values, Some(&mut h)).unwrap();
        assert_relative_eq!(e[0], 2.0);
        assert_relative_eq!(h[0][(0, 0)], 1.0);
        assert_relative_eq!(factor.error(&values).unwrap(), 2.0);
    }

    #[test]
    fn test_pose_prior_jacobian_is_identity_at_prior() {
        let key = Symbol::new(b'p', 0).key();
        let pose = Isometry3::translation(1.0, 2.0, 3.0);
        let factor = PriorFactor::new(key, pose, NoiseModel::constrained(6));
        let mut values = Values::new();
        values.insert(key, pose).unwrap();
        let mut h = Jacobians::new();
        let e = factor.unwhitened_error(&values, Some(&mut h)).unwrap();
        assert_relative_eq!(e.norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(h[0].clone(), DMatrix::identity(6, 6), epsilon = 1e-8);
        assert!(factor.is_constrained());

        let moved = Isometry3::new(Vector3::new(1.0, 2.0, 3.5), Vector3::zeros());
        values.update(key, moved).unwrap();
        let e = factor.unwhitened_error(&values, None).unwrap();
        assert_relative_eq!(
            Vector6::from_column_slice(e.as_slice()),
            Vector6::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.5),
            epsilon = 1e-12
        );
    }
}
