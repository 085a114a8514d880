//! Between factor: relative measurement between two variables.

use nalgebra::DVector;

use crate::error::GraphError;
use crate::factor::{numerical_jacobians, Factor, Jacobians};
use crate::key::Key;
use crate::noise::NoiseModel;
use crate::values::{Value, Values};
use crate::Result;

/// Residual `local(measured, x1⁻¹ x2)`; for vector spaces `x1⁻¹ x2 = x2 - x1`.
#[derive(Debug, Clone)]
pub struct BetweenFactor {
    keys: [Key; 2],
    measured: Value,
    noise: NoiseModel,
}

impl BetweenFactor {
    /// Create a between factor from `key1` to `key2`.
    #[must_use]
    pub fn new(key1: Key, key2: Key, measured: impl Into<Value>, noise: NoiseModel) -> Self {
        Self {
            keys: [key1, key2],
            measured: measured.into(),
            noise,
        }
    }

    /// The measured relative value.
    #[must_use]
    pub fn measured(&self) -> &Value {
        &self.measured
    }

    fn evaluate(&self, values: &Values) -> Result<DVector<f64>> {
        let relative = between(values.at(self.keys[0])?, values.at(self.keys[1])?)?;
        self.measured.local_coordinates(&relative)
    }
}

/// Relative value `a⁻¹ b`.
pub fn between(a: &Value, b: &Value) -> Result<Value> {
    match (a, b) {
        (Value::Scalar(x), Value::Scalar(y)) => Ok(Value::Scalar(y - x)),
        (Value::Vector(x), Value::Vector(y)) if x.len() == y.len() => Ok(Value::Vector(y - x)),
        (Value::Vector6(x), Value::Vector6(y)) => Ok(Value::Vector6(y - x)),
        (Value::Pose(x), Value::Pose(y)) => Ok(Value::Pose(x.inverse() * y)),
        _ => Err(GraphError::numerical(format!(
            "no relative value between {} and {}",
            a.kind(),
            b.kind()
        ))),
    }
}

impl Factor for BetweenFactor {
    fn keys(&self) -> &[Key] {
        &self.keys
    }

    fn dim(&self) -> usize {
        self.measured.dim()
    }

    fn noise_model(&self) -> &NoiseModel {
        &self.noise
    }

    fn name(&self) -> &'static str {
        "between"
    }

    fn unwhitened_error(
        &self,
        values: &Values,
        jacobians: Option<&mut Jacobians>,
    ) -> Result<DVector<f64>> {
        if let Some(h) = jacobians {
            *h = numerical_jacobians(|v| self.evaluate(v), &self.keys, values)?;
        }
        self.evaluate(values)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::key::Symbol;
    use approx::assert_relative_eq;
    use nalgebra::{Isometry3, Vector3};

    #[test]
    fn test_pose_between() {
        let (k1, k2) = (Symbol::new(b'x', 1).key(), Symbol::new(b'x', 2).key());
        let a = Isometry3::new(Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 0.5));
        let rel = Isometry3::new(Vector3::new(0.0, 2.0, 0.0), Vector3::new(0.1, 0.0, 0.0));
        let factor = BetweenFactor::new(k1, k2, rel, NoiseModel::unit(6));

        let mut values = Values::new();
        values.insert(k1, a).unwrap();
        values.insert(k2, a * rel).unwrap();
        let mut h = Jacobians::new();
        let e = factor.unwhitened_error(&values, Some(&mut h)).unwrap();
        assert_relative_eq!(e.norm(), 0.0, epsilon = 1e-10);
        assert_eq!(h.len(), 2);
        assert_eq!(h[0].shape(), (6, 6));
    }

    #[test]
    fn test_scalar_between() {
        let (k1, k2) = (Symbol::new(b'x', 1).key(), Symbol::new(b'x', 2).key());
        let factor = BetweenFactor::new(k1, k2, 1.0, NoiseModel::unit(1));
        let mut values = Values::new();
        values.insert(k1, 2.0).unwrap();
        values.insert(k2, 4.0).unwrap();
        assert_relative_eq!(factor.unwhitened_error(&values, None).unwrap()[0], 1.0);
        assert!(between(&Value::Scalar(1.0), &Value::Pose(Isometry3::identity())).is_err());
    }
}
