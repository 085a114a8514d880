//! Time integration between consecutive steps.

use nalgebra::{DMatrix, DVector};
use sim_factor_graph::{Factor, Jacobians, Key, NoiseModel, Values};
use sim_types::CollocationScheme;

/// Step duration of a collocation factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepDuration {
    /// Known duration.
    Fixed(f64),
    /// Duration is a variable of the graph.
    Variable(Key),
}

/// Residual relating a scalar at two steps through its derivative.
///
/// - Euler: `x₁ - x₀ - dt ẋ₀`
/// - Trapezoidal: `x₁ - x₀ - dt/2 (ẋ₀ + ẋ₁)`
///
/// Keys: `x₀, x₁, ẋ₀`, then `ẋ₁` for the trapezoidal rule, then the duration
/// key when it is variable.
#[derive(Debug, Clone)]
pub struct CollocationFactor {
    keys: Vec<Key>,
    noise: NoiseModel,
    scheme: CollocationScheme,
    dt: StepDuration,
}

impl CollocationFactor {
    /// Create an integration factor. `xdot1` is ignored by the Euler rule.
    #[must_use]
    pub fn new(
        x0: Key,
        x1: Key,
        xdot0: Key,
        xdot1: Key,
        noise: NoiseModel,
        scheme: CollocationScheme,
        dt: StepDuration,
    ) -> Self {
        let mut keys = vec![x0, x1, xdot0];
        if scheme == CollocationScheme::Trapezoidal {
            keys.push(xdot1);
        }
        if let StepDuration::Variable(key) = dt {
            keys.push(key);
        }
        Self {
            keys,
            noise,
            scheme,
            dt,
        }
    }

    /// Integration rule.
    #[must_use]
    pub fn scheme(&self) -> CollocationScheme {
        self.scheme
    }
}

impl Factor for CollocationFactor {
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
        "collocation"
    }

    fn unwhitened_error(
        &self,
        values: &Values,
        jacobians: Option<&mut Jacobians>,
    ) -> sim_factor_graph::Result<DVector<f64>> {
        let x0 = values.scalar(self.keys[0])?;
        let x1 = values.scalar(self.keys[1])?;
        let xdot0 = values.scalar(self.keys[2])?;
        let dt = match self.dt {
            StepDuration::Fixed(dt) => dt,
            StepDuration::Variable(key) => values.scalar(key)?,
        };

        let (e, slopes) = match self.scheme {
            CollocationScheme::Euler => (x1 - x0 - dt * xdot0, vec![-dt]),
            CollocationScheme::Trapezoidal => {
                let xdot1 = values.scalar(self.keys[3])?;
                (
                    x1 - x0 - 0.5 * dt * (xdot0 + xdot1),
                    vec![-0.5 * dt, -0.5 * dt],
                )
            }
        };

        if let Some(h) = jacobians {
            let scalar = |v: f64| DMatrix::from_element(1, 1, v);
            h.clear();
            h.push(scalar(-1.0));
            h.push(scalar(1.0));
            h.extend(slopes.into_iter().map(scalar));
            if matches!(self.dt, StepDuration::Variable(_)) {
                let rate = match self.scheme {
                    CollocationScheme::Euler => xdot0,
                    CollocationScheme::Trapezoidal => 0.5 * (xdot0 + values.scalar(self.keys[3])?),
                };
                h.push(scalar(-rate));
            }
        }
        Ok(DVector::from_element(1, e))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::factors::testing::assert_jacobians_match;
    use approx::assert_relative_eq;
    use sim_factor_graph::Symbol;

    fn keys() -> [Key; 5] {
        [
            Symbol::new(b'q', 0).key(),
            Symbol::new(b'q', 1).key(),
            Symbol::new(b'v', 0).key(),
            Symbol::new(b'v', 1).key(),
            Symbol::new(b't', 0).key(),
        ]
    }

    fn values() -> Values {
        let k = keys();
        let mut values = Values::new();
        values.insert(k[0], 1.0).unwrap();
        values.insert(k[1], 1.3).unwrap();
        values.insert(k[2], 2.0).unwrap();
        values.insert(k[3], 4.0).unwrap();
        values.insert(k[4], 0.1).unwrap();
        values
    }

    #[test]
    fn test_euler_fixed_step() {
        let k = keys();
        let factor = CollocationFactor::new(
            k[0],
            k[1],
            k[2],
            k[3],
            NoiseModel::constrained(1),
            CollocationScheme::Euler,
            StepDuration::Fixed(0.1),
        );
        assert_eq!(factor.keys().len(), 3);
        let e = factor.unwhitened_error(&values(), None).unwrap();
        assert_relative_eq!(e[0], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_trapezoidal_fixed_step() {
        let k = keys();
        let factor = CollocationFactor::new(
            k[0],
            k[1],
            k[2],
            k[3],
            NoiseModel::constrained(1),
            CollocationScheme::Trapezoidal,
            StepDuration::Fixed(0.1),
        );
        let e = factor.unwhitened_error(&values(), None).unwrap();
        assert_relative_eq!(e[0], 0.0, epsilon = 1e-12);
        assert_jacobians_match(&factor, &values(), 1e-8);
    }

    #[test]
    fn test_variable_step_jacobians() {
        let k = keys();
        for scheme in [CollocationScheme::Euler, CollocationScheme::Trapezoidal] {
            let factor = CollocationFactor::new(
                k[0],
                k[1],
                k[2],
                k[3],
                NoiseModel::constrained(1),
                scheme,
                StepDuration::Variable(k[4]),
            );
            assert_eq!(*factor.keys().last().unwrap(), k[4]);
            assert_jacobians_match(&factor, &values(), 1e-8);
        }
    }
}
