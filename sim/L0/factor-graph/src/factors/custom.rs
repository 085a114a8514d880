//! Closure-defined factors.

use std::fmt;
use std::sync::Arc;

use nalgebra::DVector;

use crate::factor::{numerical_jacobians, Factor, Jacobians};
use crate::key::Key;
use crate::noise::NoiseModel;
use crate::values::Values;
use crate::Result;

/// Residual function of a [`CustomFactor`].
pub type ErrorFunction = Arc<dyn Fn(&Values) -> Result<DVector<f64>> + Send + Sync>;

/// A factor whose residual is an arbitrary closure, differentiated numerically.
#[derive(Clone)]
pub struct CustomFactor {
    keys: Vec<Key>,
    dim: usize,
    noise: NoiseModel,
    function: ErrorFunction,
}

impl CustomFactor {
    /// Create a factor over `keys`; the noise model fixes the residual dimension.
    pub fn new<F>(keys: Vec<Key>, noise: NoiseModel, function: F) -> Self
    where
        F: Fn(&Values) -> Result<DVector<f64>> + Send + Sync + 'static,
    {
        Self {
            keys,
            dim: noise.dim(),
            noise,
            function: Arc::new(function),
        }
    }
}

impl fmt::Debug for CustomFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomFactor")
            .field("keys", &self.keys)
            .field("dim", &self.dim)
            .field("noise", &self.noise)
            .finish_non_exhaustive()
    }
}

impl Factor for CustomFactor {
    fn keys(&self) -> &[Key] {
        &self.keys
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn noise_model(&self) -> &NoiseModel {
        &self.noise
    }

    fn name(&self) -> &'static str {
        "custom"
    }

    fn unwhitened_error(
        &self,
        values: &Values,
        jacobians: Option<&mut Jacobians>,
    ) -> Result<DVector<f64>> {
        if let Some(h) = jacobians {
            *h = numerical_jacobians(|v| (self.function)(v), &self.keys, values)?;
        }
        (self.function)(values)
    }
}
