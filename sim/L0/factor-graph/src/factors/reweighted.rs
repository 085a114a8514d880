//! Same residual, different noise model.

use std::sync::Arc;

use nalgebra::DVector;

use crate::error::GraphError;
use crate::factor::{Factor, Jacobians};
use crate::key::Key;
use crate::noise::NoiseModel;
use crate::values::Values;
use crate::Result;

/// Wraps a factor and replaces its noise model.
///
/// Used to turn hard constraints into penalty or merit costs without
/// touching their residuals.
#[derive(Clone)]
pub struct ReweightedFactor {
    inner: Arc<dyn Factor>,
    noise: NoiseModel,
}

impl ReweightedFactor {
    /// Wrap `inner` with `noise`; the dimensions must agree.
    pub fn new(inner: Arc<dyn Factor>, noise: NoiseModel) -> Result<Self> {
        if noise.dim() != inner.dim() {
            return Err(GraphError::dimension("reweighted factor", inner.dim(), noise.dim()));
        }
        Ok(Self { inner, noise })
    }

    /// Wrap `inner` with a unit noise model.
    #[must_use]
    pub fn unit(inner: Arc<dyn Factor>) -> Self {
        let noise = NoiseModel::unit(inner.dim());
        Self { inner, noise }
    }

    /// Wrap `inner` with an isotropic model of standard deviation `1/√mu`.
    #[must_use]
    pub fn penalty(inner: Arc<dyn Factor>, mu: f64) -> Self {
        let noise = NoiseModel::isotropic(inner.dim(), 1.0 / mu.sqrt());
        Self { inner, noise }
    }

    /// The wrapped factor.
    #[must_use]
    pub fn inner(&self) -> &Arc<dyn Factor> {
        &self.inner
    }
}

impl Factor for ReweightedFactor {
    fn keys(&self) -> &[Key] {
        self.inner.keys()
    }

    fn dim(&self) -> usize {
        self.inner.dim()
    }

    fn noise_model(&self) -> &NoiseModel {
        &self.noise
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn unwhitened_error(
        &self,
        values: &Values,
        jacobians: Option<&mut Jacobians>,
    ) -> Result<DVector<f64>> {
        self.inner.unwhitened_error(values, jacobians)
    }
}
