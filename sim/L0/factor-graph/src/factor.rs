//! The factor trait.
//!
//! A factor is a residual function `e(x_k1, ..., x_kn)` over a fixed list of
//! keys together with a [`NoiseModel`]. Factors whose noise model is
//! constrained are hard equalities; everything else is a soft cost.

use nalgebra::{DMatrix, DVector};

use crate::error::GraphError;
use crate::key::Key;
use crate::noise::NoiseModel;
use crate::values::{Value, Values};
use crate::Result;

/// One Jacobian block per factor key, each `dim × dim(key)`.
pub type Jacobians = Vec<DMatrix<f64>>;

/// Step used for central-difference Jacobians.
pub const NUMERICAL_DERIVATIVE_STEP: f64 = 1e-5;

/// A residual over a list of variables.
pub trait Factor: Send + Sync {
    /// Keys of the variables this factor depends on, in Jacobian order.
    fn keys(&self) -> &[Key];

    /// Residual dimension.
    fn dim(&self) -> usize;

    /// Residual weighting.
    fn noise_model(&self) -> &NoiseModel;

    /// Raw residual; fills one Jacobian block per key when requested.
    fn unwhitened_error(&self, values: &Values, jacobians: Option<&mut Jacobians>)
        -> Result<DVector<f64>>;

    /// Short description used in diagnostics.
    fn name(&self) -> &'static str {
        "factor"
    }

    /// Check whether this factor is a hard equality constraint.
    fn is_constrained(&self) -> bool {
        self.noise_model().is_constrained()
    }

    /// Residual after whitening.
    fn whitened_error(&self, values: &Values) -> Result<DVector<f64>> {
        Ok(self.noise_model().whiten(&self.unwhitened_error(values, None)?))
    }

    /// Cost `½ ‖whitened residual‖²`.
    fn error(&self, values: &Values) -> Result<f64> {
        Ok(0.5 * self.whitened_error(values)?.norm_squared())
    }

    /// Whitened residual and Jacobians at `values`.
    fn linearize(&self, values: &Values) -> Result<LinearizedFactor> {
        let mut jacobians = Jacobians::with_capacity(self.keys().len());
        let e = self.unwhitened_error(values, Some(&mut jacobians))?;
        if jacobians.len() != self.keys().len() {
            return Err(GraphError::dimension(
                "jacobian count",
                self.keys().len(),
                jacobians.len(),
            ));
        }
        let model = self.noise_model();
        Ok(LinearizedFactor {
            keys: self.keys().to_vec(),
            jacobians: jacobians.iter().map(|h| model.whiten_jacobian(h)).collect(),
            error: model.whiten(&e),
        })
    }
}

/// Whitened first-order model `A δ + e` of a factor.
#[derive(Debug, Clone)]
pub struct LinearizedFactor {
    /// Keys in block order.
    pub keys: Vec<Key>,
    /// Whitened Jacobian blocks.
    pub jacobians: Jacobians,
    /// Whitened residual.
    pub error: DVector<f64>,
}

/// Central-difference Jacobians of `f` with respect to each of `keys`.
///
/// Each variable is perturbed through [`Value::retract`], so the Jacobian is
/// taken in the same tangent convention the optimizer uses.
pub fn numerical_jacobians<F>(f: F, keys: &[Key], values: &Values) -> Result<Jacobians>
where
    F: Fn(&Values) -> Result<DVector<f64>>,
{
    let mut local = values.select(keys)?;
    let mut jacobians = Jacobians::with_capacity(keys.len());
    for &key in keys {
        let original: Value = local.at(key)?.clone();
        let n = original.dim();
        let mut block: Option<DMatrix<f64>> = None;
        for i in 0..n {
            let mut step = DVector::zeros(n);
            step[i] = NUMERICAL_DERIVATIVE_STEP;
            local.insert_or_assign(key, original.retract(&step)?);
            let plus = f(&local)?;
            local.insert_or_assign(key, original.retract(&(-&step))?);
            let minus = f(&local)?;
            let column = (plus - minus) / (2.0 * NUMERICAL_DERIVATIVE_STEP);
            block
                .get_or_insert_with(|| DMatrix::zeros(column.len(), n))
                .set_column(i, &column);
        }
        local.insert_or_assign(key, original);
        let block = match block {
            Some(b) => b,
            None => DMatrix::zeros(f(&local)?.len(), 0),
        };
        jacobians.push(block);
    }
    Ok(jacobians)
}
