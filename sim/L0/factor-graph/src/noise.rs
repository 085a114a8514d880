//! Noise models.
//!
//! A noise model turns a factor's raw residual into a whitened residual whose
//! squared norm is the factor cost. [`NoiseModel::Constrained`] marks a hard
//! equality; it is whitened with a large weight `mu` so that unconstrained
//! solvers still drive it to zero, and it identifies the factor as a
//! constraint to the manifold machinery.

use nalgebra::{DMatrix, DVector};

use crate::error::GraphError;
use crate::Result;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default weight of a hard constraint.
pub const DEFAULT_CONSTRAINT_MU: f64 = 1e3;

/// Residual weighting.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NoiseModel {
    /// Hard equality constraint.
    Constrained {
        /// Residual dimension.
        dim: usize,
        /// Penalty weight used when the constraint is treated as a cost.
        mu: f64,
    },
    /// Same standard deviation on every component.
    Isotropic {
        /// Residual dimension.
        dim: usize,
        /// Standard deviation.
        sigma: f64,
    },
    /// Independent standard deviations.
    Diagonal {
        /// Per-component standard deviations.
        sigmas: DVector<f64>,
    },
    /// Full covariance, stored as the square-root information `R` with `RᵀR = Σ⁻¹`.
    Gaussian {
        /// Square-root information matrix.
        sqrt_information: DMatrix<f64>,
    },
    /// Identity weighting.
    Unit {
        /// Residual dimension.
        dim: usize,
    },
}

impl NoiseModel {
    /// Hard constraint with the default weight.
    #[must_use]
    pub fn constrained(dim: usize) -> Self {
        Self::Constrained {
            dim,
            mu: DEFAULT_CONSTRAINT_MU,
        }
    }

    /// Isotropic model.
    #[must_use]
    pub fn isotropic(dim: usize, sigma: f64) -> Self {
        Self::Isotropic { dim, sigma }
    }

    /// Diagonal model from standard deviations.
    #[must_use]
    pub fn diagonal(sigmas: DVector<f64>) -> Self {
        Self::Diagonal { sigmas }
    }

    /// Unit model.
    #[must_use]
    pub fn unit(dim: usize) -> Self {
        Self::Unit { dim }
    }

    /// Gaussian model from a covariance matrix.
    pub fn from_covariance(covariance: &DMatrix<f64>) -> Result<Self> {
        if !covariance.is_square() {
            return Err(GraphError::dimension(
                "covariance",
                covariance.nrows(),
                covariance.ncols(),
            ));
        }
        let chol = covariance
            .clone()
            .cholesky()
            .ok_or_else(|| GraphError::NotPositiveDefinite {
                reason: format!("{}x{} covariance", covariance.nrows(), covariance.ncols()),
            })?;
        let n = covariance.nrows();
        let l_inv = chol
            .l()
            .solve_lower_triangular(&DMatrix::identity(n, n))
            .ok_or_else(|| GraphError::numerical("singular covariance factor"))?;
        Ok(Self::Gaussian {
            sqrt_information: l_inv,
        })
    }

    /// Residual dimension.
    #[must_use]
    pub fn dim(&self) -> usize {
        match self {
            Self::Constrained { dim, .. } | Self::Isotropic { dim, .. } | Self::Unit { dim } => *dim,
            Self::Diagonal { sigmas } => sigmas.len(),
            Self::Gaussian { sqrt_information } => sqrt_information.nrows(),
        }
    }

    /// Check whether this model marks a hard constraint.
    #[must_use]
    pub fn is_constrained(&self) -> bool {
        matches!(self, Self::Constrained { .. })
    }

    /// Whiten a residual.
    #[must_use]
    pub fn whiten(&self, e: &DVector<f64>) -> DVector<f64> {
        match self {
            Self::Constrained { mu, .. } => e * mu.sqrt(),
            Self::Isotropic { sigma, .. } => e / *sigma,
            Self::Diagonal { sigmas } => e.component_div(sigmas),
            Self::Gaussian { sqrt_information } => sqrt_information * e,
            Self::Unit { .. } => e.clone(),
        }
    }

    /// Whiten a Jacobian block (row scaling consistent with [`Self::whiten`]).
    #[must_use]
    pub fn whiten_jacobian(&self, h: &DMatrix<f64>) -> DMatrix<f64> {
        match self {
            Self::Constrained { mu, .. } => h * mu.sqrt(),
            Self::Isotropic { sigma, .. } => h / *sigma,
            Self::Diagonal { sigmas } => {
                let mut out = h.clone();
                for (i, mut row) in out.row_iter_mut().enumerate() {
                    row /= sigmas[i];
                }
                out
            }
            Self::Gaussian { sqrt_information } => sqrt_information * h,
            Self::Unit { .. } => h.clone(),
        }
    }

    /// Squared Mahalanobis norm of a residual.
    #[must_use]
    pub fn squared_mahalanobis(&self, e: &DVector<f64>) -> f64 {
        self.whiten(e).norm_squared()
    }
}
