//! Constraint-manifold configuration.

use crate::optimizer::{LevenbergMarquardtParams, PenaltyMethodParams};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the tangent basis of a manifold is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BasisType {
    /// Null space of the linearized constraints.
    #[default]
    Kernel,
    /// Gaussian elimination onto automatically chosen variables. Not
    /// implemented: selecting it leaves the basis empty.
    Elimination,
    /// Sensitivities of all variables to a caller-chosen set of basis keys.
    SpecifyVariables,
}

/// How feasibility is restored after a tangent step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RetractType {
    /// Minimize constraint violation from the candidate.
    #[default]
    Unconstrained,
    /// Minimize distance to the candidate subject to the constraints.
    Projection,
    /// Minimize constraint violation while pinning the basis keys.
    PartialProjection,
}

/// Configuration shared by every manifold of an optimization problem.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ManifoldParams {
    /// Basis strategy.
    pub basis_type: BasisType,
    /// Retraction strategy.
    pub retract_type: RetractType,
    /// Inner solver for unconstrained and partial-projection retraction.
    pub lm_params: LevenbergMarquardtParams,
    /// Inner solver for projection retraction.
    pub penalty_params: PenaltyMethodParams,
    /// Weight pinning the basis keys during partial projection.
    pub partial_projection_weight: f64,
    /// Merit cost above which a retraction is reported as inexact.
    pub retraction_tolerance: f64,
    /// Relative singular-value threshold for the kernel basis.
    pub kernel_tolerance: f64,
}

impl Default for ManifoldParams {
    fn default() -> Self {
        Self {
            basis_type: BasisType::default(),
            retract_type: RetractType::default(),
            lm_params: LevenbergMarquardtParams::precise(),
            penalty_params: PenaltyMethodParams::default(),
            partial_projection_weight: 1e6,
            retraction_tolerance: 1e-4,
            kernel_tolerance: 1e-8,
        }
    }
}

impl ManifoldParams {
    /// Kernel basis with the given retraction.
    #[must_use]
    pub fn kernel(retract_type: RetractType) -> Self {
        Self {
            retract_type,
            ..Self::default()
        }
    }

    /// Specified-variable basis with partial projection.
    #[must_use]
    pub fn specify_variables() -> Self {
        Self {
            basis_type: BasisType::SpecifyVariables,
            retract_type: RetractType::PartialProjection,
            ..Self::default()
        }
    }

    /// Set the basis strategy.
    #[must_use]
    pub fn with_basis_type(mut self, basis_type: BasisType) -> Self {
        self.basis_type = basis_type;
        self
    }

    /// Set the retraction strategy.
    #[must_use]
    pub fn with_retract_type(mut self, retract_type: RetractType) -> Self {
        self.retract_type = retract_type;
        self
    }

    /// Set the inner solver parameters.
    #[must_use]
    pub fn with_lm_params(mut self, lm_params: LevenbergMarquardtParams) -> Self {
        self.lm_params = lm_params;
        self
    }
}
