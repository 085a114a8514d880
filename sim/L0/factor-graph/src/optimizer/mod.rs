//! Nonlinear least-squares optimizers.

mod levenberg_marquardt;
mod penalty;

pub use levenberg_marquardt::{LevenbergMarquardtOptimizer, LevenbergMarquardtParams};
pub use penalty::{PenaltyMethodOptimizer, PenaltyMethodParams};

use crate::values::Values;

/// Outcome of an optimization run.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Final assignment.
    pub values: Values,
    /// Final cost.
    pub error: f64,
    /// Number of accepted steps.
    pub iterations: usize,
    /// Whether a stopping tolerance was met.
    pub converged: bool,
}
