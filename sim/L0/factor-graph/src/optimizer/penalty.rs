//! Quadratic penalty method for equality-constrained least squares.
//!
//! Minimizes `cost(x)` subject to `c(x) = 0` by solving a sequence of
//! unconstrained problems `cost(x) + μ ‖c(x)‖²` with geometrically growing
//! `μ`, each warm-started from the previous solution.

use tracing::debug;

use crate::graph::FactorGraph;
use crate::optimizer::{LevenbergMarquardtOptimizer, LevenbergMarquardtParams, OptimizationResult};
use crate::values::Values;
use crate::Result;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for [`PenaltyMethodOptimizer`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PenaltyMethodParams {
    /// Parameters of each inner solve.
    pub lm_params: LevenbergMarquardtParams,
    /// Penalty weight of the first inner solve.
    pub initial_mu: f64,
    /// Multiplier applied to `μ` after each inner solve.
    pub mu_increase_rate: f64,
    /// Number of inner solves.
    pub num_iterations: usize,
}

impl Default for PenaltyMethodParams {
    fn default() -> Self {
        Self {
            lm_params: LevenbergMarquardtParams::default(),
            initial_mu: 1.0,
            mu_increase_rate: 10.0,
            num_iterations: 8,
        }
    }
}

impl PenaltyMethodParams {
    /// Use the given inner solver parameters.
    #[must_use]
    pub fn with_lm_params(mut self, lm_params: LevenbergMarquardtParams) -> Self {
        self.lm_params = lm_params;
        self
    }

    /// Set the number of inner solves.
    #[must_use]
    pub fn with_num_iterations(mut self, num_iterations: usize) -> Self {
        self.num_iterations = num_iterations;
        self
    }
}

/// Penalty-method optimizer.
#[derive(Debug, Clone, Default)]
pub struct PenaltyMethodOptimizer {
    params: PenaltyMethodParams,
}

impl PenaltyMethodOptimizer {
    /// Create an optimizer.
    #[must_use]
    pub fn new(params: PenaltyMethodParams) -> Self {
        Self { params }
    }

    /// Minimize `graph` subject to the residuals of `constraints` vanishing.
    ///
    /// The reported error is the cost of `graph` alone at the final point.
    pub fn optimize(
        &self,
        graph: &FactorGraph,
        constraints: &FactorGraph,
        initial: &Values,
    ) -> Result<OptimizationResult> {
        let lm = LevenbergMarquardtOptimizer::new(self.params.lm_params);
        let mut values = initial.clone();
        let mut mu = self.params.initial_mu;
        let mut iterations = 0;
        let mut converged = true;

        for _ in 0..self.params.num_iterations {
            let mut merit = graph.clone();
            merit.extend(&constraints.with_penalty(mu));
            let result = lm.optimize(&merit, &values)?;
            iterations += result.iterations;
            converged = result.converged;
            values = result.values;
            debug!(mu, merit_error = result.error, "penalty method inner solve");
            mu *= self.params.mu_increase_rate;
        }

        Ok(OptimizationResult {
            error: graph.error(&values)?,
            values,
            iterations,
            converged,
        })
    }
}
