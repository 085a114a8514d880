//! Dense Levenberg-Marquardt.
//!
//! # Algorithm
//!
//! Each outer iteration linearizes the graph over every key it references and
//! solves the damped normal equations
//!
//! ```text
//! (JᵀJ + λ I) δ = -Jᵀ e
//! ```
//!
//! by Cholesky factorization. A step is accepted only if it lowers the total
//! cost and its retraction succeeds; otherwise `λ` grows by `lambda_factor`
//! and the step is retried. The
//! iteration stops when the cost, its absolute decrease or its relative
//! decrease falls below the configured tolerances, or when `λ` exceeds its
//! upper bound without finding a descent step.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, trace};

use crate::graph::FactorGraph;
use crate::key::Key;
use crate::optimizer::OptimizationResult;
use crate::values::Values;
use crate::Result;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for [`LevenbergMarquardtOptimizer`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LevenbergMarquardtParams {
    /// Maximum number of accepted steps.
    pub max_iterations: usize,
    /// Stop when the relative cost decrease falls below this.
    pub relative_error_tol: f64,
    /// Stop when the absolute cost decrease falls below this.
    pub absolute_error_tol: f64,
    /// Stop when the cost falls below this.
    pub error_tol: f64,
    /// Initial damping.
    pub lambda_initial: f64,
    /// Damping multiplier on rejection (divisor on acceptance).
    pub lambda_factor: f64,
    /// Smallest damping.
    pub lambda_lower_bound: f64,
    /// Give up once damping exceeds this.
    pub lambda_upper_bound: f64,
}

impl Default for LevenbergMarquardtParams {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            relative_error_tol: 1e-5,
            absolute_error_tol: 1e-5,
            error_tol: 0.0,
            lambda_initial: 1e-5,
            lambda_factor: 10.0,
            lambda_lower_bound: 1e-10,
            lambda_upper_bound: 1e5,
        }
    }
}

impl LevenbergMarquardtParams {
    /// Tight tolerances for solves that must reach a feasible point.
    #[must_use]
    pub fn precise() -> Self {
        Self {
            relative_error_tol: 1e-12,
            absolute_error_tol: 1e-20,
            error_tol: 1e-24,
            ..Self::default()
        }
    }

    /// Set the iteration limit.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the relative and absolute decrease tolerances.
    #[must_use]
    pub fn with_tolerances(mut self, relative: f64, absolute: f64) -> Self {
        self.relative_error_tol = relative;
        self.absolute_error_tol = absolute;
        self
    }

    /// Set the initial damping.
    #[must_use]
    pub fn with_lambda_initial(mut self, lambda: f64) -> Self {
        self.lambda_initial = lambda;
        self
    }
}

/// Levenberg-Marquardt nonlinear least-squares optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardtOptimizer {
    params: LevenbergMarquardtParams,
}

impl LevenbergMarquardtOptimizer {
    /// Create an optimizer.
    #[must_use]
    pub fn new(params: LevenbergMarquardtParams) -> Self {
        Self { params }
    }

    /// The configuration.
    #[must_use]
    pub fn params(&self) -> &LevenbergMarquardtParams {
        &self.params
    }

    /// Minimize the graph cost starting from `initial`.
    ///
    /// Only keys referenced by the graph are updated; all other entries of
    /// `initial` are returned untouched.
    pub fn optimize(&self, graph: &FactorGraph, initial: &Values) -> Result<OptimizationResult> {
        let p = &self.params;
        let ordering: Vec<Key> = graph.keys().into_iter().collect();
        let mut values = initial.clone();
        let mut error = graph.error(&values)?;
        let mut lambda = p.lambda_initial;
        let mut iterations = 0;
        let mut converged = error <= p.error_tol || ordering.is_empty();

        while !converged && iterations < p.max_iterations {
            let system = graph.linearize(&values, &ordering)?;
            let hessian = system.jacobian.tr_mul(&system.jacobian);
            let gradient = system.jacobian.tr_mul(&system.error);

            let mut step = None;
            while lambda <= p.lambda_upper_bound {
                if let Some(delta) = damped_step(&hessian, &gradient, lambda) {
                    match values.retract(&system.split(&delta)) {
                        Ok(candidate) => {
                            let candidate_error = graph.error(&candidate)?;
                            trace!(lambda, candidate_error, "levenberg-marquardt trial step");
                            if candidate_error < error {
                                step = Some((candidate, candidate_error));
                                lambda = (lambda / p.lambda_factor).max(p.lambda_lower_bound);
                                break;
                            }
                        }
                        Err(err) if err.is_rejected_step() => {
                            trace!(lambda, %err, "levenberg-marquardt trial step rejected");
                        }
                        Err(err) => return Err(err),
                    }
                }
                lambda *= p.lambda_factor;
            }

            let Some((candidate, new_error)) = step else {
                // A stationary point whose cost is already negligible is a success.
                converged = error <= p.absolute_error_tol;
                debug!(iterations, error, converged, "levenberg-marquardt: no descent step");
                break;
            };

            iterations += 1;
            let decrease = error - new_error;
            converged = new_error <= p.error_tol
                || decrease <= p.absolute_error_tol
                || decrease <= p.relative_error_tol * error;
            values = candidate;
            error = new_error;
            debug!(iterations, error, lambda, "levenberg-marquardt iteration");
        }

        Ok(OptimizationResult {
            values,
            error,
            iterations,
            converged,
        })
    }
}

fn damped_step(hessian: &DMatrix<f64>, gradient: &DVector<f64>, lambda: f64) -> Option<DVector<f64>> {
    let mut damped = hessian.clone();
    for i in 0..damped.nrows() {
        damped[(i, i)] += lambda;
    }
    damped.cholesky().map(|chol| -chol.solve(gradient))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::factors::{BetweenFactor, CustomFactor, PriorFactor};
    use crate::key::Symbol;
    use crate::noise::NoiseModel;
    use approx::assert_relative_eq;
    use nalgebra::{Isometry3, Vector3};

    fn x(i: u64) -> Key {
        Symbol::new(b'x', i).key()
    }

    #[test]
    fn test_linear_chain() {
        let mut graph = FactorGraph::new();
        graph.add(PriorFactor::new(x(0), 1.0, NoiseModel::unit(1)));
        graph.add(BetweenFactor::new(x(0), x(1), 2.0, NoiseModel::unit(1)));
        let mut values = Values::new();
        values.insert(x(0), 0.0).unwrap();
        values.insert(x(1), 0.0).unwrap();
        values.insert(x(9), 7.0).unwrap();

        let result = LevenbergMarquardtOptimizer::default()
            .optimize(&graph, &values)
            .unwrap();
        assert!(result.converged);
        assert_relative_eq!(result.values.scalar(x(0)).unwrap(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(result.values.scalar(x(1)).unwrap(), 3.0, epsilon = 1e-6);
        // untouched
        assert_eq!(result.values.scalar(x(9)).unwrap(), 7.0);
    }

    #[test]
    fn test_nonlinear_circle() {
        let (a, b) = (x(0), x(1));
        let mut graph = FactorGraph::new();
        graph.add(CustomFactor::new(vec![a, b], NoiseModel::constrained(1), move |v| {
            let (p, q) = (v.scalar(a)?, v.scalar(b)?);
            Ok(DVector::from_element(1, p * p + q * q - 4.0))
        }));
        graph.add(PriorFactor::new(a, 0.0, NoiseModel::isotropic(1, 10.0)));
        let mut values = Values::new();
        values.insert(a, 0.5).unwrap();
        values.insert(b, 1.0).unwrap();

        let params = LevenbergMarquardtParams::precise();
        let result = LevenbergMarquardtOptimizer::new(params)
            .optimize(&graph, &values)
            .unwrap();
        let (p, q) = (
            result.values.scalar(a).unwrap(),
            result.values.scalar(b).unwrap(),
        );
        assert_relative_eq!(p * p + q * q, 4.0, epsilon = 1e-4);
        assert!(p.abs() < 1e-2);
    }

    #[test]
    fn test_pose_alignment() {
        let target = Isometry3::new(Vector3::new(1.0, -2.0, 0.5), Vector3::new(0.3, 0.2, -0.4));
        let mut graph = FactorGraph::new();
        graph.add(PriorFactor::new(x(0), target, NoiseModel::unit(6)));
        let mut values = Values::new();
        values.insert(x(0), Isometry3::identity()).unwrap();

        let result = LevenbergMarquardtOptimizer::default()
            .optimize(&graph, &values)
            .unwrap();
        let pose = result.values.pose(x(0)).unwrap();
        assert_relative_eq!(pose.to_homogeneous(), target.to_homogeneous(), epsilon = 1e-4);
        assert!(result.error < 1e-10);
    }

    #[test]
    fn test_empty_graph() {
        let mut values = Values::new();
        values.insert(x(0), 1.0).unwrap();
        let result = LevenbergMarquardtOptimizer::default()
            .optimize(&FactorGraph::new(), &values)
            .unwrap();
        assert!(result.converged);
        assert_eq!(result.iterations, 0);
    }
}
