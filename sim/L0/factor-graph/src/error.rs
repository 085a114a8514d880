//! Error types for factor-graph evaluation and optimization.

use thiserror::Error;

use crate::key::Key;

/// Errors that can occur while evaluating or optimizing a factor graph.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    /// A factor or accessor referenced a variable that has no value.
    #[error("variable {0} not found")]
    MissingKey(Key),

    /// A value was inserted twice under the same key.
    #[error("variable {0} already exists")]
    DuplicateKey(Key),

    /// A value had a different kind than requested.
    #[error("variable {key} has type {found}, expected {expected}")]
    TypeMismatch {
        /// Offending key.
        key: Key,
        /// Requested kind.
        expected: &'static str,
        /// Stored kind.
        found: &'static str,
    },

    /// Vector or matrix sizes disagree.
    #[error("dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Where the mismatch was found.
        context: &'static str,
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// A covariance matrix could not be factored.
    #[error("covariance is not positive definite: {reason}")]
    NotPositiveDefinite {
        /// Description of the failure.
        reason: String,
    },

    /// A linear-algebra operation failed.
    #[error("numerical failure: {reason}")]
    Numerical {
        /// Description of the failure.
        reason: String,
    },

    /// A retraction did not land back on the constraints.
    #[error("retraction left merit error {violation:e}, tolerance {tolerance:e}")]
    RetractionFailed {
        /// Merit error of the constraints after retraction.
        violation: f64,
        /// Largest acceptable merit error.
        tolerance: f64,
    },

    /// A constraint manifold was used before its tangent basis was built.
    #[error("constraint manifold has no tangent basis")]
    MissingBasis,
}

impl GraphError {
    /// Create a dimension mismatch error.
    #[must_use]
    pub fn dimension(context: &'static str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            context,
            expected,
            actual,
        }
    }

    /// Create a numerical failure error.
    #[must_use]
    pub fn numerical(reason: impl Into<String>) -> Self {
        Self::Numerical {
            reason: reason.into(),
        }
    }

    /// Check if this error refers to a missing variable.
    #[must_use]
    pub fn is_missing_key(&self) -> bool {
        matches!(self, Self::MissingKey(_))
    }

    /// Check if this error rejects a trial step rather than the whole solve.
    #[must_use]
    pub fn is_rejected_step(&self) -> bool {
        matches!(self, Self::RetractionFailed { .. })
    }
}
