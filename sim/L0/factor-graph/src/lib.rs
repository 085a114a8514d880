//! Nonlinear factor graphs over Lie-group variables.
//!
//! This crate is the optimization engine underneath the dynamics layer:
//!
//! - [`Key`] / [`Symbol`] - 64-bit variable identifiers
//! - [`Values`] - Heterogeneous variable assignments (scalars, vectors, poses, manifolds)
//! - [`NoiseModel`] - Whitening, including hard-constraint models
//! - [`Factor`] / [`FactorGraph`] - Residual terms and their collection
//! - [`LevenbergMarquardtOptimizer`] / [`PenaltyMethodOptimizer`] - Nonlinear least squares
//! - [`ConstraintManifold`] / [`ManifoldOptimizer`] - Optimization with hard
//!   constraints removed by reduction to manifolds
//!
//! # Conventions
//!
//! Pose tangents are ordered `[ω; v]`. Retraction is `x · Exp(ξ)` and local
//! coordinates are `Log(x⁻¹ · y)`.
//!
//! # Example
//!
//! ```
//! use sim_factor_graph::{
//!     FactorGraph, LevenbergMarquardtOptimizer, NoiseModel, PriorFactor, Symbol, Values,
//! };
//!
//! let x0 = Symbol::new(b'x', 0).key();
//! let mut graph = FactorGraph::new();
//! graph.add(PriorFactor::new(x0, 2.0, NoiseModel::unit(1)));
//!
//! let mut values = Values::new();
//! values.insert(x0, 0.0).unwrap();
//!
//! let result = LevenbergMarquardtOptimizer::default()
//!     .optimize(&graph, &values)
//!     .unwrap();
//! assert!((result.values.scalar(x0).unwrap() - 2.0).abs() < 1e-6);
//! ```

#![doc(html_root_url = "https://docs.rs/sim-factor-graph/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::missing_errors_doc,        // Error docs added where non-obvious
    clippy::many_single_char_names,    // Math notation
    clippy::similar_names,             // p/q, a/b style variable pairs
)]

mod error;
mod factor;
mod graph;
mod key;
pub mod factors;
pub mod lie;
pub mod manifold;
pub mod noise;
pub mod optimizer;
mod values;

pub use error::GraphError;
pub use factor::{numerical_jacobians, Factor, Jacobians, LinearizedFactor, NUMERICAL_DERIVATIVE_STEP};
pub use factors::{between, BetweenFactor, CustomFactor, ErrorFunction, PriorFactor, ReweightedFactor};
pub use graph::{DenseSystem, FactorGraph};
pub use key::{Key, KeySet, Symbol, INDEX_BITS, TAG_BITS};
pub use manifold::{
    BasisType, ConnectedComponent, ConstraintManifold, ManifoldOptimizer, ManifoldOptimizerParams,
    ManifoldParams, RetractType, SubstituteFactor,
};
pub use noise::NoiseModel;
pub use optimizer::{
    LevenbergMarquardtOptimizer, LevenbergMarquardtParams, OptimizationResult,
    PenaltyMethodOptimizer, PenaltyMethodParams,
};
pub use values::{Value, Values, VectorValues};

/// Result type for factor-graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;
