//! Optimization over constraint manifolds.
//!
//! [`ManifoldOptimizer`] removes the hard constraints of a problem by
//! reduction:
//!
//! 1. Split the graph into hard constraints and soft costs
//! 2. Group the constrained variables into connected components
//! 3. Turn each component into a [`ConstraintManifold`] variable
//! 4. Rewrite every soft cost with [`SubstituteFactor`]
//! 5. Run Levenberg-Marquardt on the reduced, unconstrained problem
//! 6. Expand the manifold values back into base variables
//!
//! Components whose manifold has dimension zero are fully determined by
//! their constraints; they are frozen as constants of the reduced problem.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::factor::Factor;
use crate::graph::FactorGraph;
use crate::key::{Key, KeySet, Symbol};
use crate::manifold::{ConnectedComponent, ConstraintManifold, ManifoldParams, SubstituteFactor};
use crate::optimizer::{LevenbergMarquardtOptimizer, LevenbergMarquardtParams, OptimizationResult};
use crate::values::{Value, Values};
use crate::Result;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for [`ManifoldOptimizer`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ManifoldOptimizerParams {
    /// Manifold construction and retraction settings.
    pub manifold: ManifoldParams,
    /// Outer solver settings.
    pub lm_params: LevenbergMarquardtParams,
    /// Variables to use as basis keys (for [`crate::manifold::BasisType::SpecifyVariables`]).
    pub basis_keys: KeySet,
    /// Tag character of the generated manifold keys.
    pub manifold_symbol: u8,
}

impl Default for ManifoldOptimizerParams {
    fn default() -> Self {
        Self {
            manifold: ManifoldParams::default(),
            lm_params: LevenbergMarquardtParams::default(),
            basis_keys: KeySet::new(),
            manifold_symbol: b'M',
        }
    }
}

impl ManifoldOptimizerParams {
    /// Use the given manifold settings.
    #[must_use]
    pub fn with_manifold(mut self, manifold: ManifoldParams) -> Self {
        self.manifold = manifold;
        self
    }

    /// Use the given basis keys.
    #[must_use]
    pub fn with_basis_keys(mut self, basis_keys: impl IntoIterator<Item = Key>) -> Self {
        self.basis_keys = basis_keys.into_iter().collect();
        self
    }

    /// Use the given outer solver settings.
    #[must_use]
    pub fn with_lm_params(mut self, lm_params: LevenbergMarquardtParams) -> Self {
        self.lm_params = lm_params;
        self
    }
}

/// The reduced problem built from a constrained graph.
#[derive(Debug, Clone)]
pub struct ManifoldProblem {
    /// Soft costs rewritten over manifold and free variables.
    pub graph: FactorGraph,
    /// Initial manifold and free variables.
    pub values: Values,
    /// Fully constrained manifolds, frozen.
    pub fc_manifolds: Values,
    /// Base key → manifold key.
    pub replacement_map: BTreeMap<Key, Key>,
}

/// Levenberg-Marquardt over constraint manifolds.
#[derive(Debug, Clone, Default)]
pub struct ManifoldOptimizer {
    params: ManifoldOptimizerParams,
}

impl ManifoldOptimizer {
    /// Create an optimizer.
    #[must_use]
    pub fn new(params: ManifoldOptimizerParams) -> Self {
        Self { params }
    }

    /// Build the reduced problem.
    pub fn construct_problem(&self, graph: &FactorGraph, values: &Values) -> Result<ManifoldProblem> {
        let (constraints, costs) = graph.split_constrained();
        let components = ConnectedComponent::identify(&constraints);
        let params = Arc::new(self.params.manifold);

        let mut replacement_map = BTreeMap::new();
        let mut manifolds = Values::new();
        let mut fc_manifolds = Values::new();
        for (index, component) in components.into_iter().enumerate() {
            let manifold_key = Symbol::new(self.params.manifold_symbol, index as u64).key();
            let basis_keys: Vec<Key> = component
                .keys
                .intersection(&self.params.basis_keys)
                .copied()
                .collect();
            for key in &component.keys {
                replacement_map.insert(*key, manifold_key);
            }
            let manifold = ConstraintManifold::new(
                Arc::new(component),
                values,
                Arc::clone(&params),
                true,
                true,
                basis_keys,
            )?;
            debug!(
                %manifold_key,
                dim = manifold.dim(),
                base_dim = manifold.base_dim(),
                "constructed constraint manifold"
            );
            if manifold.dim() == 0 {
                fc_manifolds.insert(manifold_key, manifold)?;
            } else {
                manifolds.insert(manifold_key, manifold)?;
            }
        }

        let mut reduced = FactorGraph::new();
        for factor in costs.iter() {
            if factor.keys().iter().any(|k| replacement_map.contains_key(k)) {
                let substitute =
                    SubstituteFactor::new(Arc::clone(factor), replacement_map.clone(), &fc_manifolds)?;
                // Costs over frozen variables only are constants.
                if !substitute.keys().is_empty() {
                    reduced.add(substitute);
                }
            } else {
                reduced.push(Arc::clone(factor));
            }
        }

        let mut reduced_values = manifolds;
        for (key, value) in values.iter() {
            if !replacement_map.contains_key(&key) {
                reduced_values.insert(key, value.clone())?;
            }
        }

        Ok(ManifoldProblem {
            graph: reduced,
            values: reduced_values,
            fc_manifolds,
            replacement_map,
        })
    }

    /// Expand a reduced solution back into base variables.
    pub fn base_values(problem: &ManifoldProblem, reduced: &Values) -> Result<Values> {
        let mut out = Values::new();
        for (key, value) in reduced.iter() {
            match value {
                Value::Manifold(manifold) => out.extend(manifold.values())?,
                other => out.insert(key, other.clone())?,
            }
        }
        for (_, value) in problem.fc_manifolds.iter() {
            if let Value::Manifold(manifold) = value {
                out.extend(manifold.values())?;
            }
        }
        Ok(out)
    }

    /// Minimize the soft costs of `graph` subject to its hard constraints.
    ///
    /// The reported error is the full graph cost at the recovered base values.
    pub fn optimize(&self, graph: &FactorGraph, values: &Values) -> Result<OptimizationResult> {
        let problem = self.construct_problem(graph, values)?;
        let result = LevenbergMarquardtOptimizer::new(self.params.lm_params)
            .optimize(&problem.graph, &problem.values)?;
        let base = Self::base_values(&problem, &result.values)?;
        Ok(OptimizationResult {
            error: graph.error(&base)?,
            values: base,
            iterations: result.iterations,
            converged: result.converged,
        })
    }
}
