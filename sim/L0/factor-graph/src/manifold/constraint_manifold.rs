//! Constraint manifolds.
//!
//! A [`ConstraintManifold`] is one feasible assignment of a
//! [`ConnectedComponent`]'s variables, plus a tangent basis at that point.
//! It is exposed to the outer optimizer as a single variable of dimension
//! `basis.ncols()`:
//!
//! - `retract(ξ)` moves the base variables along `basis · ξ`, then restores
//!   feasibility with an inner optimization.
//! - `local_coordinates(other)` maps base-variable differences back through
//!   the basis pseudo-inverse.
//! - `recover(key)` reads one base variable and its rows of the basis, so
//!   outer factors can apply the chain rule.
//!
//! A partial-projection retraction that cannot get back within
//! `retraction_tolerance` of the constraints fails with
//! [`GraphError::RetractionFailed`], which the outer optimizer treats as a
//! rejected trial step.
//!
//! Instances are immutable: retraction returns a new manifold, so old
//! iterates remain valid snapshots.

use std::collections::BTreeMap;
use std::sync::Arc;

use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use crate::error::GraphError;
use crate::factors::PriorFactor;
use crate::graph::FactorGraph;
use crate::key::{Key, KeySet};
use crate::manifold::{BasisType, ConnectedComponent, ManifoldParams, RetractType};
use crate::noise::NoiseModel;
use crate::optimizer::{LevenbergMarquardtOptimizer, PenaltyMethodOptimizer};
use crate::values::{Value, Values, VectorValues};
use crate::Result;

/// Feasible point of a connected component with a tangent basis.
#[derive(Debug, Clone)]
pub struct ConstraintManifold {
    cc: Arc<ConnectedComponent>,
    params: Arc<ManifoldParams>,
    values: Values,
    base_dim: usize,
    constraint_dim: usize,
    declared_dim: usize,
    basis_keys: Vec<Key>,
    basis: DMatrix<f64>,
    has_basis: bool,
    var_location: BTreeMap<Key, usize>,
    var_dim: BTreeMap<Key, usize>,
}

impl ConstraintManifold {
    /// Create a manifold point from (possibly infeasible) values.
    ///
    /// With `retract_init` the component's variables are first made feasible;
    /// with `construct_basis` the tangent basis is computed at the resulting
    /// point. `basis_keys` is only used by [`BasisType::SpecifyVariables`]
    /// and [`RetractType::PartialProjection`]; repeated keys count once.
    pub fn new(
        cc: Arc<ConnectedComponent>,
        values: &Values,
        params: Arc<ManifoldParams>,
        retract_init: bool,
        construct_basis: bool,
        mut basis_keys: Vec<Key>,
    ) -> Result<Self> {
        let mut seen = KeySet::new();
        basis_keys.retain(|key| seen.insert(*key));
        let mut manifold = Self {
            cc,
            params,
            values: Values::new(),
            base_dim: 0,
            constraint_dim: 0,
            declared_dim: 0,
            basis_keys,
            basis: DMatrix::zeros(0, 0),
            has_basis: false,
            var_location: BTreeMap::new(),
            var_dim: BTreeMap::new(),
        };
        manifold.compute_values(values, retract_init)?;
        if construct_basis {
            manifold.compute_basis()?;
        }
        Ok(manifold)
    }

    /// New manifold point of the same component, sharing parameters and basis keys.
    pub fn create_with_new_values(&self, values: &Values, retract_init: bool) -> Result<Self> {
        Self::new(
            Arc::clone(&self.cc),
            values,
            Arc::clone(&self.params),
            retract_init,
            true,
            self.basis_keys.clone(),
        )
    }

    fn compute_values(&mut self, values: &Values, retract_init: bool) -> Result<()> {
        let selected = values.select(&self.cc.keys)?;
        self.base_dim = selected.dim();
        self.constraint_dim = self.cc.constraint_dim();
        self.declared_dim = self.base_dim.saturating_sub(self.constraint_dim);
        self.values = if retract_init {
            self.retract_constraints(&selected)?
        } else {
            selected
        };

        // Key-ordered layout until a basis strategy chooses its own.
        let mut position = 0;
        for (key, value) in self.values.iter() {
            self.var_location.insert(key, position);
            self.var_dim.insert(key, value.dim());
            position += value.dim();
        }
        Ok(())
    }

    /// Manifold dimension: the number of basis columns, zero until a basis
    /// has been built.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.basis.ncols()
    }

    /// Base dimension minus constraint dimension. Differs from [`dim`](Self::dim)
    /// when constraints are redundant or no basis has been built.
    #[must_use]
    pub fn declared_dim(&self) -> usize {
        self.declared_dim
    }

    /// Check whether the tangent basis has been built.
    #[must_use]
    pub fn has_basis(&self) -> bool {
        self.has_basis
    }

    /// Sum of the base variables' dimensions.
    #[must_use]
    pub fn base_dim(&self) -> usize {
        self.base_dim
    }

    /// Sum of the constraint residual dimensions.
    #[must_use]
    pub fn constraint_dim(&self) -> usize {
        self.constraint_dim
    }

    /// Current base-variable values.
    #[must_use]
    pub fn values(&self) -> &Values {
        &self.values
    }

    /// Tangent basis, `base_dim × dim` (empty until built).
    #[must_use]
    pub fn basis(&self) -> &DMatrix<f64> {
        &self.basis
    }

    /// Keys designated as basis variables.
    #[must_use]
    pub fn basis_keys(&self) -> &[Key] {
        &self.basis_keys
    }

    /// The underlying connected component.
    #[must_use]
    pub fn component(&self) -> &Arc<ConnectedComponent> {
        &self.cc
    }

    /// The shared configuration.
    #[must_use]
    pub fn params(&self) -> &ManifoldParams {
        &self.params
    }

    /// Row offset and dimension of a base variable within the basis.
    #[must_use]
    pub fn location(&self, key: Key) -> Option<(usize, usize)> {
        Some((*self.var_location.get(&key)?, *self.var_dim.get(&key)?))
    }

    /// Read one base variable; optionally its rows of the basis.
    ///
    /// # Errors
    ///
    /// [`GraphError::MissingBasis`] when rows of the basis are requested
    /// before it has been built.
    pub fn recover(&self, key: Key, jacobian: Option<&mut DMatrix<f64>>) -> Result<&Value> {
        let value = self.values.at(key)?;
        if let Some(h) = jacobian {
            if !self.has_basis {
                return Err(GraphError::MissingBasis);
            }
            let (location, dim) = self.location(key).ok_or(GraphError::MissingKey(key))?;
            *h = self.basis.rows(location, dim).into_owned();
        }
        Ok(value)
    }

    /// Move along `basis · ξ` and restore feasibility.
    ///
    /// # Errors
    ///
    /// [`GraphError::RetractionFailed`] if a partial projection cannot reach
    /// the constraints from the stepped point.
    pub fn retract(&self, xi: &DVector<f64>) -> Result<Self> {
        if !self.has_basis {
            return Err(GraphError::MissingBasis);
        }
        if xi.len() != self.basis.ncols() {
            return Err(GraphError::dimension(
                "manifold retract",
                self.basis.ncols(),
                xi.len(),
            ));
        }
        let x_xi = &self.basis * xi;
        let delta: VectorValues = self
            .var_location
            .iter()
            .map(|(key, &location)| {
                let dim = self.var_dim.get(key).copied().unwrap_or(0);
                (*key, x_xi.rows(location, dim).into_owned())
            })
            .collect();
        let new_values = self.values.retract(&delta)?;
        let retracted = self.create_with_new_values(&new_values, true)?;
        if self.params.retract_type == RetractType::PartialProjection {
            let violation = self.cc.merit_graph.error(&retracted.values)?;
            if violation > self.params.retraction_tolerance {
                return Err(GraphError::RetractionFailed {
                    violation,
                    tolerance: self.params.retraction_tolerance,
                });
            }
        }
        Ok(retracted)
    }

    /// Tangent vector from this point to `other`, via the basis pseudo-inverse.
    pub fn local_coordinates(&self, other: &Self) -> Result<DVector<f64>> {
        if !self.has_basis {
            return Err(GraphError::MissingBasis);
        }
        if self.basis.ncols() == 0 {
            return Ok(DVector::zeros(0));
        }
        let basis_pinv = self
            .basis
            .clone()
            .pseudo_inverse(1e-12)
            .map_err(GraphError::numerical)?;
        let delta = self.values.local_coordinates(&other.values)?;
        let mut xi_base = DVector::zeros(self.basis.nrows());
        for (key, d) in &delta {
            let (location, dim) = self.location(*key).ok_or(GraphError::MissingKey(*key))?;
            xi_base.rows_mut(location, dim).copy_from(d);
        }
        Ok(basis_pinv * xi_base)
    }

    /// Restore feasibility of `values` with the configured retraction.
    pub fn retract_constraints(&self, values: &Values) -> Result<Values> {
        match self.params.retract_type {
            RetractType::Unconstrained => self.retract_unconstrained(values),
            RetractType::Projection => self.retract_projection(values),
            RetractType::PartialProjection => self.retract_partial_projection(values),
        }
    }

    fn retract_unconstrained(&self, values: &Values) -> Result<Values> {
        let init = values.select(&self.cc.keys)?;
        let result = LevenbergMarquardtOptimizer::new(self.params.lm_params)
            .optimize(&self.cc.merit_graph, &init)?;
        Ok(result.values)
    }

    fn retract_projection(&self, values: &Values) -> Result<Values> {
        let init = values.select(&self.cc.keys)?;
        let mut prior_graph = FactorGraph::new();
        for (key, value) in init.iter() {
            prior_graph.add(PriorFactor::new(key, value.clone(), NoiseModel::unit(value.dim())));
        }
        let result = PenaltyMethodOptimizer::new(self.params.penalty_params).optimize(
            &prior_graph,
            &self.cc.constraints,
            &init,
        )?;
        Ok(result.values)
    }

    fn retract_partial_projection(&self, values: &Values) -> Result<Values> {
        let init = values.select(&self.cc.keys)?;
        let mut graph = self.cc.merit_graph.clone();
        let sigma = 1.0 / self.params.partial_projection_weight;
        for &key in &self.basis_keys {
            let value = init.at(key)?;
            graph.add(PriorFactor::new(
                key,
                value.clone(),
                NoiseModel::isotropic(value.dim(), sigma),
            ));
        }
        let result = LevenbergMarquardtOptimizer::new(self.params.lm_params).optimize(&graph, &init)?;
        let violation = self.cc.merit_graph.error(&result.values)?;
        if violation > self.params.retraction_tolerance {
            warn!(
                violation,
                tolerance = self.params.retraction_tolerance,
                "partial projection did not retract onto the constraints"
            );
        }
        Ok(result.values)
    }

    fn compute_basis(&mut self) -> Result<()> {
        match self.params.basis_type {
            BasisType::Kernel => self.compute_basis_kernel()?,
            BasisType::SpecifyVariables => self.compute_basis_specify_variables()?,
            BasisType::Elimination => {
                warn!("elimination basis is not implemented; leaving the basis empty");
                self.basis = DMatrix::zeros(self.base_dim, 0);
            }
        }
        self.has_basis = true;
        Ok(())
    }

    fn set_layout(&mut self, offsets: &BTreeMap<Key, (usize, usize)>) {
        self.var_location.clear();
        self.var_dim.clear();
        for (key, &(location, dim)) in offsets {
            self.var_location.insert(*key, location);
            self.var_dim.insert(*key, dim);
        }
    }

    fn compute_basis_kernel(&mut self) -> Result<()> {
        let ordering: Vec<Key> = self.cc.keys.iter().copied().collect();
        let system = self.cc.merit_graph.linearize(&self.values, &ordering)?;
        self.set_layout(&system.offsets);
        self.basis = null_space(&system.jacobian, self.params.kernel_tolerance)?;
        if self.basis.ncols() != self.declared_dim {
            debug!(
                declared = self.declared_dim,
                kernel = self.basis.ncols(),
                "kernel dimension differs from declared manifold dimension"
            );
        }
        Ok(())
    }

    fn compute_basis_specify_variables(&mut self) -> Result<()> {
        let mut basis_dim = 0;
        for &key in &self.basis_keys {
            basis_dim += self.values.dim_of(key)?;
        }
        if basis_dim != self.declared_dim {
            warn!(
                specified = basis_dim,
                expected = self.declared_dim,
                "specified basis has wrong dimensions"
            );
        }

        let mut ordering: Vec<Key> = self
            .cc
            .keys
            .iter()
            .copied()
            .filter(|k| !self.basis_keys.contains(k))
            .collect();
        let eliminated_dim = self.base_dim.saturating_sub(basis_dim);
        ordering.extend(self.basis_keys.iter().copied());

        let system = self.cc.merit_graph.linearize(&self.values, &ordering)?;
        self.set_layout(&system.offsets);

        // A_e x_e + A_b x_b = 0  =>  x_e = -A_e⁺ A_b x_b, one column per basis direction.
        let a_e = system.jacobian.columns(0, eliminated_dim).into_owned();
        let a_b = system.jacobian.columns(eliminated_dim, basis_dim).into_owned();
        let Some(sensitivity) = eliminate(&a_e, &(-a_b), self.params.kernel_tolerance)? else {
            warn!(
                basis_keys = self.basis_keys.len(),
                "constraints are singular in the non-basis variables; using the kernel basis"
            );
            return self.compute_basis_kernel();
        };

        let mut basis = DMatrix::zeros(self.base_dim, basis_dim);
        basis
            .view_mut((0, 0), (eliminated_dim, basis_dim))
            .copy_from(&sensitivity);
        basis
            .view_mut((eliminated_dim, 0), (basis_dim, basis_dim))
            .fill_with_identity();
        self.basis = basis;
        Ok(())
    }
}

/// Orthonormal basis of the null space of `a`.
fn null_space(a: &DMatrix<f64>, tolerance: f64) -> Result<DMatrix<f64>> {
    let n = a.ncols();
    if n == 0 {
        return Ok(DMatrix::zeros(0, 0));
    }
    // Thin SVD only yields min(m, n) right singular vectors; pad to square.
    let padded = if a.nrows() < n {
        let mut p = DMatrix::zeros(n, n);
        p.view_mut((0, 0), (a.nrows(), n)).copy_from(a);
        p
    } else {
        a.clone()
    };
    let svd = padded.svd(false, true);
    let v_t = svd
        .v_t
        .ok_or_else(|| GraphError::numerical("SVD did not produce right singular vectors"))?;
    let threshold = tolerance * svd.singular_values.max().max(1.0);
    let columns: Vec<usize> = (0..n)
        .filter(|&i| svd.singular_values[i] <= threshold)
        .collect();
    Ok(DMatrix::from_fn(n, columns.len(), |r, c| v_t[(columns[c], r)]))
}

/// Solve `a x = rhs` for `x`. `None` when `a` does not have full column
/// rank, so `x` is not determined by `rhs`.
fn eliminate(a: &DMatrix<f64>, rhs: &DMatrix<f64>, tolerance: f64) -> Result<Option<DMatrix<f64>>> {
    if a.ncols() == 0 {
        return Ok(Some(DMatrix::zeros(0, rhs.ncols())));
    }
    if a.nrows() < a.ncols() {
        return Ok(None);
    }
    let svd = a.clone().svd(true, true);
    let threshold = tolerance * svd.singular_values.max().max(1.0);
    if svd.rank(threshold) < a.ncols() {
        return Ok(None);
    }
    svd.solve(rhs, threshold)
        .map(Some)
        .map_err(GraphError::numerical)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::factor::Factor;
    use crate::factors::CustomFactor;
    use crate::key::Symbol;
    use approx::assert_relative_eq;

    fn x(i: u64) -> Key {
        Symbol::new(b'x', i).key()
    }

    /// x0² + x1² = 1
    fn circle() -> (Arc<ConnectedComponent>, Values) {
        let (a, b) = (x(0), x(1));
        let mut graph = FactorGraph::new();
        graph.add(CustomFactor::new(vec![a, b], NoiseModel::constrained(1), move |v| {
            let (p, q) = (v.scalar(a)?, v.scalar(b)?);
            Ok(DVector::from_element(1, p * p + q * q - 1.0))
        }));
        let mut values = Values::new();
        values.insert(a, 0.6).unwrap();
        values.insert(b, 0.8).unwrap();
        (Arc::new(ConnectedComponent::new(graph)), values)
    }

    /// x0 + x1 + x2 = 1
    fn plane() -> (Arc<ConnectedComponent>, Values) {
        let keys = vec![x(0), x(1), x(2)];
        let captured = keys.clone();
        let mut graph = FactorGraph::new();
        graph.add(CustomFactor::new(keys, NoiseModel::constrained(1), move |v| {
            let mut sum = -1.0;
            for k in &captured {
                sum += v.scalar(*k)?;
            }
            Ok(DVector::from_element(1, sum))
        }));
        let mut values = Values::new();
        values.insert(x(0), 0.2).unwrap();
        values.insert(x(1), 0.3).unwrap();
        values.insert(x(2), 0.5).unwrap();
        (Arc::new(ConnectedComponent::new(graph)), values)
    }

    fn jacobian(cc: &ConnectedComponent, manifold: &ConstraintManifold) -> DMatrix<f64> {
        let mut sorted: Vec<(Key, usize)> = manifold
            .var_location
            .iter()
            .map(|(k, loc)| (*k, *loc))
            .collect();
        sorted.sort_by_key(|(_, loc)| *loc);
        let ordering: Vec<Key> = sorted.into_iter().map(|(k, _)| k).collect();
        cc.merit_graph
            .linearize(manifold.values(), &ordering)
            .unwrap()
            .jacobian
    }

    #[test]
    fn test_kernel_basis_is_null_space() {
        let (cc, values) = circle();
        let params = Arc::new(ManifoldParams::default());
        let manifold =
            ConstraintManifold::new(Arc::clone(&cc), &values, params, true, true, vec![]).unwrap();
        assert_eq!(manifold.dim(), 1);
        assert_eq!(manifold.basis().shape(), (2, 1));
        let residual = jacobian(&cc, &manifold) * manifold.basis();
        assert_relative_eq!(residual.norm(), 0.0, epsilon = 1e-6);

        let (cc, values) = plane();
        let params = Arc::new(ManifoldParams::default());
        let manifold =
            ConstraintManifold::new(Arc::clone(&cc), &values, params, true, true, vec![]).unwrap();
        assert_eq!(manifold.dim(), 2);
        let residual = jacobian(&cc, &manifold) * manifold.basis();
        assert_relative_eq!(residual.norm(), 0.0, epsilon = 1e-8);
    }

    #[test]
    fn test_retract_zero_is_identity() {
        let (cc, values) = circle();
        let params = Arc::new(ManifoldParams::default());
        let manifold = ConstraintManifold::new(cc, &values, params, true, true, vec![]).unwrap();
        let same = manifold.retract(&DVector::zeros(1)).unwrap();
        assert_relative_eq!(same.values().scalar(x(0)).unwrap(), 0.6, epsilon = 1e-8);
        assert_relative_eq!(same.values().scalar(x(1)).unwrap(), 0.8, epsilon = 1e-8);
    }

    #[test]
    fn test_chart_round_trip() {
        for retract_type in [
            RetractType::Unconstrained,
            RetractType::Projection,
            RetractType::PartialProjection,
        ] {
            let (cc, values) = circle();
            let params = Arc::new(ManifoldParams::kernel(retract_type));
            let manifold = ConstraintManifold::new(cc, &values, params, true, true, vec![]).unwrap();
            let xi = DVector::from_element(1, 1e-3);
            let moved = manifold.retract(&xi).unwrap();
            let back = manifold.local_coordinates(&moved).unwrap();
            assert_relative_eq!(back[0], xi[0], epsilon = 1e-5);

            let (p, q) = (
                moved.values().scalar(x(0)).unwrap(),
                moved.values().scalar(x(1)).unwrap(),
            );
            assert_relative_eq!(p * p + q * q, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_linear_chart_is_exact() {
        let (cc, values) = plane();
        let params = Arc::new(ManifoldParams::default());
        let manifold = ConstraintManifold::new(cc, &values, params, true, true, vec![]).unwrap();
        let xi = DVector::from_vec(vec![0.3, -0.2]);
        let moved = manifold.retract(&xi).unwrap();
        assert_relative_eq!(manifold.local_coordinates(&moved).unwrap(), xi, epsilon = 1e-8);
    }

    #[test]
    fn test_specify_variables_basis() {
        let (cc, values) = circle();
        let params = Arc::new(ManifoldParams::specify_variables());
        let manifold =
            ConstraintManifold::new(Arc::clone(&cc), &values, params, true, true, vec![x(0)])
                .unwrap();
        assert_eq!(manifold.dim(), 1);
        let mut h0 = DMatrix::zeros(0, 0);
        let mut h1 = DMatrix::zeros(0, 0);
        manifold.recover(x(0), Some(&mut h0)).unwrap();
        let value = manifold.recover(x(1), Some(&mut h1)).unwrap();
        assert!(matches!(value, Value::Scalar(_)));
        assert_relative_eq!(h0[(0, 0)], 1.0, epsilon = 1e-10);
        // dx1/dx0 = -x0/x1 on the circle
        assert_relative_eq!(h1[(0, 0)], -0.75, epsilon = 1e-6);
        let residual = jacobian(&cc, &manifold) * manifold.basis();
        assert_relative_eq!(residual.norm(), 0.0, epsilon = 1e-6);

        // partial projection keeps the basis variable where the step put it
        let moved = manifold.retract(&DVector::from_element(1, 0.01)).unwrap();
        assert_relative_eq!(moved.values().scalar(x(0)).unwrap(), 0.61, epsilon = 1e-6);
    }

    #[test]
    fn test_specify_variables_at_singular_point() {
        // At (1, 0) the constraint does not determine x1 from x0.
        let (cc, mut values) = circle();
        values.update(x(0), 1.0).unwrap();
        values.update(x(1), 0.0).unwrap();
        let params = Arc::new(ManifoldParams::specify_variables());
        let manifold =
            ConstraintManifold::new(Arc::clone(&cc), &values, params, true, true, vec![x(0)])
                .unwrap();
        assert_eq!(manifold.dim(), 1);
        let residual = jacobian(&cc, &manifold) * manifold.basis();
        assert_relative_eq!(residual.norm(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_partial_projection_rejects_infeasible_step() {
        let (cc, values) = circle();
        let params = Arc::new(ManifoldParams::specify_variables());
        let manifold =
            ConstraintManifold::new(Arc::clone(&cc), &values, params, true, true, vec![x(0)])
                .unwrap();
        // Pins x0 at 1.1, off the unit circle.
        let err = manifold.retract(&DVector::from_element(1, 0.5)).unwrap_err();
        assert!(err.is_rejected_step());
        assert!(matches!(err, GraphError::RetractionFailed { violation, .. } if violation > 1.0));
    }

    #[test]
    fn test_without_basis() {
        let (cc, values) = circle();
        let params = Arc::new(ManifoldParams::default());
        let manifold = ConstraintManifold::new(cc, &values, params, true, false, vec![]).unwrap();
        assert!(!manifold.has_basis());
        assert_eq!(manifold.dim(), 0);
        assert_eq!(manifold.declared_dim(), 1);
        assert!(manifold.recover(x(0), None).is_ok());
        let mut h = DMatrix::zeros(0, 0);
        assert_eq!(
            manifold.recover(x(0), Some(&mut h)).unwrap_err(),
            GraphError::MissingBasis
        );
        assert_eq!(
            manifold.retract(&DVector::zeros(1)).unwrap_err(),
            GraphError::MissingBasis
        );
    }

    #[test]
    fn test_repeated_basis_keys() {
        let (cc, values) = circle();
        let params = Arc::new(ManifoldParams::specify_variables());
        let manifold = ConstraintManifold::new(cc, &values, params, true, true, vec![x(0), x(0)])
            .unwrap();
        assert_eq!(manifold.basis_keys(), &[x(0)]);
        assert_eq!(manifold.dim(), 1);
        assert_eq!(manifold.basis().shape(), (2, 1));
    }

    #[test]
    fn test_elimination_basis_is_empty() {
        let (cc, values) = circle();
        let params = Arc::new(ManifoldParams::default().with_basis_type(BasisType::Elimination));
        let manifold = ConstraintManifold::new(cc, &values, params, true, true, vec![]).unwrap();
        assert_eq!(manifold.dim(), 0);
        assert_eq!(manifold.basis().ncols(), 0);
    }

    #[test]
    fn test_retract_dimension_mismatch() {
        let (cc, values) = circle();
        let params = Arc::new(ManifoldParams::default());
        let manifold = ConstraintManifold::new(cc, &values, params, true, true, vec![]).unwrap();
        assert!(matches!(
            manifold.retract(&DVector::zeros(2)),
            Err(GraphError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_initial_retraction_restores_feasibility() {
        let (cc, mut values) = circle();
        values.update(x(0), 1.2).unwrap();
        let params = Arc::new(ManifoldParams::default());
        let manifold =
            ConstraintManifold::new(Arc::clone(&cc), &values, params, true, true, vec![]).unwrap();
        let constraint = cc.constraints.get(0).unwrap();
        let violation = constraint
            .unwhitened_error(manifold.values(), None)
            .unwrap();
        assert_relative_eq!(violation[0], 0.0, epsilon = 1e-8);
    }

    #[test]
    fn test_missing_variable() {
        let (cc, _) = circle();
        let params = Arc::new(ManifoldParams::default());
        let err = ConstraintManifold::new(cc, &Values::new(), params, true, true, vec![]).unwrap_err();
        assert!(err.is_missing_key());
    }
}
