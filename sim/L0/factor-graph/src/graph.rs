//! Nonlinear factor graphs.
//!
//! A [`FactorGraph`] is an ordered list of shared factors. Graphs are plain
//! values: cloning one shares the factors, and evaluation never mutates them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use nalgebra::{DMatrix, DVector};

use crate::error::GraphError;
use crate::factor::Factor;
use crate::factors::ReweightedFactor;
use crate::key::{Key, KeySet};
use crate::values::{Values, VectorValues};
use crate::Result;

/// Ordered collection of factors.
#[derive(Clone, Default)]
pub struct FactorGraph {
    factors: Vec<Arc<dyn Factor>>,
}

impl FactorGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a factor.
    pub fn add<F: Factor + 'static>(&mut self, factor: F) {
        self.factors.push(Arc::new(factor));
    }

    /// Add a shared factor.
    pub fn push(&mut self, factor: Arc<dyn Factor>) {
        self.factors.push(factor);
    }

    /// Append all factors of another graph.
    pub fn extend(&mut self, other: &Self) {
        self.factors.extend(other.factors.iter().cloned());
    }

    /// Number of factors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    /// Check whether the graph has no factors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Iterate over factors.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Factor>> {
        self.factors.iter()
    }

    /// Factor at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Arc<dyn Factor>> {
        self.factors.get(index)
    }

    /// All keys referenced by any factor.
    #[must_use]
    pub fn keys(&self) -> KeySet {
        self.factors
            .iter()
            .flat_map(|f| f.keys().iter().copied())
            .collect()
    }

    /// Total residual dimension.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.factors.iter().map(|f| f.dim()).sum()
    }

    /// Total cost `Σ ½‖whitened residual‖²`.
    pub fn error(&self, values: &Values) -> Result<f64> {
        self.factors.iter().map(|f| f.error(values)).sum()
    }

    /// Split into `(hard constraints, soft costs)`.
    #[must_use]
    pub fn split_constrained(&self) -> (Self, Self) {
        let (hard, soft): (Vec<_>, Vec<_>) =
            self.factors.iter().cloned().partition(|f| f.is_constrained());
        (Self { factors: hard }, Self { factors: soft })
    }

    /// Same residuals with unit noise models.
    #[must_use]
    pub fn with_unit_noise(&self) -> Self {
        self.factors
            .iter()
            .map(|f| Arc::new(ReweightedFactor::unit(Arc::clone(f))) as Arc<dyn Factor>)
            .collect()
    }

    /// Same residuals as penalty costs of weight `mu`.
    #[must_use]
    pub fn with_penalty(&self, mu: f64) -> Self {
        self.factors
            .iter()
            .map(|f| Arc::new(ReweightedFactor::penalty(Arc::clone(f), mu)) as Arc<dyn Factor>)
            .collect()
    }

    /// Linearize into one dense whitened system over `ordering`.
    ///
    /// Every key referenced by a factor must appear in `ordering`.
    pub fn linearize(&self, values: &Values, ordering: &[Key]) -> Result<DenseSystem> {
        let mut offsets = BTreeMap::new();
        let mut cols = 0;
        for &key in ordering {
            let d = values.dim_of(key)?;
            offsets.insert(key, (cols, d));
            cols += d;
        }

        let rows = self.dim();
        let mut jacobian = DMatrix::zeros(rows, cols);
        let mut error = DVector::zeros(rows);
        let mut row = 0;
        for factor in &self.factors {
            let linear = factor.linearize(values)?;
            let m = linear.error.len();
            error.rows_mut(row, m).copy_from(&linear.error);
            for (key, block) in linear.keys.iter().zip(&linear.jacobians) {
                let &(col, d) = offsets.get(key).ok_or(GraphError::MissingKey(*key))?;
                if block.shape() != (m, d) {
                    return Err(GraphError::dimension("jacobian block", d, block.ncols()));
                }
                let mut target = jacobian.view_mut((row, col), (m, d));
                target += block;
            }
            row += m;
        }

        Ok(DenseSystem {
            jacobian,
            error,
            offsets,
        })
    }
}

impl FromIterator<Arc<dyn Factor>> for FactorGraph {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Factor>>>(iter: I) -> Self {
        Self {
            factors: iter.into_iter().collect(),
        }
    }
}

impl fmt::Debug for FactorGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.factors.iter().map(|factor| factor.name()).collect();
        f.debug_struct("FactorGraph").field("factors", &names).finish()
    }
}

/// Dense whitened linearization `J δ + e` of a graph.
#[derive(Debug, Clone)]
pub struct DenseSystem {
    /// Stacked whitened Jacobian.
    pub jacobian: DMatrix<f64>,
    /// Stacked whitened residual.
    pub error: DVector<f64>,
    /// Column offset and dimension per key.
    pub offsets: BTreeMap<Key, (usize, usize)>,
}

impl DenseSystem {
    /// Split a stacked tangent vector back into per-key blocks.
    #[must_use]
    pub fn split(&self, delta: &DVector<f64>) -> VectorValues {
        self.offsets
            .iter()
            .map(|(key, &(offset, dim))| (*key, delta.rows(offset, dim).into_owned()))
            .collect()
    }

    /// Stack per-key blocks into one vector; missing keys stay zero.
    #[must_use]
    pub fn stack(&self, blocks: &VectorValues) -> DVector<f64> {
        let mut out = DVector::zeros(self.jacobian.ncols());
        for (key, &(offset, dim)) in &self.offsets {
            if let Some(block) = blocks.get(key) {
                out.rows_mut(offset, dim).copy_from(block);
            }
        }
        out
    }
}
