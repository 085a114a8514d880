//! Factors rewritten over manifold variables.
//!
//! When variables are absorbed into constraint manifolds, every remaining
//! factor that touches them must be re-expressed over the manifold keys. A
//! [`SubstituteFactor`] evaluates the original factor on values recovered
//! from the manifolds and chains its Jacobians through the manifold bases.

use std::collections::BTreeMap;
use std::sync::Arc;

use nalgebra::{DMatrix, DVector};
use smallvec::SmallVec;

use crate::factor::{Factor, Jacobians};
use crate::key::{Key, KeySet};
use crate::noise::NoiseModel;
use crate::values::Values;
use crate::Result;

/// A base factor with some keys replaced by manifold keys.
#[derive(Clone)]
pub struct SubstituteFactor {
    base_factor: Arc<dyn Factor>,
    replacement_map: BTreeMap<Key, Key>,
    keys: Vec<Key>,
    base_key_index: BTreeMap<Key, usize>,
    unconstrained_keys: KeySet,
    cmanifold_keys: KeySet,
    fc_values: Values,
}

impl SubstituteFactor {
    /// Rewrite `base_factor` using `replacement_map` (base key → manifold key).
    ///
    /// `fc_manifolds` holds fully constrained (zero-dimensional) manifolds;
    /// base keys they replace are frozen at their recovered values and the
    /// manifold key is not a variable of the new factor.
    pub fn new(
        base_factor: Arc<dyn Factor>,
        replacement_map: BTreeMap<Key, Key>,
        fc_manifolds: &Values,
    ) -> Result<Self> {
        let keys = Self::compute_new_keys(base_factor.as_ref(), &replacement_map, fc_manifolds);
        let mut factor = Self {
            base_factor,
            replacement_map,
            keys,
            base_key_index: BTreeMap::new(),
            unconstrained_keys: KeySet::new(),
            cmanifold_keys: KeySet::new(),
            fc_values: Values::new(),
        };
        factor.compute_base_key_index();
        factor.classify_keys(fc_manifolds)?;
        Ok(factor)
    }

    /// Keys of the rewritten factor: untouched base keys plus each distinct
    /// replacing manifold key that is not fully constrained.
    #[must_use]
    pub fn compute_new_keys(
        base_factor: &dyn Factor,
        replacement_map: &BTreeMap<Key, Key>,
        fc_manifolds: &Values,
    ) -> Vec<Key> {
        let mut cmanifold_keys = KeySet::new();
        let mut new_keys = Vec::new();
        for base_key in base_factor.keys() {
            match replacement_map.get(base_key) {
                Some(&new_key) => {
                    if !fc_manifolds.contains(new_key) && cmanifold_keys.insert(new_key) {
                        new_keys.push(new_key);
                    }
                }
                None => new_keys.push(*base_key),
            }
        }
        new_keys
    }

    fn compute_base_key_index(&mut self) {
        for (index, key) in self.base_factor.keys().iter().enumerate() {
            self.base_key_index.insert(*key, index);
        }
    }

    fn classify_keys(&mut self, fc_manifolds: &Values) -> Result<()> {
        for &base_key in self.base_factor.keys() {
            match self.replacement_map.get(&base_key) {
                Some(&new_key) => {
                    if fc_manifolds.contains(new_key) {
                        let manifold = fc_manifolds.manifold(new_key)?;
                        let value = manifold.recover(base_key, None)?.clone();
                        self.fc_values.insert_or_assign(base_key, value);
                    } else {
                        self.cmanifold_keys.insert(new_key);
                    }
                }
                None => {
                    self.unconstrained_keys.insert(base_key);
                }
            }
        }
        Ok(())
    }

    /// Check whether a base key is replaced by a manifold.
    #[must_use]
    pub fn is_replaced(&self, key: Key) -> bool {
        self.replacement_map.contains_key(&key)
    }

    /// The original factor.
    #[must_use]
    pub fn base_factor(&self) -> &Arc<dyn Factor> {
        &self.base_factor
    }

    /// Base values frozen from fully constrained manifolds.
    #[must_use]
    pub fn fc_values(&self) -> &Values {
        &self.fc_values
    }

    /// Assemble the base factor's inputs from the rewritten factor's inputs.
    fn base_values(&self, x: &Values) -> Result<Values> {
        let mut base_x = self.fc_values.clone();
        for &key in &self.unconstrained_keys {
            base_x.insert_or_assign(key, x.at(key)?.clone());
        }
        for &key in &self.cmanifold_keys {
            let manifold = x.manifold(key)?;
            for &base_key in self.base_factor.keys() {
                if let Some(value) = manifold.values().get(base_key) {
                    base_x.insert_or_assign(base_key, value.clone());
                }
            }
        }
        Ok(base_x)
    }
}

impl Factor for SubstituteFactor {
    fn keys(&self) -> &[Key] {
        &self.keys
    }

    fn dim(&self) -> usize {
        self.base_factor.dim()
    }

    fn noise_model(&self) -> &NoiseModel {
        self.base_factor.noise_model()
    }

    fn name(&self) -> &'static str {
        "substitute"
    }

    fn unwhitened_error(
        &self,
        x: &Values,
        jacobians: Option<&mut Jacobians>,
    ) -> Result<DVector<f64>> {
        let base_x = self.base_values(x)?;
        let Some(h) = jacobians else {
            return self.base_factor.unwhitened_error(&base_x, None);
        };

        let mut base_h = Jacobians::with_capacity(self.base_factor.keys().len());
        let error = self.base_factor.unwhitened_error(&base_x, Some(&mut base_h))?;

        h.clear();
        for &key in &self.keys {
            if self.unconstrained_keys.contains(&key) {
                h.push(base_h[self.base_key_index[&key]].clone());
                continue;
            }
            let manifold = x.manifold(key)?;
            let mut block = DMatrix::zeros(error.len(), manifold.dim());
            // Several base keys may be absorbed into the same manifold.
            let absorbed: SmallVec<[Key; 8]> = manifold
                .values()
                .keys()
                .filter(|k| self.base_key_index.contains_key(k))
                .collect();
            for base_key in absorbed {
                let mut h_recover = DMatrix::zeros(0, 0);
                manifold.recover(base_key, Some(&mut h_recover))?;
                block += &base_h[self.base_key_index[&base_key]] * h_recover;
            }
            h.push(block);
        }
        Ok(error)
    }
}
