//! Variable assignments.
//!
//! [`Value`] is the tagged union of every variable kind a factor graph can
//! hold, including a whole constraint manifold. [`Values`] maps keys to
//! values and applies tangent-space updates.

use std::collections::BTreeMap;
use std::sync::Arc;

use nalgebra::{DVector, Isometry3, Vector6};

use crate::error::GraphError;
use crate::key::{Key, KeySet};
use crate::lie::{pose_local, pose_retract, SpatialVector};
use crate::manifold::ConstraintManifold;
use crate::Result;

/// Per-key tangent vectors (a linear update or a local-coordinate difference).
pub type VectorValues = BTreeMap<Key, DVector<f64>>;

/// A single variable value.
#[derive(Debug, Clone)]
pub enum Value {
    /// Real scalar (joint angle, torque, step duration, ...).
    Scalar(f64),
    /// Dynamically sized vector.
    Vector(DVector<f64>),
    /// Spatial vector (twist, acceleration, wrench).
    Vector6(Vector6<f64>),
    /// Rigid-body pose.
    Pose(Isometry3<f64>),
    /// Feasible point of a constraint manifold.
    Manifold(Arc<ConstraintManifold>),
}

impl Value {
    /// Tangent-space dimension.
    #[must_use]
    pub fn dim(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::Vector(v) => v.len(),
            Self::Vector6(_) | Self::Pose(_) => 6,
            Self::Manifold(m) => m.dim(),
        }
    }

    /// Name of the variant, for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Vector(_) => "vector",
            Self::Vector6(_) => "vector6",
            Self::Pose(_) => "pose",
            Self::Manifold(_) => "manifold",
        }
    }

    /// Move along a tangent vector.
    ///
    /// Retracting a manifold value runs the manifold's inner retraction and
    /// yields a new manifold instance.
    pub fn retract(&self, delta: &DVector<f64>) -> Result<Self> {
        if delta.len() != self.dim() {
            return Err(GraphError::dimension("retract", self.dim(), delta.len()));
        }
        Ok(match self {
            Self::Scalar(x) => Self::Scalar(x + delta[0]),
            Self::Vector(v) => Self::Vector(v + delta),
            Self::Vector6(v) => Self::Vector6(v + Vector6::from_column_slice(delta.as_slice())),
            Self::Pose(p) => Self::Pose(pose_retract(
                p,
                &SpatialVector::from_column_slice(delta.as_slice()),
            )),
            Self::Manifold(m) => Self::Manifold(Arc::new(m.retract(delta)?)),
        })
    }

    /// Tangent vector taking `self` to `other`.
    pub fn local_coordinates(&self, other: &Self) -> Result<DVector<f64>> {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => Ok(DVector::from_element(1, b - a)),
            (Self::Vector(a), Self::Vector(b)) => {
                if a.len() == b.len() {
                    Ok(b - a)
                } else {
                    Err(GraphError::dimension("local coordinates", a.len(), b.len()))
                }
            }
            (Self::Vector6(a), Self::Vector6(b)) => Ok(DVector::from_column_slice((b - a).as_slice())),
            (Self::Pose(a), Self::Pose(b)) => {
                Ok(DVector::from_column_slice(pose_local(a, b).as_slice()))
            }
            (Self::Manifold(a), Self::Manifold(b)) => a.local_coordinates(b),
            _ => Err(GraphError::numerical(format!(
                "cannot compare {} with {}",
                self.kind(),
                other.kind()
            ))),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Scalar(x)
    }
}

impl From<Vector6<f64>> for Value {
    fn from(v: Vector6<f64>) -> Self {
        Self::Vector6(v)
    }
}

impl From<DVector<f64>> for Value {
    fn from(v: DVector<f64>) -> Self {
        Self::Vector(v)
    }
}

impl From<Isometry3<f64>> for Value {
    fn from(p: Isometry3<f64>) -> Self {
        Self::Pose(p)
    }
}

impl From<ConstraintManifold> for Value {
    fn from(m: ConstraintManifold) -> Self {
        Self::Manifold(Arc::new(m))
    }
}

/// Ordered assignment of values to keys.
#[derive(Debug, Clone, Default)]
pub struct Values {
    values: BTreeMap<Key, Value>,
}

impl Values {
    /// Create an empty assignment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new value; fails if the key is already present.
    pub fn insert(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        if self.values.contains_key(&key) {
            return Err(GraphError::DuplicateKey(key));
        }
        self.values.insert(key, value.into());
        Ok(())
    }

    /// Insert or overwrite a value.
    pub fn insert_or_assign(&mut self, key: impl Into<Key>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Overwrite an existing value; fails if the key is absent.
    pub fn update(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        match self.values.get_mut(&key) {
            Some(slot) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(GraphError::MissingKey(key)),
        }
    }

    /// Remove a value.
    pub fn remove(&mut self, key: Key) -> Option<Value> {
        self.values.remove(&key)
    }

    /// Check whether a key is present.
    #[must_use]
    pub fn contains(&self, key: Key) -> bool {
        self.values.contains_key(&key)
    }

    /// Look up a value.
    #[must_use]
    pub fn get(&self, key: Key) -> Option<&Value> {
        self.values.get(&key)
    }

    /// Look up a value, failing if it is absent.
    pub fn at(&self, key: Key) -> Result<&Value> {
        self.values.get(&key).ok_or(GraphError::MissingKey(key))
    }

    /// Scalar value.
    pub fn scalar(&self, key: Key) -> Result<f64> {
        match self.at(key)? {
            Value::Scalar(x) => Ok(*x),
            other => Err(mismatch(key, "scalar", other)),
        }
    }

    /// Spatial vector value.
    pub fn vector6(&self, key: Key) -> Result<Vector6<f64>> {
        match self.at(key)? {
            Value::Vector6(v) => Ok(*v),
            other => Err(mismatch(key, "vector6", other)),
        }
    }

    /// Dynamically sized vector value.
    pub fn vector(&self, key: Key) -> Result<&DVector<f64>> {
        match self.at(key)? {
            Value::Vector(v) => Ok(v),
            other => Err(mismatch(key, "vector", other)),
        }
    }

    /// Pose value.
    pub fn pose(&self, key: Key) -> Result<Isometry3<f64>> {
        match self.at(key)? {
            Value::Pose(p) => Ok(*p),
            other => Err(mismatch(key, "pose", other)),
        }
    }

    /// Constraint manifold value.
    pub fn manifold(&self, key: Key) -> Result<&Arc<ConstraintManifold>> {
        match self.at(key)? {
            Value::Manifold(m) => Ok(m),
            other => Err(mismatch(key, "manifold", other)),
        }
    }

    /// Number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check whether the assignment is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over keys in order.
    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.values.keys().copied()
    }

    /// Set of all keys.
    #[must_use]
    pub fn key_set(&self) -> KeySet {
        self.values.keys().copied().collect()
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (Key, &Value)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    /// Total tangent dimension.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.values.values().map(Value::dim).sum()
    }

    /// Tangent dimension of one variable.
    pub fn dim_of(&self, key: Key) -> Result<usize> {
        Ok(self.at(key)?.dim())
    }

    /// Apply a per-key update; keys without an entry in `delta` are kept.
    pub fn retract(&self, delta: &VectorValues) -> Result<Self> {
        let mut out = self.clone();
        for (key, d) in delta {
            let value = self.at(*key)?;
            out.values.insert(*key, value.retract(d)?);
        }
        Ok(out)
    }

    /// Per-key tangent vectors taking `self` to `other`, over `self`'s keys.
    pub fn local_coordinates(&self, other: &Self) -> Result<VectorValues> {
        self.values
            .iter()
            .map(|(key, value)| Ok((*key, value.local_coordinates(other.at(*key)?)?)))
            .collect()
    }

    /// Copy of the entries whose keys are in `keys`; fails on a missing key.
    pub fn select<'a>(&self, keys: impl IntoIterator<Item = &'a Key>) -> Result<Self> {
        let mut out = Self::new();
        for key in keys {
            out.values.insert(*key, self.at(*key)?.clone());
        }
        Ok(out)
    }

    /// Insert every entry of `other`; fails on a duplicate key.
    pub fn extend(&mut self, other: &Self) -> Result<()> {
        for (key, value) in other.iter() {
            self.insert(key, value.clone())?;
        }
        Ok(())
    }

    /// Insert or overwrite every entry of `other`.
    pub fn assign(&mut self, other: &Self) {
        for (key, value) in other.iter() {
            self.values.insert(key, value.clone());
        }
    }
}

impl FromIterator<(Key, Value)> for Values {
    fn from_iter<I: IntoIterator<Item = (Key, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

fn mismatch(key: Key, expected: &'static str, found: &Value) -> GraphError {
    GraphError::TypeMismatch {
        key,
        expected,
        found: found.kind(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::key::Symbol;
    use approx::assert_relative_eq;
    use nalgebra::{Translation3, UnitQuaternion, Vector3};

    fn x(i: u64) -> Key {
        Symbol::new(b'x', i).key()
    }

    #[test]
    fn test_insert_and_typed_access() {
        let mut values = Values::new();
        values.insert(x(0), 1.5).unwrap();
        values.insert(x(1), Vector6::repeat(2.0)).unwrap();
        assert_eq!(values.scalar(x(0)).unwrap(), 1.5);
        assert_eq!(values.vector6(x(1)).unwrap()[3], 2.0);
        assert_eq!(values.dim(), 7);

        assert_eq!(values.insert(x(0), 2.0), Err(GraphError::DuplicateKey(x(0))));
        assert!(matches!(
            values.pose(x(0)),
            Err(GraphError::TypeMismatch { expected: "pose", found: "scalar", .. })
        ));
        assert_eq!(values.scalar(x(9)), Err(GraphError::MissingKey(x(9))));
    }

    #[test]
    fn test_retract_and_local_coordinates() {
        let pose = Isometry3::from_parts(
            Translation3::new(1.0, 0.0, 0.0),
            UnitQuaternion::from_scaled_axis(Vector3::new(0.0, 0.0, 0.3)),
        );
        let mut values = Values::new();
        values.insert(x(0), pose).unwrap();
        values.insert(x(1), 0.0).unwrap();

        let mut delta = VectorValues::new();
        delta.insert(x(0), DVector::from_vec(vec![0.0, 0.1, 0.0, 0.2, 0.0, -0.1]));
        delta.insert(x(1), DVector::from_vec(vec![0.5]));
        let moved = values.retract(&delta).unwrap();

        let back = values.local_coordinates(&moved).unwrap();
        assert_relative_eq!(back[&x(0)], delta[&x(0)], epsilon = 1e-10);
        assert_relative_eq!(back[&x(1)][0], 0.5);
    }

    #[test]
    fn test_retract_dimension_check() {
        let value = Value::Scalar(1.0);
        assert!(value.retract(&DVector::zeros(2)).is_err());
    }

    #[test]
    fn test_select_and_extend() {
        let mut values = Values::new();
        for i in 0..4 {
            values.insert(x(i), i as f64).unwrap();
        }
        let subset = values.select(&[x(1), x(3)]).unwrap();
        assert_eq!(subset.len(), 2);
        assert!(values.select(&[x(7)]).is_err());

        let mut other = Values::new();
        other.insert(x(10), 1.0).unwrap();
        other.extend(&subset).unwrap();
        assert_eq!(other.len(), 3);
        assert!(other.extend(&subset).is_err());
    }
}
