//! Contact points on links.
//!
//! A link carries at most one contact point. Its id tags the contact frame's
//! keys and must fit into the key packing, so it is checked on creation.

use std::collections::BTreeMap;

use nalgebra::{Isometry3, Vector3};

use crate::error::DynamicsError;
use crate::keys::check_contact_id;
use crate::Result;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point on a link that may touch the environment.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContactPoint {
    /// Location in the link COM frame.
    pub point: Vector3<f64>,
    id: u64,
}

impl ContactPoint {
    /// Create a contact point.
    ///
    /// # Errors
    ///
    /// [`DynamicsError::IdOutOfRange`] if `id` exceeds
    /// [`MAX_ENTITY_ID`](crate::keys::MAX_ENTITY_ID).
    pub fn new(point: Vector3<f64>, id: u64) -> Result<Self> {
        check_contact_id(id)?;
        Ok(Self { point, id })
    }

    /// Contact id used in the contact frame's keys.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Contact frame in the link COM frame (translation only).
    #[must_use]
    pub fn com_t_contact(&self) -> Isometry3<f64> {
        Isometry3::translation(self.point.x, self.point.y, self.point.z)
    }
}

/// Contact points keyed by link name, one per link.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContactPoints {
    points: BTreeMap<String, ContactPoint>,
}

impl ContactPoints {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the contact of `link`, replacing any contact it already has.
    #[must_use]
    pub fn with(mut self, link: impl Into<String>, point: ContactPoint) -> Self {
        self.points.insert(link.into(), point);
        self
    }

    /// Contact of the named link.
    pub fn get(&self, link: &str) -> Result<&ContactPoint> {
        self.points
            .get(link)
            .ok_or_else(|| DynamicsError::UnknownContactPoint(link.to_string()))
    }

    /// Iterate over `(link name, contact)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContactPoint)> {
        self.points.iter().map(|(name, cp)| (name.as_str(), cp))
    }

    /// Number of contacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check whether no contacts are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
