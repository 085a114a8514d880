//! Link and joint identifiers, joint classification and joint limits.
//!
//! Links and joints live in an arena owned by the robot topology; the ids
//! defined here are the non-owning handles into it.

use crate::error::SimError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Unique identifier for a link in a robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkId(pub u64);

impl LinkId {
    /// Create a new link ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for LinkId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Link({})", self.0)
    }
}

/// Unique identifier for a joint in a robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointId(pub u64);

impl JointId {
    /// Create a new joint ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for JointId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for JointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Joint({})", self.0)
    }
}

/// Type of single-degree-of-freedom joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JointType {
    /// Rotation about a fixed axis.
    Revolute,
    /// Translation along a fixed axis.
    Prismatic,
    /// Coupled rotation and translation along a fixed axis.
    Screw,
    /// No relative motion; the coordinate is pinned at zero.
    Fixed,
}

impl JointType {
    /// Number of degrees of freedom of the joint coordinate.
    #[must_use]
    pub const fn dof(self) -> usize {
        match self {
            Self::Fixed => 0,
            Self::Revolute | Self::Prismatic | Self::Screw => 1,
        }
    }

    /// Check if this joint type has a rotational component.
    #[must_use]
    pub const fn has_rotation(self) -> bool {
        matches!(self, Self::Revolute | Self::Screw)
    }

    /// Check if this joint type has a translational component.
    #[must_use]
    pub const fn has_translation(self) -> bool {
        matches!(self, Self::Prismatic | Self::Screw)
    }
}

impl std::fmt::Display for JointType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Revolute => write!(f, "revolute"),
            Self::Prismatic => write!(f, "prismatic"),
            Self::Screw => write!(f, "screw"),
            Self::Fixed => write!(f, "fixed"),
        }
    }
}

/// How a joint is driven.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EffortType {
    /// Torque is a free (controllable) variable.
    #[default]
    Actuated,
    /// Torque is pinned at zero.
    Unactuated,
    /// Torque follows a spring law `tau = -k q`.
    Impedance {
        /// Spring coefficient.
        spring_coefficient: f64,
    },
}

/// Angle, velocity, acceleration and torque bounds for a joint.
///
/// Each bound has a threshold: the limit penalty activates once the
/// quantity comes within `threshold` of the bound.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointLimits {
    /// Lower joint coordinate bound.
    pub angle_lower: f64,
    /// Upper joint coordinate bound.
    pub angle_upper: f64,
    /// Threshold for the coordinate bounds.
    pub angle_threshold: f64,
    /// Symmetric velocity bound.
    pub velocity: f64,
    /// Threshold for the velocity bound.
    pub velocity_threshold: f64,
    /// Symmetric acceleration bound.
    pub acceleration: f64,
    /// Threshold for the acceleration bound.
    pub acceleration_threshold: f64,
    /// Symmetric torque bound.
    pub torque: f64,
    /// Threshold for the torque bound.
    pub torque_threshold: f64,
}

impl Default for JointLimits {
    fn default() -> Self {
        Self {
            angle_lower: f64::NEG_INFINITY,
            angle_upper: f64::INFINITY,
            angle_threshold: 0.0,
            velocity: f64::INFINITY,
            velocity_threshold: 0.0,
            acceleration: 10_000.0,
            acceleration_threshold: 0.0,
            torque: f64::INFINITY,
            torque_threshold: 0.0,
        }
    }
}

impl JointLimits {
    /// Set the coordinate bounds.
    #[must_use]
    pub fn with_angle(mut self, lower: f64, upper: f64) -> Self {
        self.angle_lower = lower;
        self.angle_upper = upper;
        self
    }

    /// Set the velocity bound.
    #[must_use]
    pub fn with_velocity(mut self, limit: f64) -> Self {
        self.velocity = limit;
        self
    }

    /// Set the acceleration bound.
    #[must_use]
    pub fn with_acceleration(mut self, limit: f64) -> Self {
        self.acceleration = limit;
        self
    }

    /// Set the torque bound.
    #[must_use]
    pub fn with_torque(mut self, limit: f64) -> Self {
        self.torque = limit;
        self
    }

    /// Set the same threshold for every bound.
    #[must_use]
    pub fn with_thresholds(mut self, threshold: f64) -> Self {
        self.angle_threshold = threshold;
        self.velocity_threshold = threshold;
        self.acceleration_threshold = threshold;
        self.torque_threshold = threshold;
        self
    }

    /// Check if a coordinate is within bounds.
    #[must_use]
    pub fn angle_in_range(&self, q: f64) -> bool {
        q >= self.angle_lower && q <= self.angle_upper
    }

    /// Check that every bound describes a non-empty range.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.angle_lower > self.angle_upper {
            return Err(SimError::InvalidLimits {
                quantity: "angle",
                lower: self.angle_lower,
                upper: self.angle_upper,
            });
        }
        for (quantity, bound) in [
            ("velocity", self.velocity),
            ("acceleration", self.acceleration),
            ("torque", self.torque),
        ] {
            if bound < 0.0 {
                return Err(SimError::InvalidLimits {
                    quantity,
                    lower: -bound,
                    upper: bound,
                });
            }
        }
        Ok(())
    }
}
