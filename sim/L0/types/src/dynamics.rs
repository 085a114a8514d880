//! Environment vectors consumed by dynamics graph assembly.

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Gravity configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Gravity {
    /// Acceleration due to gravity (m/s²), expressed in the world frame.
    pub acceleration: Vector3<f64>,
}

impl Default for Gravity {
    fn default() -> Self {
        Self::earth()
    }
}

impl Gravity {
    /// Standard Earth gravity (9.81 m/s² in -Z direction).
    #[must_use]
    pub fn earth() -> Self {
        Self {
            acceleration: Vector3::new(0.0, 0.0, -9.81),
        }
    }

    /// Zero gravity.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            acceleration: Vector3::zeros(),
        }
    }

    /// Custom gravity vector.
    #[must_use]
    pub fn custom(acceleration: Vector3<f64>) -> Self {
        Self { acceleration }
    }

    /// Compute the gravitational force on a body.
    #[must_use]
    pub fn force_on_mass(&self, mass: f64) -> Vector3<f64> {
        self.acceleration * mass
    }

    /// Check whether gravity vanishes.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.acceleration.norm_squared() == 0.0
    }
}

/// Normal of the plane a planar mechanism moves in.
///
/// Only the coordinate axes are supported; the planar wrench factor keeps the
/// three wrench components that would move the mechanism out of the plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PlanarAxis {
    /// Mechanism moves in the y-z plane.
    X,
    /// Mechanism moves in the x-z plane.
    Y,
    /// Mechanism moves in the x-y plane.
    Z,
}

impl PlanarAxis {
    /// Match a unit coordinate vector to a planar axis.
    #[must_use]
    pub fn from_vector(axis: &Vector3<f64>) -> Option<Self> {
        if (axis - Vector3::x()).norm() < 1e-9 {
            Some(Self::X)
        } else if (axis - Vector3::y()).norm() < 1e-9 {
            Some(Self::Y)
        } else if (axis - Vector3::z()).norm() < 1e-9 {
            Some(Self::Z)
        } else {
            None
        }
    }

    /// The axis as a world-frame vector.
    #[must_use]
    pub fn vector(self) -> Vector3<f64> {
        match self {
            Self::X => Vector3::x(),
            Self::Y => Vector3::y(),
            Self::Z => Vector3::z(),
        }
    }

    /// Indices into a `[ω; f]` wrench of the components that must vanish.
    #[must_use]
    pub const fn out_of_plane_components(self) -> [usize; 3] {
        match self {
            Self::X => [1, 2, 3],
            Self::Y => [0, 2, 4],
            Self::Z => [0, 1, 5],
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gravity_presets() {
        assert_relative_eq!(Gravity::earth().acceleration.z, -9.81, epsilon = 1e-12);
        assert!(Gravity::zero().is_zero());
        let g = Gravity::custom(Vector3::new(0.0, -9.8, 0.0));
        assert_relative_eq!(g.force_on_mass(2.0).y, -19.6, epsilon = 1e-12);
    }

    #[test]
    fn test_planar_axis() {
        assert_eq!(PlanarAxis::from_vector(&Vector3::x()), Some(PlanarAxis::X));
        assert_eq!(PlanarAxis::from_vector(&Vector3::new(0.0, 1.0, 1.0)), None);
        assert_eq!(PlanarAxis::Z.out_of_plane_components(), [0, 1, 5]);
        assert_eq!(PlanarAxis::Y.vector(), Vector3::y());
    }
}
