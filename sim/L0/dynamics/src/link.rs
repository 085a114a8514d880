//! Rigid links.

use nalgebra::{Isometry3, Matrix3, Matrix6};
use sim_types::{JointId, LinkId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Physical description of a link, consumed by [`crate::RobotBuilder`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkParams {
    /// Unique name.
    pub name: String,
    /// Mass (kg).
    pub mass: f64,
    /// Rotational inertia about the center of mass, in the COM frame.
    pub inertia: Matrix3<f64>,
    /// Pose of the link frame in the world at rest.
    pub w_t_l: Isometry3<f64>,
    /// Pose of the center-of-mass frame in the link frame.
    pub l_t_com: Isometry3<f64>,
}

impl LinkParams {
    /// Link with unit inertia located at the world origin.
    #[must_use]
    pub fn new(name: impl Into<String>, mass: f64) -> Self {
        Self {
            name: name.into(),
            mass,
            inertia: Matrix3::identity(),
            w_t_l: Isometry3::identity(),
            l_t_com: Isometry3::identity(),
        }
    }

    /// Set the rotational inertia.
    #[must_use]
    pub fn with_inertia(mut self, inertia: Matrix3<f64>) -> Self {
        self.inertia = inertia;
        self
    }

    /// Set the rest pose of the link frame.
    #[must_use]
    pub fn with_pose(mut self, w_t_l: Isometry3<f64>) -> Self {
        self.w_t_l = w_t_l;
        self
    }

    /// Set the center-of-mass offset within the link frame.
    #[must_use]
    pub fn with_com(mut self, l_t_com: Isometry3<f64>) -> Self {
        self.l_t_com = l_t_com;
        self
    }
}

/// A rigid body of the robot.
///
/// Links own nothing but their physical data; the joints they touch are
/// referenced by id and stored in the robot's arena.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Link {
    pub(crate) id: LinkId,
    pub(crate) name: String,
    pub(crate) mass: f64,
    pub(crate) inertia: Matrix3<f64>,
    pub(crate) w_t_l: Isometry3<f64>,
    pub(crate) l_t_com: Isometry3<f64>,
    pub(crate) is_fixed: bool,
    pub(crate) fixed_pose: Isometry3<f64>,
    pub(crate) joints: Vec<JointId>,
}

impl Link {
    pub(crate) fn from_params(id: LinkId, params: LinkParams) -> Self {
        let fixed_pose = params.w_t_l * params.l_t_com;
        Self {
            id,
            name: params.name,
            mass: params.mass,
            inertia: params.inertia,
            w_t_l: params.w_t_l,
            l_t_com: params.l_t_com,
            is_fixed: false,
            fixed_pose,
            joints: Vec::new(),
        }
    }

    /// Arena id.
    #[must_use]
    pub fn id(&self) -> LinkId {
        self.id
    }

    /// Name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mass.
    #[must_use]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Rotational inertia about the center of mass.
    #[must_use]
    pub fn inertia(&self) -> &Matrix3<f64> {
        &self.inertia
    }

    /// Spatial inertia `G = blockdiag(I, m·1)` in the COM frame.
    #[must_use]
    pub fn inertia_matrix(&self) -> Matrix6<f64> {
        let mut g = Matrix6::zeros();
        g.fixed_view_mut::<3, 3>(0, 0).copy_from(&self.inertia);
        g.fixed_view_mut::<3, 3>(3, 3)
            .copy_from(&(Matrix3::identity() * self.mass));
        g
    }

    /// Rest pose of the link frame in the world.
    #[must_use]
    pub fn w_t_l(&self) -> &Isometry3<f64> {
        &self.w_t_l
    }

    /// Center-of-mass frame in the link frame.
    #[must_use]
    pub fn l_t_com(&self) -> &Isometry3<f64> {
        &self.l_t_com
    }

    /// Rest pose of the center-of-mass frame in the world.
    #[must_use]
    pub fn w_t_com(&self) -> Isometry3<f64> {
        self.w_t_l * self.l_t_com
    }

    /// Check whether the link is pinned to the world.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        self.is_fixed
    }

    /// COM pose the link is pinned at when fixed.
    #[must_use]
    pub fn fixed_pose(&self) -> &Isometry3<f64> {
        &self.fixed_pose
    }

    /// Incident joints, in attachment order.
    #[must_use]
    pub fn joints(&self) -> &[JointId] {
        &self.joints
    }
}
