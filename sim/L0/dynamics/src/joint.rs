//! Joints and screw-axis kinematics.
//!
//! Every joint kind moves its child relative to its parent along one screw
//! axis. The kinds differ only in how that axis is built; pose, twist and
//! acceleration propagation are shared by all of them through
//! [`ScrewMotion`].
//!
//! # Conventions
//!
//! For a link `l` on either side of the joint and the other link `o`, with
//! screw axis `S_l` expressed in `l`'s COM frame and rest transform `lMo`:
//!
//! ```text
//! lTo(q)   = Exp(-S_l q) · lMo
//! V_l      = Ad(lTo) V_o + S_l q̇
//! A_l      = Ad(lTo) A_o + ad(V_l) S_l q̇ + S_l q̈
//! ```
//!
//! On the child side `S_l` is the joint's screw axis; on the parent side it
//! is `-Ad(pMc) S`, so both sides describe the same relative motion.

use nalgebra::{Isometry3, Matrix6, Vector3};
use sim_factor_graph::lie::{ad, adjoint, se3_exp, spatial, unit_twist, SpatialVector};
use sim_factor_graph::{CustomFactor, FactorGraph, NoiseModel, PriorFactor};
use sim_types::{EffortType, JointId, JointLimits, JointType, LinkId, PlanarAxis, SimError};

use crate::cost_models::CostModels;
use crate::error::DynamicsError;
use crate::factors::{
    JointLimitFactor, PoseFactor, TorqueFactor, TwistAccelFactor, TwistFactor,
    WrenchEquivalenceFactor, WrenchPlanarFactor,
};
use crate::keys::{
    joint_accel_key, joint_angle_key, joint_vel_key, pose_key, torque_key, twist_accel_key,
    twist_key, wrench_key,
};
use crate::link::Link;
use crate::Result;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Joint kinds
// ============================================================================

/// Kind of joint, carrying its screw-axis construction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JointKind {
    /// Rotation about the axis.
    #[default]
    Revolute,
    /// Translation along the axis.
    Prismatic,
    /// Rotation about the axis coupled with translation along it.
    Screw {
        /// Translation per full turn.
        pitch: f64,
    },
    /// No relative motion.
    Fixed,
}

impl JointKind {
    /// Classification tag.
    #[must_use]
    pub fn joint_type(self) -> JointType {
        match self {
            Self::Revolute => JointType::Revolute,
            Self::Prismatic => JointType::Prismatic,
            Self::Screw { .. } => JointType::Screw,
            Self::Fixed => JointType::Fixed,
        }
    }

    /// Screw axis in the child COM frame, given the unit joint axis (joint
    /// frame) and the joint frame expressed in the child COM frame.
    #[must_use]
    pub fn screw_axis(self, axis: &Vector3<f64>, c_t_j: &Isometry3<f64>) -> SpatialVector {
        let w = c_t_j.rotation * axis;
        let p = c_t_j.translation.vector;
        match self {
            Self::Revolute => unit_twist(&w, &p),
            Self::Prismatic => spatial(&Vector3::zeros(), &w),
            Self::Screw { pitch } => {
                unit_twist(&w, &p) + spatial(&Vector3::zeros(), &(w * (pitch / std::f64::consts::TAU)))
            }
            Self::Fixed => SpatialVector::zeros(),
        }
    }
}

// ============================================================================
// Shared screw kinematics
// ============================================================================

/// One side of a joint: screw axis and rest transform in that side's COM frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScrewMotion {
    /// Screw axis `S_l`.
    pub axis: SpatialVector,
    /// Rest transform `lMo` (other COM frame in this COM frame).
    pub rest: Isometry3<f64>,
}

impl ScrewMotion {
    /// Create from an axis and rest transform.
    #[must_use]
    pub fn new(axis: SpatialVector, rest: Isometry3<f64>) -> Self {
        Self { axis, rest }
    }

    /// `lTo(q) = Exp(-S q) · lMo`.
    #[must_use]
    pub fn transform(&self, q: f64) -> Isometry3<f64> {
        se3_exp(&(self.axis * -q)) * self.rest
    }

    /// `Ad(lTo(q))`.
    #[must_use]
    pub fn adjoint(&self, q: f64) -> Matrix6<f64> {
        adjoint(&self.transform(q))
    }

    /// Twist of this side from the other side's twist.
    #[must_use]
    pub fn twist(&self, q: f64, qdot: f64, other_twist: &SpatialVector) -> SpatialVector {
        self.adjoint(q) * other_twist + self.axis * qdot
    }

    /// Twist acceleration of this side from its own twist and the other
    /// side's twist acceleration.
    #[must_use]
    pub fn accel(
        &self,
        q: f64,
        qdot: f64,
        qddot: f64,
        this_twist: &SpatialVector,
        other_accel: &SpatialVector,
    ) -> SpatialVector {
        self.adjoint(q) * other_accel + ad(this_twist) * self.axis * qdot + self.axis * qddot
    }

    /// Derivative of `Ad(lTo(q)) y` with respect to `q`: `-ad(S) Ad(lTo) y`.
    #[must_use]
    pub fn adjoint_derivative(&self, q: f64, y: &SpatialVector) -> SpatialVector {
        -(ad(&self.axis) * (self.adjoint(q) * y))
    }

    /// Derivative of `Ad(lTo(q))ᵀ f` with respect to `q`: `-Ad(lTo)ᵀ ad(S)ᵀ f`.
    #[must_use]
    pub fn coadjoint_derivative(&self, q: f64, f: &SpatialVector) -> SpatialVector {
        -(self.adjoint(q).transpose() * (ad(&self.axis).transpose() * f))
    }
}

// ============================================================================
// Joint
// ============================================================================

/// Description of a joint, consumed by [`crate::RobotBuilder`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointParams {
    /// Unique name.
    pub name: String,
    /// Kind of joint.
    pub kind: JointKind,
    /// Name of the parent link.
    pub parent: String,
    /// Name of the child link.
    pub child: String,
    /// Pose of the joint frame in the world at rest.
    pub w_t_j: Isometry3<f64>,
    /// Joint axis in the joint frame.
    pub axis: Vector3<f64>,
    /// Bounds used by the joint-limit factors.
    pub limits: JointLimits,
    /// How the joint is driven.
    pub effort: EffortType,
}

impl JointParams {
    /// Joint of `kind` between `parent` and `child`, located at the world
    /// origin with its axis along Z.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: JointKind,
        parent: impl Into<String>,
        child: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: parent.into(),
            child: child.into(),
            w_t_j: Isometry3::identity(),
            axis: Vector3::z(),
            limits: JointLimits::default(),
            effort: EffortType::default(),
        }
    }

    /// Set the joint frame pose.
    #[must_use]
    pub fn with_pose(mut self, w_t_j: Isometry3<f64>) -> Self {
        self.w_t_j = w_t_j;
        self
    }

    /// Set the joint axis (joint frame).
    #[must_use]
    pub fn with_axis(mut self, axis: Vector3<f64>) -> Self {
        self.axis = axis;
        self
    }

    /// Set the limits.
    #[must_use]
    pub fn with_limits(mut self, limits: JointLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the effort type.
    #[must_use]
    pub fn with_effort(mut self, effort: EffortType) -> Self {
        self.effort = effort;
        self
    }
}

/// A single-degree-of-freedom coupling between a parent and a child link.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Joint {
    id: JointId,
    name: String,
    kind: JointKind,
    parent: LinkId,
    child: LinkId,
    w_t_j: Isometry3<f64>,
    child_motion: ScrewMotion,
    parent_motion: ScrewMotion,
    limits: JointLimits,
    effort: EffortType,
}

impl Joint {
    /// Resolve screw axes and rest transforms from the attached links.
    pub(crate) fn from_params(
        id: JointId,
        params: JointParams,
        parent: &Link,
        child: &Link,
    ) -> Result<Self> {
        params.limits.validate()?;
        let norm = params.axis.norm();
        if params.kind != JointKind::Fixed && norm < 1e-10 {
            return Err(SimError::invalid_config(format!(
                "joint {} has a zero-length axis",
                params.name
            ))
            .into());
        }
        let axis = if norm > 0.0 { params.axis / norm } else { params.axis };

        let w_t_pcom = parent.w_t_com();
        let w_t_ccom = child.w_t_com();
        let c_m_p = w_t_ccom.inverse() * w_t_pcom;
        let p_m_c = c_m_p.inverse();
        let c_t_j = w_t_ccom.inverse() * params.w_t_j;

        let child_axis = params.kind.screw_axis(&axis, &c_t_j);
        let parent_axis = -(adjoint(&p_m_c) * child_axis);

        Ok(Self {
            id,
            name: params.name,
            kind: params.kind,
            parent: parent.id(),
            child: child.id(),
            w_t_j: params.w_t_j,
            child_motion: ScrewMotion::new(child_axis, c_m_p),
            parent_motion: ScrewMotion::new(parent_axis, p_m_c),
            limits: params.limits,
            effort: params.effort,
        })
    }

    /// Arena id.
    #[must_use]
    pub fn id(&self) -> JointId {
        self.id
    }

    /// Name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of joint.
    #[must_use]
    pub fn kind(&self) -> JointKind {
        self.kind
    }

    /// Classification tag.
    #[must_use]
    pub fn joint_type(&self) -> JointType {
        self.kind.joint_type()
    }

    /// Parent link.
    #[must_use]
    pub fn parent(&self) -> LinkId {
        self.parent
    }

    /// Child link.
    #[must_use]
    pub fn child(&self) -> LinkId {
        self.child
    }

    /// Rest pose of the joint frame in the world.
    #[must_use]
    pub fn w_t_j(&self) -> &Isometry3<f64> {
        &self.w_t_j
    }

    /// Limits.
    #[must_use]
    pub fn limits(&self) -> &JointLimits {
        &self.limits
    }

    /// Effort type.
    #[must_use]
    pub fn effort(&self) -> EffortType {
        self.effort
    }

    /// Screw motion seen from the child link.
    #[must_use]
    pub fn child_motion(&self) -> &ScrewMotion {
        &self.child_motion
    }

    /// Check whether `link` is the parent of this joint.
    #[must_use]
    pub fn is_parent(&self, link: LinkId) -> bool {
        self.parent == link
    }

    /// Check whether `link` is the child of this joint.
    #[must_use]
    pub fn is_child(&self, link: LinkId) -> bool {
        self.child == link
    }

    fn motion(&self, link: LinkId) -> Result<&ScrewMotion> {
        if self.is_child(link) {
            Ok(&self.child_motion)
        } else if self.is_parent(link) {
            Ok(&self.parent_motion)
        } else {
            Err(DynamicsError::not_attached(link.to_string(), &self.name))
        }
    }

    /// The link on the other side of the joint.
    pub fn other_link(&self, link: LinkId) -> Result<LinkId> {
        if self.is_child(link) {
            Ok(self.parent)
        } else if self.is_parent(link) {
            Ok(self.child)
        } else {
            Err(DynamicsError::not_attached(link.to_string(), &self.name))
        }
    }

    /// Screw axis expressed in `link`'s COM frame.
    pub fn screw_axis(&self, link: LinkId) -> Result<SpatialVector> {
        Ok(self.motion(link)?.axis)
    }

    /// Pose of the other link's COM in `link`'s COM frame at coordinate `q`.
    pub fn transform_to(&self, link: LinkId, q: f64) -> Result<Isometry3<f64>> {
        Ok(self.motion(link)?.transform(q))
    }

    /// Pose of `link`'s COM in the other link's COM frame at coordinate `q`.
    pub fn transform_from(&self, link: LinkId, q: f64) -> Result<Isometry3<f64>> {
        Ok(self.motion(link)?.transform(q).inverse())
    }

    /// Twist of `link` given the other link's twist.
    pub fn transform_twist_to(
        &self,
        link: LinkId,
        q: f64,
        qdot: f64,
        other_twist: &SpatialVector,
    ) -> Result<SpatialVector> {
        Ok(self.motion(link)?.twist(q, qdot, other_twist))
    }

    /// Twist acceleration of `link` given its twist and the other link's
    /// twist acceleration.
    pub fn transform_twist_accel_to(
        &self,
        link: LinkId,
        q: f64,
        qdot: f64,
        qddot: f64,
        this_twist: &SpatialVector,
        other_accel: &SpatialVector,
    ) -> Result<SpatialVector> {
        Ok(self.motion(link)?.accel(q, qdot, qddot, this_twist, other_accel))
    }

    // ------------------------------------------------------------------------
    // Factor emission
    // ------------------------------------------------------------------------

    /// Pose consistency factor at step `t`.
    #[must_use]
    pub fn pose_factor(&self, t: u64, cost_models: &CostModels) -> PoseFactor {
        PoseFactor::new(
            pose_key(self.parent, t),
            pose_key(self.child, t),
            joint_angle_key(self.id, t),
            cost_models.pose.clone(),
            self.child_motion,
        )
    }

    /// Dynamics factors of this joint at step `t`: pose, twist, twist
    /// acceleration, torque, wrench equivalence (only when neither link is
    /// fixed), planar wrench (when a plane is given) and effort factors.
    #[must_use]
    pub fn dynamics_factors(
        &self,
        t: u64,
        links_fixed: (bool, bool),
        cost_models: &CostModels,
        planar_axis: Option<PlanarAxis>,
    ) -> FactorGraph {
        let (i1, i2, j) = (self.parent, self.child, self.id);
        let mut graph = FactorGraph::new();

        graph.add(self.pose_factor(t, cost_models));
        graph.add(TwistFactor::new(
            twist_key(i1, t),
            twist_key(i2, t),
            joint_angle_key(j, t),
            joint_vel_key(j, t),
            cost_models.twist.clone(),
            self.child_motion,
        ));
        graph.add(TwistAccelFactor::new(
            twist_key(i2, t),
            twist_accel_key(i1, t),
            twist_accel_key(i2, t),
            joint_angle_key(j, t),
            joint_vel_key(j, t),
            joint_accel_key(j, t),
            cost_models.twist_accel.clone(),
            self.child_motion,
        ));
        if !links_fixed.0 && !links_fixed.1 {
            graph.add(WrenchEquivalenceFactor::new(
                wrench_key(i1, j, t),
                wrench_key(i2, j, t),
                joint_angle_key(j, t),
                cost_models.wrench_equivalence.clone(),
                self.child_motion,
            ));
        }
        graph.add(TorqueFactor::new(
            wrench_key(i2, j, t),
            torque_key(j, t),
            cost_models.torque.clone(),
            self.child_motion.axis,
        ));
        if let Some(axis) = planar_axis {
            graph.add(WrenchPlanarFactor::new(
                wrench_key(i2, j, t),
                cost_models.planar.clone(),
                axis,
            ));
        }
        graph.extend(&self.effort_factors(t, cost_models));
        graph
    }

    /// Factors implied by the effort type at step `t`.
    #[must_use]
    pub fn effort_factors(&self, t: u64, cost_models: &CostModels) -> FactorGraph {
        let mut graph = FactorGraph::new();
        let tau = torque_key(self.id, t);
        match self.effort {
            EffortType::Actuated => {}
            EffortType::Unactuated => {
                graph.add(PriorFactor::new(tau, 0.0, cost_models.torque.clone()));
            }
            EffortType::Impedance { spring_coefficient } => {
                let q = joint_angle_key(self.id, t);
                graph.add(CustomFactor::new(
                    vec![tau, q],
                    cost_models.torque.clone(),
                    move |values| {
                        let residual = values.scalar(tau)? + spring_coefficient * values.scalar(q)?;
                        Ok(nalgebra::DVector::from_element(1, residual))
                    },
                ));
            }
        }
        graph
    }

    /// Soft limit factors on coordinate, velocity, acceleration and torque at step `t`.
    #[must_use]
    pub fn joint_limit_factors(&self, t: u64, cost_models: &CostModels) -> FactorGraph {
        let l = &self.limits;
        let noise: &NoiseModel = &cost_models.joint_limit;
        let j = self.id;
        let mut graph = FactorGraph::new();
        graph.add(JointLimitFactor::new(
            joint_angle_key(j, t),
            noise.clone(),
            l.angle_lower,
            l.angle_upper,
            l.angle_threshold,
        ));
        graph.add(JointLimitFactor::new(
            joint_vel_key(j, t),
            noise.clone(),
            -l.velocity,
            l.velocity,
            l.velocity_threshold,
        ));
        graph.add(JointLimitFactor::new(
            joint_accel_key(j, t),
            noise.clone(),
            -l.acceleration,
            l.acceleration,
            l.acceleration_threshold,
        ));
        graph.add(JointLimitFactor::new(
            torque_key(j, t),
            noise.clone(),
            -l.torque,
            l.torque,
            l.torque_threshold,
        ));
        graph
    }
}
