//! Robot topology.
//!
//! A [`Robot`] is an arena of [`Link`]s and [`Joint`]s. Joints refer to
//! links by [`LinkId`] and links list their joints by [`JointId`]; ids are
//! arena indices assigned in insertion order, so the graph of references
//! has no ownership cycles and loops (four-bar linkages, legged robots
//! standing on the ground) need no special treatment.
//!
//! Robots are built with [`RobotBuilder`], which resolves rest transforms
//! and screw axes once. After that the only mutation is pinning links to the
//! world with [`Robot::fix_link`].

use std::collections::HashMap;

use nalgebra::Isometry3;
use sim_types::{JointId, LinkId};
use tracing::debug;

use crate::error::DynamicsError;
use crate::joint::{Joint, JointParams};
use crate::keys::MAX_ENTITY_ID;
use crate::link::{Link, LinkParams};
use crate::Result;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Builder
// ============================================================================

/// Collects link and joint descriptions and resolves them into a [`Robot`].
///
/// # Example
///
/// ```
/// use nalgebra::Isometry3;
/// use sim_dynamics::{JointKind, JointParams, LinkParams, RobotBuilder};
///
/// let robot = RobotBuilder::new()
///     .link(LinkParams::new("base", 1.0))
///     .link(LinkParams::new("arm", 1.0).with_com(Isometry3::translation(1.0, 0.0, 0.0)))
///     .joint(JointParams::new("shoulder", JointKind::Revolute, "base", "arm"))
///     .fixed("base")
///     .build()
///     .unwrap();
///
/// assert_eq!(robot.num_links(), 2);
/// assert!(robot.link("base").unwrap().is_fixed());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RobotBuilder {
    links: Vec<LinkParams>,
    joints: Vec<JointParams>,
    fixed: Vec<String>,
}

impl RobotBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a link. Its id is its insertion index.
    #[must_use]
    pub fn link(mut self, params: LinkParams) -> Self {
        self.links.push(params);
        self
    }

    /// Add a joint between two previously or subsequently added links.
    #[must_use]
    pub fn joint(mut self, params: JointParams) -> Self {
        self.joints.push(params);
        self
    }

    /// Pin a link to the world at its rest pose.
    #[must_use]
    pub fn fixed(mut self, link: impl Into<String>) -> Self {
        self.fixed.push(link.into());
        self
    }

    /// Resolve names, rest transforms and screw axes.
    ///
    /// # Errors
    ///
    /// Fails on duplicate or unknown names, invalid joint parameters, or
    /// more links or joints than the key scheme can address.
    pub fn build(self) -> Result<Robot> {
        check_count("link id", self.links.len())?;
        check_count("joint id", self.joints.len())?;

        let mut robot = Robot::default();
        for (index, params) in self.links.into_iter().enumerate() {
            let id = LinkId::new(index as u64);
            if robot.link_names.insert(params.name.clone(), id).is_some() {
                return Err(DynamicsError::DuplicateLink(params.name));
            }
            robot.links.push(Link::from_params(id, params));
        }

        for (index, params) in self.joints.into_iter().enumerate() {
            let id = JointId::new(index as u64);
            if robot.joint_names.contains_key(&params.name) {
                return Err(DynamicsError::DuplicateJoint(params.name));
            }
            let parent = robot.link_id(&params.parent)?;
            let child = robot.link_id(&params.child)?;
            let joint = Joint::from_params(
                id,
                params,
                &robot.links[index_of(parent)],
                &robot.links[index_of(child)],
            )?;
            robot.links[index_of(parent)].joints.push(id);
            robot.links[index_of(child)].joints.push(id);
            robot.joint_names.insert(joint.name().to_string(), id);
            robot.joints.push(joint);
        }

        for name in &self.fixed {
            robot.fix_link(name)?;
        }

        debug!(
            links = robot.num_links(),
            joints = robot.num_joints(),
            "robot built"
        );
        Ok(robot)
    }
}

fn check_count(entity: &'static str, count: usize) -> Result<()> {
    let max = MAX_ENTITY_ID as usize + 1;
    if count > max {
        return Err(DynamicsError::IdOutOfRange {
            entity,
            value: count as u64 - 1,
            max: MAX_ENTITY_ID,
        });
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn index_of(id: LinkId) -> usize {
    id.raw() as usize
}

// ============================================================================
// Robot
// ============================================================================

/// Links and joints of an articulated body.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Robot {
    links: Vec<Link>,
    joints: Vec<Joint>,
    link_names: HashMap<String, LinkId>,
    joint_names: HashMap<String, JointId>,
}

impl Robot {
    /// Number of links.
    #[must_use]
    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    /// Number of joints.
    #[must_use]
    pub fn num_joints(&self) -> usize {
        self.joints.len()
    }

    /// Links in id order.
    #[must_use]
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Joints in id order.
    #[must_use]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// Look up a link by name.
    pub fn link(&self, name: &str) -> Result<&Link> {
        let id = self.link_id(name)?;
        self.link_by_id(id)
    }

    /// Look up a joint by name.
    pub fn joint(&self, name: &str) -> Result<&Joint> {
        let id = self
            .joint_names
            .get(name)
            .copied()
            .ok_or_else(|| DynamicsError::unknown_joint(name))?;
        self.joint_by_id(id)
    }

    /// Id of the named link.
    pub fn link_id(&self, name: &str) -> Result<LinkId> {
        self.link_names
            .get(name)
            .copied()
            .ok_or_else(|| DynamicsError::unknown_link(name))
    }

    /// Look up a link by id.
    pub fn link_by_id(&self, id: LinkId) -> Result<&Link> {
        usize::try_from(id.raw())
            .ok()
            .and_then(|i| self.links.get(i))
            .ok_or_else(|| DynamicsError::unknown_link(id.to_string()))
    }

    /// Look up a joint by id.
    pub fn joint_by_id(&self, id: JointId) -> Result<&Joint> {
        usize::try_from(id.raw())
            .ok()
            .and_then(|i| self.joints.get(i))
            .ok_or_else(|| DynamicsError::unknown_joint(id.to_string()))
    }

    /// Joints incident to `link`, in attachment order.
    pub fn link_joints(&self, link: LinkId) -> Result<Vec<&Joint>> {
        self.link_by_id(link)?
            .joints()
            .iter()
            .map(|&j| self.joint_by_id(j))
            .collect()
    }

    /// Whether the parent and child of `joint` are pinned to the world.
    pub fn joint_links_fixed(&self, joint: &Joint) -> Result<(bool, bool)> {
        Ok((
            self.link_by_id(joint.parent())?.is_fixed(),
            self.link_by_id(joint.child())?.is_fixed(),
        ))
    }

    /// Pin a link to the world at its rest COM pose.
    pub fn fix_link(&mut self, name: &str) -> Result<()> {
        let id = self.link_id(name)?;
        let link = self.link_mut(id)?;
        link.fixed_pose = link.w_t_com();
        link.is_fixed = true;
        Ok(())
    }

    /// Pin a link to the world at the given COM pose.
    pub fn fix_link_at(&mut self, name: &str, w_t_com: Isometry3<f64>) -> Result<()> {
        let id = self.link_id(name)?;
        let link = self.link_mut(id)?;
        link.fixed_pose = w_t_com;
        link.is_fixed = true;
        Ok(())
    }

    /// Release a pinned link.
    pub fn unfix_link(&mut self, name: &str) -> Result<()> {
        let id = self.link_id(name)?;
        self.link_mut(id)?.is_fixed = false;
        Ok(())
    }

    fn link_mut(&mut self, id: LinkId) -> Result<&mut Link> {
        usize::try_from(id.raw())
            .ok()
            .and_then(|i| self.links.get_mut(i))
            .ok_or_else(|| DynamicsError::unknown_link(id.to_string()))
    }

    /// Check that every id fits into the key scheme.
    pub fn validate_ids(&self) -> Result<()> {
        for link in &self.links {
            if link.id().raw() > MAX_ENTITY_ID {
                return Err(DynamicsError::IdOutOfRange {
                    entity: "link id",
                    value: link.id().raw(),
                    max: MAX_ENTITY_ID,
                });
            }
        }
        for joint in &self.joints {
            if joint.id().raw() > MAX_ENTITY_ID {
                return Err(DynamicsError::IdOutOfRange {
                    entity: "joint id",
                    value: joint.id().raw(),
                    max: MAX_ENTITY_ID,
                });
            }
        }
        Ok(())
    }
}
