//! Initial guesses for trajectory optimization.
//!
//! The interpolation initializer moves one link along a straight line (SLERP
//! for rotation, LERP for translation) and carries every other link with it
//! rigidly, at its rest pose relative to the moving link. Everything else
//! starts at zero.

use nalgebra::{Isometry3, Translation3};
use sim_types::TimeStep;

use crate::contact::ContactPoints;
use crate::dynamics_graph::zero_values;
use crate::error::DynamicsError;
use crate::keys::{contact_pose_key, pose_key};
use crate::robot::Robot;
use crate::Result;
use sim_factor_graph::Values;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How to build an initial trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InitializationTechnique {
    /// Straight-line interpolation of one link's pose.
    #[default]
    Interpolation,
    /// Rest poses and zeros everywhere.
    Zero,
    /// Joint coordinates from inverse kinematics of the interpolated poses.
    InverseKinematics,
}

/// A straight-line motion of one link's COM pose between two times.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseInterpolation {
    /// Link being moved.
    pub link: String,
    /// COM pose at `t_start`.
    pub start: Isometry3<f64>,
    /// COM pose at `t_end`.
    pub goal: Isometry3<f64>,
    /// Start time (s).
    pub t_start: f64,
    /// End time (s).
    pub t_end: f64,
    /// Step duration (s).
    pub dt: f64,
}

impl PoseInterpolation {
    /// Interpolate `link` from `start` to `goal` over `[t_start, t_end]`.
    #[must_use]
    pub fn new(
        link: impl Into<String>,
        start: Isometry3<f64>,
        goal: Isometry3<f64>,
        t_start: f64,
        t_end: f64,
        dt: f64,
    ) -> Self {
        Self {
            link: link.into(),
            start,
            goal,
            t_start,
            t_end,
            dt,
        }
    }

    fn validate(&self) -> Result<()> {
        TimeStep::Fixed(self.dt).validate()?;
        if !(self.t_start >= 0.0 && self.t_end >= self.t_start) {
            return Err(sim_types::SimError::invalid_config(format!(
                "interpolation interval [{}, {}] is invalid",
                self.t_start, self.t_end
            ))
            .into());
        }
        Ok(())
    }

    /// First and last step index, inclusive.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn steps(&self) -> (u64, u64) {
        let step = |t: f64| (t / self.dt).round() as u64;
        (step(self.t_start), step(self.t_end))
    }

    /// Interpolated pose at step `k`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn pose_at(&self, k: u64) -> Isometry3<f64> {
        let (first, last) = self.steps();
        let s = if last > first {
            (k.saturating_sub(first) as f64 / (last - first) as f64).min(1.0)
        } else {
            0.0
        };
        let rotation = self
            .start
            .rotation
            .try_slerp(&self.goal.rotation, s, f64::EPSILON)
            .unwrap_or(self.start.rotation);
        let translation = self
            .start
            .translation
            .vector
            .lerp(&self.goal.translation.vector, s);
        Isometry3::from_parts(Translation3::from(translation), rotation)
    }
}

/// Values at one step with the moved link at `w_t_moved` and every free
/// link rigidly attached to it.
fn rigid_values(
    robot: &Robot,
    moved: &str,
    w_t_moved: &Isometry3<f64>,
    t: u64,
    contacts: Option<&ContactPoints>,
) -> Result<Values> {
    let mut values = zero_values(robot, t, contacts)?;
    let anchor = robot.link(moved)?;
    let rest_inv = anchor.w_t_com().inverse();
    for link in robot.links().iter().filter(|l| !l.is_fixed()) {
        let pose = w_t_moved * (rest_inv * link.w_t_com());
        values.insert_or_assign(pose_key(link.id(), t), pose);
    }
    if let Some(contacts) = contacts {
        for (name, cp) in contacts.iter() {
            let link = robot.link(name)?;
            let w_t_com = values.pose(pose_key(link.id(), t))?;
            values.insert_or_assign(contact_pose_key(link.id(), cp.id(), t), w_t_com * cp.com_t_contact());
        }
    }
    Ok(values)
}

/// Interpolated initial values for every step of `motion`.
pub fn initialize_solution_interpolation(
    robot: &Robot,
    motion: &PoseInterpolation,
    contacts: Option<&ContactPoints>,
) -> Result<Values> {
    motion.validate()?;
    let (first, last) = motion.steps();
    let mut values = Values::new();
    for k in first..=last {
        values.extend(&rigid_values(robot, &motion.link, &motion.pose_at(k), k, contacts)?)?;
    }
    Ok(values)
}

/// Interpolated initial values through a sequence of `(goal, time)`
/// waypoints starting from `start` at time zero. Boundary steps shared by
/// two phases take the later phase's value.
pub fn initialize_solution_interpolation_multi_phase(
    robot: &Robot,
    link: &str,
    start: Isometry3<f64>,
    waypoints: &[(Isometry3<f64>, f64)],
    dt: f64,
    contacts: Option<&ContactPoints>,
) -> Result<Values> {
    if waypoints.is_empty() {
        return Err(DynamicsError::length_mismatch("waypoints", 1, 0));
    }
    let mut values = Values::new();
    let (mut pose, mut time) = (start, 0.0);
    for &(goal, t_end) in waypoints {
        let phase = PoseInterpolation::new(link, pose, goal, time, t_end, dt);
        values.assign(&initialize_solution_interpolation(robot, &phase, contacts)?);
        pose = goal;
        time = t_end;
    }
    Ok(values)
}

/// Initial values for `motion` using the requested technique.
///
/// # Errors
///
/// [`DynamicsError::UnimplementedInitialization`] for inverse kinematics.
pub fn initialize_solution(
    technique: InitializationTechnique,
    robot: &Robot,
    motion: &PoseInterpolation,
    contacts: Option<&ContactPoints>,
) -> Result<Values> {
    match technique {
        InitializationTechnique::Interpolation => {
            initialize_solution_interpolation(robot, motion, contacts)
        }
        InitializationTechnique::Zero => {
            motion.validate()?;
            let (first, last) = motion.steps();
            let mut values = Values::new();
            for k in first..=last {
                values.extend(&zero_values(robot, k, contacts)?)?;
            }
            Ok(values)
        }
        InitializationTechnique::InverseKinematics => Err(
            DynamicsError::UnimplementedInitialization("inverse kinematics"),
        ),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::joint::{JointKind, JointParams};
    use crate::keys::joint_angle_key;
    use crate::link::LinkParams;
    use crate::robot::RobotBuilder;
    use approx::assert_relative_eq;
    use nalgebra::{UnitQuaternion, Vector3};
    use sim_types::JointId;

    fn two_links() -> Robot {
        RobotBuilder::new()
            .link(LinkParams::new("body", 1.0))
            .link(LinkParams::new("leg", 1.0).with_pose(Isometry3::translation(0.0, 0.0, -1.0)))
            .joint(
                JointParams::new("hip", JointKind::Revolute, "body", "leg")
                    .with_pose(Isometry3::translation(0.0, 0.0, -0.5)),
            )
            .build()
            .unwrap()
    }

    fn motion() -> PoseInterpolation {
        PoseInterpolation::new(
            "body",
            Isometry3::identity(),
            Isometry3::new(Vector3::new(1.0, 0.0, 0.0), Vector3::z() * 0.4),
            0.0,
            1.0,
            0.25,
        )
    }

    #[test]
    fn test_steps_and_endpoints() {
        let m = motion();
        assert_eq!(m.steps(), (0, 4));
        assert_relative_eq!(m.pose_at(0).translation.vector, Vector3::zeros());
        assert_relative_eq!(m.pose_at(4).translation.vector, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(m.pose_at(2).translation.vector.x, 0.5, epsilon = 1e-12);
        assert_relative_eq!(m.pose_at(2).rotation.angle(), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_interpolation_carries_other_links() {
        let robot = two_links();
        let values = initialize_solution_interpolation(&robot, &motion(), None).unwrap();
        let leg = robot.link_id("leg").unwrap();
        let w_t_leg = values.pose(pose_key(leg, 4)).unwrap();
        let expected = motion().goal * Isometry3::translation(0.0, 0.0, -1.0);
        assert_relative_eq!(w_t_leg.translation.vector, expected.translation.vector, epsilon = 1e-12);
        assert_eq!(values.scalar(joint_angle_key(JointId::new(0), 2)).unwrap(), 0.0);
    }

    #[test]
    fn test_multi_phase() {
        let robot = two_links();
        let mid = Isometry3::translation(1.0, 0.0, 0.0);
        let end = Isometry3::from_parts(
            Translation3::new(1.0, 1.0, 0.0),
            UnitQuaternion::identity(),
        );
        let values = initialize_solution_interpolation_multi_phase(
            &robot,
            "body",
            Isometry3::identity(),
            &[(mid, 0.5), (end, 1.0)],
            0.25,
            None,
        )
        .unwrap();
        let body = robot.link_id("body").unwrap();
        assert_relative_eq!(values.pose(pose_key(body, 2)).unwrap().translation.vector.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(values.pose(pose_key(body, 3)).unwrap().translation.vector.y, 0.5, epsilon = 1e-12);
        assert!(initialize_solution_interpolation_multi_phase(&robot, "body", mid, &[], 0.1, None).is_err());
    }

    #[test]
    fn test_technique_dispatch() {
        let robot = two_links();
        let zero = initialize_solution(InitializationTechnique::Zero, &robot, &motion(), None).unwrap();
        let body = robot.link_id("body").unwrap();
        assert_relative_eq!(zero.pose(pose_key(body, 4)).unwrap().translation.vector.norm(), 0.0);

        let err = initialize_solution(InitializationTechnique::InverseKinematics, &robot, &motion(), None)
            .unwrap_err();
        assert_eq!(err, DynamicsError::UnimplementedInitialization("inverse kinematics"));
        assert!(initialize_solution_interpolation(&robot, &PoseInterpolation { dt: 0.0, ..motion() }, None).is_err());
        assert!(initialize_solution_interpolation(&robot, &motion(), None).is_ok());
        assert!(robot.link("ghost").is_err());
    }
}
