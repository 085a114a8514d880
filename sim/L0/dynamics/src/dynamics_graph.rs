//! Assembly of dynamics factor graphs.
//!
//! [`DynamicsGraph`] turns a [`Robot`] into factors at one time step or over
//! a trajectory:
//!
//! - per link, a wrench balance factor, or priors pinning a fixed link
//! - per joint, pose, twist, acceleration, torque, wrench-equivalence and
//!   optionally planar factors (see [`Joint::dynamics_factors`](crate::Joint::dynamics_factors))
//! - between steps, collocation factors integrating joint quantities
//! - optional joint-limit, contact and prior factors
//!
//! No traversal order is assumed. Closed kinematic loops are just more
//! constraints over the same variables.
//!
//! The free functions [`zero_values`] and [`zero_values_trajectory`] give
//! matching initial assignments, and the `joint_*` accessors read solved
//! quantities back out per joint.
//!
//! Every builder and accessor rejects time indices beyond
//! [`MAX_TIME`](crate::keys::MAX_TIME) with [`DynamicsError::IdOutOfRange`].

use nalgebra::{Isometry3, Matrix3};
use sim_factor_graph::lie::SpatialVector;
use sim_factor_graph::{FactorGraph, Key, NoiseModel, PriorFactor, Values};
use sim_types::{CollocationScheme, Gravity, JointId, PlanarAxis, SimError, TimeStep, TrajectoryConfig};
use tracing::debug;

use crate::contact::ContactPoints;
use crate::cost_models::CostModels;
use crate::error::DynamicsError;
use crate::factors::{
    CollocationFactor, ContactPoseFactor, PoseGoalFactor, PreintegratedPointContactFactor,
    PreintegratedPointContactMeasurements, PreintegratedRigidContactFactor,
    PreintegratedRigidContactMeasurements, StepDuration, WrenchFactor,
};
use crate::keys::{
    check_time, contact_pose_key, joint_accel_key, joint_angle_key, joint_vel_key, pose_key, time_key,
    torque_key, twist_accel_key, twist_key, wrench_key,
};
use crate::link::Link;
use crate::robot::Robot;
use crate::Result;

/// Steps `start..end` over which a contact is held, each lasting `dt`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactInterval {
    /// First step.
    pub start: u64,
    /// Last step (exclusive for integration, the factor's second endpoint).
    pub end: u64,
    /// Duration of each step.
    pub dt: f64,
}

impl ContactInterval {
    /// Create an interval.
    #[must_use]
    pub fn new(start: u64, end: u64, dt: f64) -> Self {
        Self { start, end, dt }
    }

    fn validate(&self) -> Result<()> {
        if self.end <= self.start {
            return Err(SimError::invalid_config(format!(
                "contact interval {}..{} is empty",
                self.start, self.end
            ))
            .into());
        }
        check_time(self.end)?;
        Ok(TimeStep::Fixed(self.dt).validate()?)
    }
}

/// Factor-graph builder for a robot's dynamics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicsGraph {
    cost_models: CostModels,
    gravity: Gravity,
    planar_axis: Option<PlanarAxis>,
}

impl DynamicsGraph {
    /// Create a builder.
    #[must_use]
    pub fn new(cost_models: CostModels, gravity: Gravity, planar_axis: Option<PlanarAxis>) -> Self {
        Self {
            cost_models,
            gravity,
            planar_axis,
        }
    }

    /// Noise models in use.
    #[must_use]
    pub fn cost_models(&self) -> &CostModels {
        &self.cost_models
    }

    /// Gravity in use.
    #[must_use]
    pub fn gravity(&self) -> &Gravity {
        &self.gravity
    }

    /// Plane normal for planar mechanisms.
    #[must_use]
    pub fn planar_axis(&self) -> Option<PlanarAxis> {
        self.planar_axis
    }

    // ------------------------------------------------------------------------
    // Single step
    // ------------------------------------------------------------------------

    /// Factors of one link at step `t`.
    ///
    /// # Errors
    ///
    /// [`DynamicsError::TooManyJoints`] for a free link with more than four joints.
    pub fn link_factors(&self, link: &Link, t: u64) -> Result<FactorGraph> {
        check_time(t)?;
        let i = link.id();
        let mut graph = FactorGraph::new();
        if link.is_fixed() {
            let c = &self.cost_models;
            graph.add(PriorFactor::new(pose_key(i, t), *link.fixed_pose(), c.fixed_pose.clone()));
            graph.add(PriorFactor::new(twist_key(i, t), SpatialVector::zeros(), c.fixed_twist.clone()));
            graph.add(PriorFactor::new(
                twist_accel_key(i, t),
                SpatialVector::zeros(),
                c.fixed_accel.clone(),
            ));
            return Ok(graph);
        }

        let wrenches: Vec<Key> = link.joints().iter().map(|&j| wrench_key(i, j, t)).collect();
        let gravity = (!self.gravity.is_zero()).then_some(self.gravity.acceleration);
        let factor = WrenchFactor::new(
            twist_key(i, t),
            twist_accel_key(i, t),
            &wrenches,
            pose_key(i, t),
            self.cost_models.wrench.clone(),
            link.inertia_matrix(),
            gravity,
        )
        .ok_or_else(|| DynamicsError::TooManyJoints {
            link: link.name().to_string(),
            count: wrenches.len(),
        })?;
        graph.add(factor);
        Ok(graph)
    }

    /// Full dynamics graph at step `t`, with contact-frame kinematics for
    /// every contact given.
    pub fn dynamics_factor_graph(
        &self,
        robot: &Robot,
        t: u64,
        contacts: Option<&ContactPoints>,
    ) -> Result<FactorGraph> {
        check_time(t)?;
        let mut graph = FactorGraph::new();
        for link in robot.links() {
            graph.extend(&self.link_factors(link, t)?);
        }
        for joint in robot.joints() {
            let fixed = robot.joint_links_fixed(joint)?;
            graph.extend(&joint.dynamics_factors(t, fixed, &self.cost_models, self.planar_axis));
        }
        if let Some(contacts) = contacts {
            graph.extend(&self.contact_pose_factors(robot, t, contacts)?);
        }
        debug!(t, factors = graph.len(), "dynamics graph assembled");
        Ok(graph)
    }

    /// Pose-only graph at step `t`: joint pose factors and fixed-link pose priors.
    pub fn kinematics_factor_graph(&self, robot: &Robot, t: u64) -> Result<FactorGraph> {
        check_time(t)?;
        let mut graph = FactorGraph::new();
        for link in robot.links().iter().filter(|l| l.is_fixed()) {
            graph.add(PriorFactor::new(
                pose_key(link.id(), t),
                *link.fixed_pose(),
                self.cost_models.fixed_pose.clone(),
            ));
        }
        for joint in robot.joints() {
            graph.add(joint.pose_factor(t, &self.cost_models));
        }
        Ok(graph)
    }

    /// Contact pose factors at step `t`.
    pub fn contact_pose_factors(
        &self,
        robot: &Robot,
        t: u64,
        contacts: &ContactPoints,
    ) -> Result<FactorGraph> {
        check_time(t)?;
        let mut graph = FactorGraph::new();
        for (name, cp) in contacts.iter() {
            let i = robot.link_id(name)?;
            graph.add(ContactPoseFactor::new(
                pose_key(i, t),
                contact_pose_key(i, cp.id(), t),
                self.cost_models.contact_pose.clone(),
                cp.com_t_contact(),
            ));
        }
        Ok(graph)
    }

    /// Joint limit factors of every joint at step `t`.
    pub fn joint_limit_factors(&self, robot: &Robot, t: u64) -> Result<FactorGraph> {
        check_time(t)?;
        let mut graph = FactorGraph::new();
        for joint in robot.joints() {
            graph.extend(&joint.joint_limit_factors(t, &self.cost_models));
        }
        Ok(graph)
    }

    /// Soft objective pulling the frame `com_t_goal` of `link` to `goal` at step `t`.
    pub fn pose_goal_factor(
        &self,
        robot: &Robot,
        link: &str,
        t: u64,
        goal: Isometry3<f64>,
        com_t_goal: Isometry3<f64>,
        noise: NoiseModel,
    ) -> Result<PoseGoalFactor> {
        check_time(t)?;
        let i = robot.link_id(link)?;
        Ok(PoseGoalFactor::new(pose_key(i, t), noise, goal, com_t_goal))
    }

    // ------------------------------------------------------------------------
    // Trajectories
    // ------------------------------------------------------------------------

    /// Factors integrating joint coordinates and velocities from step `t` to `t + 1`.
    pub fn collocation_factors(
        &self,
        robot: &Robot,
        t: u64,
        scheme: CollocationScheme,
        time_step: TimeStep,
    ) -> Result<FactorGraph> {
        check_time(t.saturating_add(1))?;
        let dt = match time_step {
            TimeStep::Fixed(dt) => StepDuration::Fixed(dt),
            TimeStep::Variable { phase } => {
                check_time(phase)?;
                StepDuration::Variable(time_key(phase))
            }
        };
        let mut graph = FactorGraph::new();
        for joint in robot.joints() {
            let j = joint.id();
            graph.add(CollocationFactor::new(
                joint_angle_key(j, t),
                joint_angle_key(j, t + 1),
                joint_vel_key(j, t),
                joint_vel_key(j, t + 1),
                self.cost_models.q_collocation.clone(),
                scheme,
                dt,
            ));
            graph.add(CollocationFactor::new(
                joint_vel_key(j, t),
                joint_vel_key(j, t + 1),
                joint_accel_key(j, t),
                joint_accel_key(j, t + 1),
                self.cost_models.v_collocation.clone(),
                scheme,
                dt,
            ));
        }
        Ok(graph)
    }

    /// Dynamics at steps `0..=num_steps` linked by collocation factors.
    pub fn trajectory_factor_graph(
        &self,
        robot: &Robot,
        config: &TrajectoryConfig,
        contacts: Option<&ContactPoints>,
    ) -> Result<FactorGraph> {
        config.validate()?;
        check_time(config.num_steps)?;
        let mut graph = FactorGraph::new();
        for t in 0..=config.num_steps {
            graph.extend(&self.dynamics_factor_graph(robot, t, contacts)?);
        }
        for t in 0..config.num_steps {
            graph.extend(&self.collocation_factors(robot, t, config.scheme, config.time_step)?);
        }
        debug!(
            steps = config.num_steps,
            factors = graph.len(),
            "trajectory graph assembled"
        );
        Ok(graph)
    }

    // ------------------------------------------------------------------------
    // Priors
    // ------------------------------------------------------------------------

    /// Priors on joint coordinates, velocities and torques: the inputs of a
    /// forward dynamics solve.
    pub fn forward_dynamics_priors(
        &self,
        robot: &Robot,
        t: u64,
        q: &[f64],
        v: &[f64],
        torques: &[f64],
    ) -> Result<FactorGraph> {
        check_time(t)?;
        let c = &self.cost_models;
        let mut graph = FactorGraph::new();
        add_joint_priors(&mut graph, robot, "joint angles", q, |j| joint_angle_key(j, t), &c.prior_q)?;
        add_joint_priors(&mut graph, robot, "joint velocities", v, |j| joint_vel_key(j, t), &c.prior_v)?;
        add_joint_priors(&mut graph, robot, "torques", torques, |j| torque_key(j, t), &c.prior_torque)?;
        Ok(graph)
    }

    /// Priors on joint coordinates, velocities and accelerations: the inputs
    /// of an inverse dynamics solve.
    pub fn inverse_dynamics_priors(
        &self,
        robot: &Robot,
        t: u64,
        q: &[f64],
        v: &[f64],
        a: &[f64],
    ) -> Result<FactorGraph> {
        check_time(t)?;
        let c = &self.cost_models;
        let mut graph = FactorGraph::new();
        add_joint_priors(&mut graph, robot, "joint angles", q, |j| joint_angle_key(j, t), &c.prior_q)?;
        add_joint_priors(&mut graph, robot, "joint velocities", v, |j| joint_vel_key(j, t), &c.prior_v)?;
        add_joint_priors(&mut graph, robot, "joint accelerations", a, |j| joint_accel_key(j, t), &c.prior_a)?;
        Ok(graph)
    }

    /// Initial state priors at step 0 and torque priors at every step of a
    /// forward-simulated trajectory.
    pub fn trajectory_fd_priors(
        &self,
        robot: &Robot,
        num_steps: u64,
        q0: &[f64],
        v0: &[f64],
        torques: &[Vec<f64>],
    ) -> Result<FactorGraph> {
        check_time(num_steps)?;
        let expected = usize::try_from(num_steps + 1).unwrap_or(usize::MAX);
        if torques.len() != expected {
            return Err(DynamicsError::length_mismatch("torque sequence", expected, torques.len()));
        }
        let c = &self.cost_models;
        let mut graph = FactorGraph::new();
        add_joint_priors(&mut graph, robot, "joint angles", q0, |j| joint_angle_key(j, 0), &c.prior_q)?;
        add_joint_priors(&mut graph, robot, "joint velocities", v0, |j| joint_vel_key(j, 0), &c.prior_v)?;
        for (t, tau) in (0..=num_steps).zip(torques) {
            add_joint_priors(&mut graph, robot, "torques", tau, |j| torque_key(j, t), &c.prior_torque)?;
        }
        Ok(graph)
    }

    // ------------------------------------------------------------------------
    // Contacts
    // ------------------------------------------------------------------------

    /// Point-foot contact factor over `interval`, preintegrating velocity
    /// noise along the base and contact poses found in `values`.
    #[allow(clippy::too_many_arguments)]
    pub fn point_contact_factor(
        &self,
        robot: &Robot,
        values: &Values,
        base: &str,
        contact_link: &str,
        contacts: &ContactPoints,
        interval: ContactInterval,
        velocity_covariance: Matrix3<f64>,
    ) -> Result<PreintegratedPointContactFactor> {
        interval.validate()?;
        let b = robot.link_id(base)?;
        let c = robot.link_id(contact_link)?;
        let cp = contacts.get(contact_link)?;
        let com_t_contact = cp.com_t_contact();

        let mut pcm = PreintegratedPointContactMeasurements::new(velocity_covariance);
        let w_t_bi = values.pose(pose_key(b, interval.start))?;
        for t in interval.start..interval.end {
            let w_t_c = values.pose(pose_key(c, t))? * com_t_contact;
            if t == interval.start {
                pcm.initialize(&w_t_bi, &w_t_c, interval.dt);
            } else {
                let w_t_bt = values.pose(pose_key(b, t))?;
                let delta = w_t_bi.rotation.inverse() * w_t_bt.rotation;
                pcm.integrate(&w_t_c, &delta, interval.dt);
            }
        }
        Ok(PreintegratedPointContactFactor::new(
            pose_key(b, interval.start),
            contact_pose_key(c, cp.id(), interval.start),
            pose_key(b, interval.end),
            contact_pose_key(c, cp.id(), interval.end),
            &pcm,
        )?)
    }

    /// Rigid-foot contact factor over `interval`.
    pub fn rigid_contact_factor(
        &self,
        robot: &Robot,
        contact_link: &str,
        contacts: &ContactPoints,
        interval: ContactInterval,
        angular_covariance: Matrix3<f64>,
        linear_covariance: Matrix3<f64>,
    ) -> Result<PreintegratedRigidContactFactor> {
        interval.validate()?;
        let c = robot.link_id(contact_link)?;
        let cp = contacts.get(contact_link)?;
        let mut rcm = PreintegratedRigidContactMeasurements::new(angular_covariance, linear_covariance);
        for _ in interval.start..interval.end {
            rcm.integrate(interval.dt);
        }
        Ok(PreintegratedRigidContactFactor::new(
            contact_pose_key(c, cp.id(), interval.start),
            contact_pose_key(c, cp.id(), interval.end),
            &rcm,
        )?)
    }
}

fn add_joint_priors(
    graph: &mut FactorGraph,
    robot: &Robot,
    context: &'static str,
    values: &[f64],
    key: impl Fn(JointId) -> Key,
    noise: &NoiseModel,
) -> Result<()> {
    if values.len() != robot.num_joints() {
        return Err(DynamicsError::length_mismatch(context, robot.num_joints(), values.len()));
    }
    for (joint, &value) in robot.joints().iter().zip(values) {
        graph.add(PriorFactor::new(key(joint.id()), value, noise.clone()));
    }
    Ok(())
}

// ============================================================================
// Initial values
// ============================================================================

/// Rest poses, zero motion, zero wrenches and zero joint quantities at step `t`.
pub fn zero_values(robot: &Robot, t: u64, contacts: Option<&ContactPoints>) -> Result<Values> {
    check_time(t)?;
    let mut values = Values::new();
    for link in robot.links() {
        let i = link.id();
        let pose = if link.is_fixed() { *link.fixed_pose() } else { link.w_t_com() };
        values.insert(pose_key(i, t), pose)?;
        values.insert(twist_key(i, t), SpatialVector::zeros())?;
        values.insert(twist_accel_key(i, t), SpatialVector::zeros())?;
    }
    for joint in robot.joints() {
        let j = joint.id();
        values.insert(wrench_key(joint.parent(), j, t), SpatialVector::zeros())?;
        values.insert(wrench_key(joint.child(), j, t), SpatialVector::zeros())?;
        values.insert(joint_angle_key(j, t), 0.0)?;
        values.insert(joint_vel_key(j, t), 0.0)?;
        values.insert(joint_accel_key(j, t), 0.0)?;
        values.insert(torque_key(j, t), 0.0)?;
    }
    if let Some(contacts) = contacts {
        for (name, cp) in contacts.iter() {
            let link = robot.link(name)?;
            let pose = if link.is_fixed() { *link.fixed_pose() } else { link.w_t_com() };
            values.insert(contact_pose_key(link.id(), cp.id(), t), pose * cp.com_t_contact())?;
        }
    }
    Ok(values)
}

/// [`zero_values`] at every step of a trajectory, plus a zero duration for
/// a variable-duration phase.
pub fn zero_values_trajectory(
    robot: &Robot,
    config: &TrajectoryConfig,
    contacts: Option<&ContactPoints>,
) -> Result<Values> {
    check_time(config.num_steps)?;
    let mut values = Values::new();
    for t in 0..=config.num_steps {
        values.extend(&zero_values(robot, t, contacts)?)?;
    }
    if let TimeStep::Variable { phase } = config.time_step {
        check_time(phase)?;
        values.insert(time_key(phase), 0.0)?;
    }
    Ok(values)
}

// ============================================================================
// Accessors
// ============================================================================

fn joint_scalars(
    robot: &Robot,
    values: &Values,
    t: u64,
    key: impl Fn(JointId) -> Key,
) -> Result<Vec<f64>> {
    check_time(t)?;
    robot
        .joints()
        .iter()
        .map(|joint| Ok(values.scalar(key(joint.id()))?))
        .collect()
}

/// Joint coordinates at step `t`, in joint id order.
pub fn joint_angles(robot: &Robot, values: &Values, t: u64) -> Result<Vec<f64>> {
    joint_scalars(robot, values, t, |j| joint_angle_key(j, t))
}

/// Joint velocities at step `t`, in joint id order.
pub fn joint_vels(robot: &Robot, values: &Values, t: u64) -> Result<Vec<f64>> {
    joint_scalars(robot, values, t, |j| joint_vel_key(j, t))
}

/// Joint accelerations at step `t`, in joint id order.
pub fn joint_accels(robot: &Robot, values: &Values, t: u64) -> Result<Vec<f64>> {
    joint_scalars(robot, values, t, |j| joint_accel_key(j, t))
}

/// Joint torques at step `t`, in joint id order.
pub fn joint_torques(robot: &Robot, values: &Values, t: u64) -> Result<Vec<f64>> {
    joint_scalars(robot, values, t, |j| torque_key(j, t))
}
