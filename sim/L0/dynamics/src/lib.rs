//! Robot topology and dynamics factor-graph assembly.
//!
//! This crate turns a rigid multibody robot into constraint factors over
//! time-indexed physical quantities:
//!
//! - [`RobotBuilder`] / [`Robot`] - Link and joint arena with name lookups
//! - [`Joint`] / [`JointKind`] - Screw-axis kinematics and per-joint factors
//! - [`keys`] - Packed variable keys for poses, twists, wrenches, torques, ...
//! - [`DynamicsGraph`] - Dynamics, kinematics, trajectory and contact graphs
//! - [`CostModels`] - Noise model of each constraint family
//! - [`initialize_solution`] - Initial guesses for trajectory optimization
//! - [`models`] - Small reference robots
//!
//! The graphs are plain [`sim_factor_graph::FactorGraph`]s. Solve them with
//! [`sim_factor_graph::LevenbergMarquardtOptimizer`] when every factor is
//! soft, or with [`sim_factor_graph::ManifoldOptimizer`] to treat the hard
//! physical laws as constraint manifolds.
//!
//! # Example
//!
//! ```
//! use sim_dynamics::{models, zero_values, CostModels, DynamicsGraph};
//! use sim_types::{Gravity, PlanarAxis};
//!
//! let robot = models::simple_rr().unwrap();
//! let graph = DynamicsGraph::new(CostModels::default(), Gravity::zero(), Some(PlanarAxis::Z));
//! let factors = graph.dynamics_factor_graph(&robot, 0, None).unwrap();
//!
//! // At rest with no gravity and no torque every law is satisfied.
//! let values = zero_values(&robot, 0, None).unwrap();
//! assert!(factors.error(&values).unwrap() < 1e-12);
//! ```

#![doc(html_root_url = "https://docs.rs/sim-dynamics/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::missing_errors_doc,        // Error docs added where non-obvious
    clippy::many_single_char_names,    // Math notation
    clippy::similar_names,             // q/qdot, i1/i2 style variable pairs
)]

mod contact;
mod cost_models;
mod dynamics_graph;
mod error;
pub mod factors;
mod initialize;
mod joint;
pub mod keys;
mod link;
pub mod models;
mod robot;

pub use contact::{ContactPoint, ContactPoints};
pub use cost_models::CostModels;
pub use dynamics_graph::{
    joint_accels, joint_angles, joint_torques, joint_vels, zero_values, zero_values_trajectory,
    ContactInterval, DynamicsGraph,
};
pub use error::DynamicsError;
pub use initialize::{
    initialize_solution, initialize_solution_interpolation,
    initialize_solution_interpolation_multi_phase, InitializationTechnique, PoseInterpolation,
};
pub use joint::{Joint, JointKind, JointParams, ScrewMotion};
pub use link::{Link, LinkParams};
pub use robot::{Robot, RobotBuilder};

/// Result type for topology and graph assembly.
pub type Result<T> = std::result::Result<T, DynamicsError>;
