//! Integration tests for the sim-* crate ecosystem.
//!
//! These tests verify end-to-end behavior of robot graphs solved by the
//! factor-graph engine:
//! - Closed-loop forward dynamics (four-bar linkage)
//! - Forward dynamics and trajectories of a pendulum
//! - Pose goals solved by least squares and by constraint manifolds
//! - Physical invariants (static equilibrium, action and reaction)
//! - Manifold charts built from robot kinematics

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

pub mod action_reaction;
pub mod four_bar;
pub mod initialization;
pub mod manifold_chart;
pub mod pendulum;
pub mod pose_goal;
pub mod static_equilibrium;
