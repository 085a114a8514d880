//! Core types for constraint-graph multibody dynamics.
//!
//! This crate provides the plain-data vocabulary shared by the factor-graph
//! engine and the dynamics layer:
//!
//! - [`LinkId`] / [`JointId`] - Arena handles for links and joints
//! - [`JointType`] / [`EffortType`] - Joint classification tags
//! - [`JointLimits`] - Angle, velocity, acceleration and torque bounds
//! - [`Gravity`] / [`PlanarAxis`] - Environment vectors passed into graph assembly
//! - [`CollocationScheme`] / [`TimeStep`] - Time discretization settings
//!
//! # Layer 0
//!
//! Types here are **pure data**. They carry no factors, no optimizer and no
//! topology logic, so they can be shared by every layer above.
//!
//! # Example
//!
//! ```
//! use sim_types::{Gravity, JointLimits, LinkId};
//!
//! let gravity = Gravity::custom(nalgebra::Vector3::new(0.0, -9.8, 0.0));
//! assert_eq!(gravity.acceleration.y, -9.8);
//!
//! let limits = JointLimits::default().with_angle(-1.0, 1.0);
//! assert!(limits.angle_in_range(0.5));
//! assert_eq!(LinkId::new(3).raw(), 3);
//! ```

#![doc(html_root_url = "https://docs.rs/sim-types/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::missing_errors_doc,        // Error docs added where non-obvious
)]

mod config;
mod dynamics;
mod error;
mod joint;

pub use config::{CollocationScheme, TimeStep, TrajectoryConfig};
pub use dynamics::{Gravity, PlanarAxis};
pub use error::SimError;
pub use joint::{EffortType, JointId, JointLimits, JointType, LinkId};

/// Result type for simulation type validation.
pub type Result<T> = std::result::Result<T, SimError>;
