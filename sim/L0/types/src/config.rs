//! Time-discretization configuration for trajectory graphs.
//!
//! A trajectory is a sequence of `num_steps + 1` time-indexed copies of the
//! single-step dynamics graph, linked by collocation factors.

use crate::error::SimError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Integration rule linking joint quantities at consecutive steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CollocationScheme {
    /// Explicit Euler: `q1 = q0 + dt v0`, `v1 = v0 + dt a0`.
    #[default]
    Euler,
    /// Trapezoidal: `q1 = q0 + dt (v0 + v1) / 2`, `v1 = v0 + dt (a0 + a1) / 2`.
    Trapezoidal,
}

/// Duration of one trajectory step.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TimeStep {
    /// Known constant duration (seconds).
    Fixed(f64),
    /// Duration is an unknown shared by all steps of a phase.
    Variable {
        /// Phase index the duration variable belongs to.
        phase: u64,
    },
}

impl TimeStep {
    /// Validate a fixed duration.
    pub fn validate(self) -> Result<(), SimError> {
        match self {
            Self::Fixed(dt) if !(dt.is_finite() && dt > 0.0) => Err(SimError::InvalidTimestep(dt)),
            _ => Ok(()),
        }
    }
}

impl Default for TimeStep {
    fn default() -> Self {
        Self::Fixed(0.01)
    }
}

/// Configuration of a trajectory graph.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrajectoryConfig {
    /// Number of steps (the trajectory has `num_steps + 1` time indices).
    pub num_steps: u64,
    /// Step duration.
    pub time_step: TimeStep,
    /// Integration rule.
    pub scheme: CollocationScheme,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            num_steps: 10,
            time_step: TimeStep::default(),
            scheme: CollocationScheme::default(),
        }
    }
}

impl TrajectoryConfig {
    /// Create a configuration with the given number of fixed-duration steps.
    #[must_use]
    pub fn new(num_steps: u64, dt: f64) -> Self {
        Self {
            num_steps,
            time_step: TimeStep::Fixed(dt),
            ..Default::default()
        }
    }

    /// Set the integration rule.
    #[must_use]
    pub fn with_scheme(mut self, scheme: CollocationScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Treat the step duration as a free variable of the given phase.
    #[must_use]
    pub fn with_variable_time(mut self, phase: u64) -> Self {
        self.time_step = TimeStep::Variable { phase };
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.num_steps == 0 {
            return Err(SimError::invalid_config("trajectory needs at least one step"));
        }
        self.time_step.validate()
    }
}
