//! Error types for topology and configuration validation.

use thiserror::Error;

/// Errors raised while validating plain simulation types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// Invalid link ID referenced.
    #[error("invalid link ID: {0}")]
    InvalidLinkId(u64),

    /// Invalid joint ID referenced.
    #[error("invalid joint ID: {0}")]
    InvalidJointId(u64),

    /// Invalid timestep.
    #[error("invalid timestep: {0} (must be positive and finite)")]
    InvalidTimestep(f64),

    /// Joint limits with an empty range.
    #[error("invalid limits for {quantity}: lower {lower} exceeds upper {upper}")]
    InvalidLimits {
        /// Which limited quantity is malformed.
        quantity: &'static str,
        /// Lower bound.
        lower: f64,
        /// Upper bound.
        upper: f64,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },
}

impl SimError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimError::InvalidLinkId(42);
        assert!(err.to_string().contains("42"));

        let err = SimError::InvalidLimits {
            quantity: "angle",
            lower: 1.0,
            upper: -1.0,
        };
        assert!(err.to_string().contains("angle"));

        let err = SimError::invalid_config("negative steps");
        assert!(err.to_string().contains("negative steps"));
        assert!(err.is_config_error());
        assert!(!SimError::InvalidTimestep(0.0).is_config_error());
    }
}
