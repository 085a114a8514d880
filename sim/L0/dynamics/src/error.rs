//! Error types for topology lookups and graph assembly.

use sim_factor_graph::GraphError;
use sim_types::SimError;
use thiserror::Error;

/// Errors raised while building robots or assembling dynamics graphs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DynamicsError {
    /// A link name was not found in the robot.
    #[error("unknown link: {0}")]
    UnknownLink(String),

    /// A joint name was not found in the robot.
    #[error("unknown joint: {0}")]
    UnknownJoint(String),

    /// No contact point is attached to the named link.
    #[error("unknown contact point on link: {0}")]
    UnknownContactPoint(String),

    /// Two links share a name.
    #[error("duplicate link name: {0}")]
    DuplicateLink(String),

    /// Two joints share a name.
    #[error("duplicate joint name: {0}")]
    DuplicateJoint(String),

    /// A joint accessor was called with a link the joint does not connect.
    #[error("link {link} is not attached to joint {joint}")]
    LinkNotAttached {
        /// The link that was passed in.
        link: String,
        /// The joint that was queried.
        joint: String,
    },

    /// The wrench balance factor supports at most four incident joints.
    #[error("link {link} has {count} joints; wrench balance supports at most 4")]
    TooManyJoints {
        /// The offending link.
        link: String,
        /// Number of incident joints.
        count: usize,
    },

    /// An entity id or time index does not fit into the key packing.
    #[error("{entity} {value} exceeds the key packing bound {max}")]
    IdOutOfRange {
        /// What overflowed (`"link id"`, `"joint id"`, `"contact id"`, `"time index"`).
        entity: &'static str,
        /// The offending value.
        value: u64,
        /// Largest value that can be packed.
        max: u64,
    },

    /// An input vector has the wrong length for the robot.
    #[error("{context}: expected {expected} entries, got {actual}")]
    LengthMismatch {
        /// Which input was malformed.
        context: &'static str,
        /// Number of joints or steps expected.
        expected: usize,
        /// Number provided.
        actual: usize,
    },

    /// The requested initialization technique exists but is not implemented.
    #[error("initialization technique not implemented: {0}")]
    UnimplementedInitialization(&'static str),

    /// Factor-graph evaluation failed.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Plain-type validation failed.
    #[error(transparent)]
    Types(#[from] SimError),
}

impl DynamicsError {
    /// Create an unknown link error.
    pub fn unknown_link(name: impl Into<String>) -> Self {
        Self::UnknownLink(name.into())
    }

    /// Create an unknown joint error.
    pub fn unknown_joint(name: impl Into<String>) -> Self {
        Self::UnknownJoint(name.into())
    }

    /// Create a link-not-attached error.
    pub fn not_attached(link: impl Into<String>, joint: impl Into<String>) -> Self {
        Self::LinkNotAttached {
            link: link.into(),
            joint: joint.into(),
        }
    }

    /// Create a length mismatch error.
    pub fn length_mismatch(context: &'static str, expected: usize, actual: usize) -> Self {
        Self::LengthMismatch {
            context,
            expected,
            actual,
        }
    }

    /// Check whether this is a failed name lookup.
    #[must_use]
    pub fn is_lookup_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownLink(_) | Self::UnknownJoint(_) | Self::UnknownContactPoint(_)
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use sim_factor_graph::Key;

    #[test]
    fn test_error_display() {
        let err = DynamicsError::TooManyJoints {
            link: "hub".into(),
            count: 5,
        };
        assert_eq!(err.to_string(), "link hub has 5 joints; wrench balance supports at most 4");

        let err = DynamicsError::not_attached("l3", "j1");
        assert_eq!(err.to_string(), "link l3 is not attached to joint j1");
    }

    #[test]
    fn test_lookup_classification() {
        assert!(DynamicsError::unknown_link("foot").is_lookup_error());
        assert!(DynamicsError::unknown_joint("knee").is_lookup_error());
        assert!(!DynamicsError::length_mismatch("torques", 2, 3).is_lookup_error());
    }

    #[test]
    fn test_graph_error_conversion() {
        let err: DynamicsError = GraphError::MissingKey(Key::new(7)).into();
        assert!(matches!(err, DynamicsError::Graph(GraphError::MissingKey(_))));
    }
}
