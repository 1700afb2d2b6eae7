//! Error types for GridSwarm
//!
//! Defines one error enum covering all failure modes across the system.
//! Uses thiserror for ergonomic error handling.
//!
//! Note that most "failures" in the simulation are not errors at all: a
//! rejected send, a denied lock request, or a robot crash are expected
//! runtime outcomes surfaced as events. The variants here cover genuine
//! precondition violations and driver-level problems.

use crate::swarm::RobotId;
use thiserror::Error;

/// Result type alias for GridSwarm operations
pub type Result<T> = std::result::Result<T, GridSwarmError>;

/// Comprehensive error type for GridSwarm operations
#[derive(Error, Debug)]
pub enum GridSwarmError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Send addressed to a robot that was never registered with the mailbox
    /// registry (a programming error, fatal to the call only)
    #[error("unknown recipient: {0}")]
    UnknownRecipient(RobotId),

    /// Receive (or similar lookup) for a robot that was never registered
    #[error("unknown robot: {0}")]
    UnknownRobot(RobotId),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),

    /// Anyhow errors (for more context)
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_recipient_display() {
        let err = GridSwarmError::UnknownRecipient(RobotId(7));
        assert_eq!(err.to_string(), "unknown recipient: robot-7");
    }

    #[test]
    fn test_config_display() {
        let err = GridSwarmError::Config("robots must be at least 1".to_string());
        assert!(err.to_string().starts_with("Configuration error"));
    }
}
