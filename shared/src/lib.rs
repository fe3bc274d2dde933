//! tcsignal Shared Signal Contract
//!
//! This crate provides the consumer-facing signal types, the message
//! attribute codec and the dispatch flow state machine shared between the
//! instance-side agent and anything that reads signals off the queue.

pub mod codec;
pub mod state_machine;

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Message attribute names published with every signal
pub mod attributes {
    /// Caller-supplied deployment/signal token
    pub const SIGNAL_ID: &str = "signal_id";

    /// Resolved instance identifier
    pub const INSTANCE_ID: &str = "instance_id";

    /// `SUCCESS` or `FAILURE`
    pub const STATUS: &str = "status";

    /// Data type used for all attributes
    pub const DATA_TYPE: &str = "String";
}

/// Fixed message body. All meaning lives in the attributes.
pub const MESSAGE_BODY: &str = "tcons-signal message";

/// Default values for the invocation
pub mod defaults {
    use std::time::Duration;

    /// Transient-error retries handed to the publisher
    pub const RETRIES: u32 = 3;

    /// Budget for a single publish call, including internal retries
    pub const PUBLISH_TIMEOUT: Duration = Duration::from_secs(10);

    /// Budget for the entire run
    pub const OVERALL_TIMEOUT: Duration = Duration::from_secs(30);

    /// Attempts per metadata lookup, first try included
    pub const METADATA_MAX_ATTEMPTS: u32 = 4;

    /// IMDSv2 session token lifetime in seconds
    pub const METADATA_TOKEN_TTL_SECS: u32 = 21600;

    /// Per-request timeout for metadata lookups
    pub const METADATA_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);
}

/// Process exit codes - the contract with the orchestrator
pub mod exit_code {
    /// Command (or explicit status) succeeded and the signal was published
    pub const OK: i32 = 0;

    /// Command failed and a FAILURE signal was published
    pub const COMMAND_FAILED: i32 = 1;

    /// Configuration, identity or publish failure
    pub const INFRA_FAILURE: i32 = 2;
}

/// Outcome reported in a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success,
    Failure,
}

impl Status {
    /// Wire spelling of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "SUCCESS",
            Status::Failure => "FAILURE",
        }
    }

    /// Status derived from a command exit code
    pub fn from_exit_code(code: i32) -> Self {
        if code == 0 {
            Status::Success
        } else {
            Status::Failure
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status string is neither SUCCESS nor FAILURE
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("status must be either SUCCESS or FAILURE, got {0:?}")]
pub struct StatusParseError(pub String);

impl FromStr for Status {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(Status::Success),
            "FAILURE" => Ok(Status::Failure),
            other => Err(StatusParseError(other.to_string())),
        }
    }
}

/// A single structured outcome report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalMessage {
    pub signal_id: String,
    pub instance_id: String,
    pub status: Status,
}

impl SignalMessage {
    /// Create a new signal message
    pub fn new(
        signal_id: impl Into<String>,
        instance_id: impl Into<String>,
        status: Status,
    ) -> Self {
        Self {
            signal_id: signal_id.into(),
            instance_id: instance_id.into(),
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!("SUCCESS".parse::<Status>(), Ok(Status::Success));
        assert_eq!("FAILURE".parse::<Status>(), Ok(Status::Failure));
        assert!("success".parse::<Status>().is_err());
        assert!("".parse::<Status>().is_err());
    }

    #[test]
    fn test_status_from_exit_code() {
        assert_eq!(Status::from_exit_code(0), Status::Success);
        assert_eq!(Status::from_exit_code(1), Status::Failure);
        assert_eq!(Status::from_exit_code(-1), Status::Failure);
        assert_eq!(Status::from_exit_code(255), Status::Failure);
    }

    #[test]
    fn test_signal_creation() {
        let signal = SignalMessage::new("deploy-1", "i-abc", Status::Success);
        assert_eq!(signal.signal_id, "deploy-1");
        assert_eq!(signal.instance_id, "i-abc");
        assert_eq!(signal.status.to_string(), "SUCCESS");
    }
}
