//! Signal dispatch orchestration
//!
//! This module handles:
//! - Deciding the status from the flag or the command's exit code
//! - Resolving instance ID (fatal) and region (best effort)
//! - Publishing the signal
//! - Mapping the result onto the process exit code contract

mod orchestrator;

pub use orchestrator::{FlowError, RunOutcome, SignalFlow};
