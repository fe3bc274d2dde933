//! Command execution for status detection
//!
//! This module handles:
//! - Running the readiness command through the shell
//! - Reporting the child's exit code
//! - Separating launch failures from command failures

mod executor;

pub use executor::{CommandExecutor, ExecError, ShellExecutor};
