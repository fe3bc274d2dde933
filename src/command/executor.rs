//! Command executor - runs a shell command line and reports its exit code

use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Shell used when none is configured
pub const DEFAULT_SHELL: &str = "sh";

/// The shell could not be started or waited on.
///
/// A command that runs and exits non-zero is not an error.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("failed to launch {shell}: {source}")]
    Launch {
        shell: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for {shell}: {source}")]
    Wait {
        shell: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runs a full command line and returns the child's exit code
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `command_line` to completion
    async fn run(&self, command_line: &str) -> Result<i32, ExecError>;
}

/// Executes command lines with `<shell> -c`, streaming output to our stdio
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: String,
}

impl ShellExecutor {
    /// Create an executor using `sh`
    pub fn new() -> Self {
        Self::with_shell(DEFAULT_SHELL)
    }

    /// Create an executor using a specific shell binary
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn run(&self, command_line: &str) -> Result<i32, ExecError> {
        debug!("Executing command: {}", command_line);

        // kill_on_drop: if the caller stops waiting (overall timeout), the
        // shell is killed. Grandchildren it spawned are not.
        let mut child = Command::new(&self.shell)
            .arg("-c")
            .arg(command_line)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecError::Launch {
                shell: self.shell.clone(),
                source,
            })?;

        let status = child.wait().await.map_err(|source| ExecError::Wait {
            shell: self.shell.clone(),
            source,
        })?;

        let code = exit_code(status);
        debug!("Command exited with code {}", code);
        Ok(code)
    }
}

/// Exit code of a finished child, using the shell's `128 + signal` convention
/// for children killed by a signal
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}
