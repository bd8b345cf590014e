//! Health probes
//!
//! A probe runs an external check and reports how it ended. Probe failures,
//! including a command that cannot be started or that runs past its
//! timeout, are ordinary outcomes rather than errors.

use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;

/// How a probe run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Process exited; signal-terminated processes report -1
    Exited(i32),
    /// Process was still running when the timeout expired
    TimedOut,
    /// Process could not be started
    LaunchFailed(String),
}

impl ProbeOutcome {
    /// Only a zero exit code counts as success
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Exited(0))
    }

    /// Get the exit code, if the process exited
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProbeOutcome::Exited(code) => Some(*code),
            _ => None,
        }
    }

    /// Check if the run hit its timeout
    pub fn timed_out(&self) -> bool {
        matches!(self, ProbeOutcome::TimedOut)
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Exited(code) => write!(f, "exited with code {}", code),
            ProbeOutcome::TimedOut => write!(f, "timed out"),
            ProbeOutcome::LaunchFailed(reason) => write!(f, "failed to start: {}", reason),
        }
    }
}

/// External health check
#[async_trait]
pub trait Probe: Send + Sync {
    /// Run `command`, giving up once `limit` has elapsed
    async fn run(&self, command: &str, limit: Duration) -> ProbeOutcome;
}

/// Runs the probe command through a shell, e.g. `bash -c "ping -c4 host"`
#[derive(Debug, Clone)]
pub struct ShellProbe {
    shell: String,
}

impl ShellProbe {
    /// Create a probe that runs commands through bash
    pub fn new() -> Self {
        Self {
            shell: "bash".to_string(),
        }
    }

    /// Use a different shell binary
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    /// Get the shell binary
    pub fn shell(&self) -> &str {
        &self.shell
    }
}

impl Default for ShellProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for ShellProbe {
    async fn run(&self, command: &str, limit: Duration) -> ProbeOutcome {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match timeout(limit, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                tracing::debug!(shell = %self.shell, error = %e, "Probe command failed to start");
                return ProbeOutcome::LaunchFailed(e.to_string());
            }
            Err(_) => {
                tracing::debug!(command = %command, limit = ?limit, "Probe command timed out");
                return ProbeOutcome::TimedOut;
            }
        };

        tracing::trace!(
            stdout = %String::from_utf8_lossy(&output.stdout),
            stderr = %String::from_utf8_lossy(&output.stderr),
            "Probe output"
        );

        ProbeOutcome::Exited(output.status.code().unwrap_or(-1))
    }
}
