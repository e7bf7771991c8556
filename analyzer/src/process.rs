//! Launching the external analyzer process.
//!
//! [`ProcessLauncher`] is the seam between analyzer sessions and the OS. The
//! production implementation spawns through tokio; tests script the output.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::LaunchError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Captured output of a process that started and exited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` if terminated by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

pub type LaunchFut = Pin<Box<dyn Future<Output = Result<ProcessOutput, LaunchError>> + Send>>;

/// Runs `command args...` to completion and captures both output streams.
pub trait ProcessLauncher: Send + Sync {
    fn launch(&self, command: &str, args: Vec<String>) -> LaunchFut;

    /// Directory the analyzer runs in, if not the current one.
    fn working_dir(&self) -> Option<&Path> {
        None
    }
}

/// Spawns the analyzer with `tokio::process`.
///
/// Bare command names are looked up on `PATH`. The child is killed if it
/// outlives the timeout.
#[derive(Debug, Clone)]
pub struct TokioLauncher {
    timeout: Duration,
    working_dir: Option<PathBuf>,
}

impl TokioLauncher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            working_dir: None,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the analyzer from `dir`. Relative paths in its output are relative
    /// to this directory.
    #[must_use]
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }
}

impl Default for TokioLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessLauncher for TokioLauncher {
    fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    fn launch(&self, command: &str, args: Vec<String>) -> LaunchFut {
        let command = command.to_string();
        let timeout = self.timeout;
        let working_dir = self.working_dir.clone();

        Box::pin(async move {
            let program = which::which(&command).map_err(|source| LaunchError::NotFound {
                command: command.clone(),
                source,
            })?;

            let mut cmd = Command::new(&program);
            cmd.args(&args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);
            if let Some(dir) = &working_dir {
                cmd.current_dir(dir);
            }

            tracing::trace!(program = %program.display(), ?args, "Spawning analyzer");
            let child = cmd.spawn().map_err(|source| LaunchError::Spawn {
                command: command.clone(),
                source,
            })?;

            // Dropping the future on timeout drops the child, which kills it.
            let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(Ok(output)) => output,
                Ok(Err(source)) => return Err(LaunchError::Spawn { command, source }),
                Err(_) => {
                    return Err(LaunchError::TimedOut {
                        command,
                        secs: timeout.as_secs(),
                    });
                }
            };

            Ok(ProcessOutput {
                status: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        })
    }
}
