//! Child process execution with timeout and output capture.

use std::ffi::OsStr;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

use cubby_core::config::tools::ToolsConfig;
use cubby_core::error::{AppError, ErrorKind};

/// Longest diagnostic output carried in an error.
const MAX_DIAGNOSTIC_CHARS: usize = 2000;

/// Errors from running an external tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The binary could not be found.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// The tool ran past the configured timeout and was killed.
    #[error("{program} timed out after {seconds} seconds")]
    Timeout {
        /// Binary name.
        program: String,
        /// Configured timeout.
        seconds: u64,
    },

    /// The tool exited unsuccessfully.
    #[error("{program} failed with exit code {code}: {diagnostics}")]
    Failed {
        /// Binary name.
        program: String,
        /// Exit code, `-1` when killed by a signal.
        code: i32,
        /// Captured stderr followed by stdout.
        diagnostics: String,
    },

    /// Spawning or waiting on the process failed.
    #[error("I/O error running tool: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ToolError> for AppError {
    fn from(err: ToolError) -> Self {
        AppError::with_source(ErrorKind::External, err.to_string(), err)
    }
}

/// Captured output of a successful run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Standard output, lossily decoded.
    pub stdout: String,
    /// Standard error, lossily decoded.
    pub stderr: String,
}

/// Runs external tools with a shared timeout.
#[derive(Debug, Clone)]
pub struct ToolRunner {
    timeout: Duration,
}

impl ToolRunner {
    /// Create a runner that kills tools after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Create a runner from tool configuration.
    pub fn from_config(config: &ToolsConfig) -> Self {
        Self::new(Duration::from_secs(config.timeout_seconds))
    }

    /// Run `program` with `args`, failing on a non-zero exit status.
    pub async fn run<I, S>(&self, program: &str, args: I) -> Result<ToolOutput, ToolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(program, "Running external tool");

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ToolError::NotFound(program.to_string()));
            }
            Ok(Err(e)) => return Err(ToolError::Io(e)),
            Err(_) => {
                warn!(program, seconds = self.timeout.as_secs(), "External tool timed out");
                return Err(ToolError::Timeout {
                    program: program.to_string(),
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let diagnostics: String = format!("{}\n{}", stderr.trim(), stdout.trim())
                .trim()
                .chars()
                .take(MAX_DIAGNOSTIC_CHARS)
                .collect();
            warn!(program, code, "External tool failed");
            return Err(ToolError::Failed {
                program: program.to_string(),
                code,
                diagnostics,
            });
        }

        Ok(ToolOutput { stdout, stderr })
    }
}
