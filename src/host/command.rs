//! Subprocess builder with critical and advisory execution.
//!
//! Every external program instllr runs (dependency version checks, install steps, `id`,
//! `useradd`, `systemctl`) goes through [`SystemCommand`]. How a failure is treated is
//! chosen at the call site by the execution method:
//!
//! - [`SystemCommand::execute`] is a **critical** operation. A spawn failure or non-zero exit
//!   becomes an [`InstllrError::CommandFailed`] and aborts the pipeline.
//! - [`SystemCommand::execute_advisory`] is an **advisory** operation. It never returns an
//!   error; the [`Advisory`] outcome is logged with `warn!` on failure and the caller moves on.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::core::InstllrError;

/// Builder for one subprocess invocation.
///
/// ```rust,no_run
/// use instllr::host::SystemCommand;
///
/// # async fn example() -> anyhow::Result<()> {
/// let output = SystemCommand::new("node").arg("--version").execute().await?;
/// println!("node {}", output.stdout.trim());
///
/// SystemCommand::new("systemctl").args(["stop", "api"]).execute_advisory().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SystemCommand {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    capture_output: bool,
    env_vars: Vec<(String, OsString)>,
    context: Option<String>,
}

/// Captured output of a successful command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

/// Outcome of an advisory operation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Advisory {
    /// The command ran and exited zero
    Succeeded,
    /// The command could not run or exited non-zero; already logged
    Failed {
        /// Command line
        command: String,
        /// What went wrong
        reason: String,
    },
}

impl Advisory {
    /// Whether the operation succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl SystemCommand {
    /// Start building an invocation of `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            capture_output: true,
            env_vars: Vec::new(),
            context: None,
        }
    }

    /// Build from a full argv (`argv[0]` is the program).
    ///
    /// # Errors
    ///
    /// Returns an error if `argv` is empty.
    pub fn from_argv(argv: &[String]) -> Result<Self> {
        let (program, args) =
            argv.split_first().ok_or_else(|| anyhow::anyhow!("Cannot run an empty command"))?;
        Ok(Self::new(program.clone()).args(args.iter().cloned()))
    }

    /// Add one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run in `dir` instead of the current directory.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Set an environment variable for the child.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    /// Let the child write straight to our stdout/stderr.
    pub const fn inherit_stdio(mut self) -> Self {
        self.capture_output = false;
        self
    }

    /// Label log lines with a context, e.g. the dependency being checked.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Run as a critical operation.
    ///
    /// With inherited stdio the returned output is empty.
    ///
    /// # Errors
    ///
    /// Returns [`InstllrError::CommandFailed`] if the program cannot be spawned or exits
    /// non-zero.
    pub async fn execute(self) -> Result<CommandOutput> {
        let command_line = self.to_string();
        match &self.context {
            Some(ctx) => tracing::debug!(target: "cmd", "({ctx}) Executing command: {command_line}"),
            None => tracing::debug!(target: "cmd", "Executing command: {command_line}"),
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.env_vars {
            tracing::trace!(target: "cmd", "Setting env var: {key}");
            cmd.env(key, value);
        }

        if self.capture_output {
            cmd.stdout(Stdio::piped());
            cmd.stderr(Stdio::piped());
        } else {
            cmd.stdout(Stdio::inherit());
            cmd.stderr(Stdio::inherit());
        }

        let output = cmd.output().await.map_err(|e| InstllrError::CommandFailed {
            command: command_line.clone(),
            status: format!("failed to start: {e}"),
            stderr: String::new(),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            tracing::debug!(target: "cmd", "Command failed with {}", output.status);
            if !stderr.is_empty() {
                tracing::debug!(target: "cmd", "Error: {}", stderr.trim());
            }
            return Err(InstllrError::CommandFailed {
                command: command_line,
                status: output.status.to_string(),
                stderr,
            }
            .into());
        }

        if !stdout.is_empty() {
            tracing::debug!(target: "cmd", "{}", stdout.trim());
        }

        Ok(CommandOutput {
            stdout,
            stderr,
        })
    }

    /// Run as an advisory operation: failures are logged, never propagated.
    pub async fn execute_advisory(self) -> Advisory {
        let command_line = self.to_string();
        match self.execute().await {
            Ok(_) => Advisory::Succeeded,
            Err(e) => {
                let reason = match e.downcast_ref::<InstllrError>() {
                    Some(InstllrError::CommandFailed {
                        status,
                        stderr,
                        ..
                    }) if !stderr.trim().is_empty() => format!("{status}: {}", stderr.trim()),
                    Some(InstllrError::CommandFailed {
                        status,
                        ..
                    }) => status.clone(),
                    _ => e.to_string(),
                };
                tracing::warn!("{command_line} failed ({reason}), continuing");
                Advisory::Failed {
                    command: command_line,
                    reason,
                }
            }
        }
    }

    /// Run and return trimmed stdout.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute).
    pub async fn output_trimmed(self) -> Result<String> {
        let program = self.program.clone();
        let output =
            self.execute().await.with_context(|| format!("Failed to run {program}"))?;
        Ok(output.stdout.trim().to_string())
    }
}

impl fmt::Display for SystemCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
