//! Abstraction for running external commands.
//!
//! The pipeline shells out twice: once to the Python build frontend and once
//! to git to restore tracked files. Both go through [`CommandExecutor`] so
//! tests can observe the working tree at the moment a command runs.

use crate::error::{PackagerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;
use std::process::{Command, ExitStatus};
use std::time::Duration;
use wait_timeout::ChildExt;

/// A fully described external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Pipeline step name used in error messages.
    pub step: &'static str,
    /// Program to execute.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<String>,
    /// Working directory for the child process.
    pub cwd: Utf8PathBuf,
    /// Upper bound on the run time, if any.
    pub timeout: Option<Duration>,
}

impl Invocation {
    /// Create an invocation without a timeout.
    #[must_use]
    pub fn new<I, S>(step: &'static str, program: impl Into<String>, args: I, cwd: &Utf8Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            step,
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: cwd.to_owned(),
            timeout: None,
        }
    }

    /// Attach a timeout to the invocation.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns `true` if the invocation runs `program` with exactly `args`.
    #[must_use]
    pub fn matches(&self, program: &str, args: &[&str]) -> bool {
        self.program == program && self.args.iter().map(String::as_str).eq(args.iter().copied())
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs the invocation to completion and returns its exit status.
    ///
    /// Standard streams are inherited so the user sees the tool's output.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::CommandSpawn`] if the program cannot be
    /// started and [`PackagerError::CommandTimedOut`] if the timeout elapses.
    fn run(&self, invocation: &Invocation) -> Result<ExitStatus>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, invocation: &Invocation) -> Result<ExitStatus> {
        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(invocation.cwd.as_std_path())
            .spawn()
            .map_err(|source| PackagerError::CommandSpawn {
                step: invocation.step,
                command: invocation.to_string(),
                source,
            })?;

        let Some(timeout) = invocation.timeout else {
            return Ok(child.wait()?);
        };

        match child.wait_timeout(timeout)? {
            Some(status) => Ok(status),
            None => {
                // Timeout - kill the process
                let _ = child.kill();
                let _ = child.wait();
                Err(PackagerError::CommandTimedOut {
                    step: invocation.step,
                    command: invocation.to_string(),
                    seconds: timeout.as_secs(),
                })
            }
        }
    }
}

/// Runs the invocation and treats a non-zero exit as an error.
///
/// # Errors
///
/// Returns [`PackagerError::CommandFailed`] when the command exits
/// unsuccessfully, or any error raised by the executor.
pub fn run_checked(executor: &dyn CommandExecutor, invocation: &Invocation) -> Result<()> {
    log::debug!("running `{invocation}` in {}", invocation.cwd);
    let status = executor.run(invocation)?;

    if !status.success() {
        return Err(PackagerError::CommandFailed {
            step: invocation.step,
            command: invocation.to_string(),
            status,
        });
    }

    Ok(())
}
