//! Guaranteed restoration of tracked files.
//!
//! Release builds overwrite the primary manifest, and the build frontend may
//! touch the readme. [`RestoreGuard`] runs `git restore` on those files when
//! the build scope ends, whether it ends by returning, by returning an error,
//! or by unwinding from a panic.

use crate::error::Result;
use crate::executor::{CommandExecutor, Invocation, run_checked};
use camino::{Utf8Path, Utf8PathBuf};
use std::time::Duration;

/// Builds the `git restore` invocation for `files`.
#[must_use]
pub fn restore_invocation(
    project_root: &Utf8Path,
    files: &[Utf8PathBuf],
    timeout: Duration,
) -> Invocation {
    let args = std::iter::once("restore".to_owned()).chain(files.iter().map(ToString::to_string));
    Invocation::new("restore", "git", args, project_root).with_timeout(timeout)
}

/// Restores tracked files when dropped.
///
/// Call [`RestoreGuard::restore`] on the normal path to observe the outcome.
/// If the guard is dropped without it, typically while unwinding, the restore
/// still runs and a failure is logged.
#[must_use = "dropping the guard immediately restores the files"]
pub struct RestoreGuard<'a> {
    executor: &'a dyn CommandExecutor,
    pending: Option<Invocation>,
}

impl<'a> RestoreGuard<'a> {
    /// Arms a guard that will restore `files` in `project_root`.
    pub fn new(
        executor: &'a dyn CommandExecutor,
        project_root: &Utf8Path,
        files: &[Utf8PathBuf],
        timeout: Duration,
    ) -> Self {
        Self {
            executor,
            pending: Some(restore_invocation(project_root, files, timeout)),
        }
    }

    /// Runs the restore now and disarms the guard.
    ///
    /// # Errors
    ///
    /// Returns an error if `git` cannot be started, exits unsuccessfully, or
    /// times out.
    pub fn restore(mut self) -> Result<()> {
        match self.pending.take() {
            Some(invocation) => run_checked(self.executor, &invocation),
            None => Ok(()),
        }
    }
}

impl Drop for RestoreGuard<'_> {
    fn drop(&mut self) {
        if let Some(invocation) = self.pending.take() {
            if let Err(err) = run_checked(self.executor, &invocation) {
                log::error!("failed to restore tracked files: {err}");
            }
        }
    }
}

/// Runs `body` inside a restore scope.
///
/// The files are restored after `body` finishes, on every exit path. When
/// both `body` and the restore fail, the error from `body` is returned and
/// the restore failure is logged.
///
/// # Errors
///
/// Returns the error from `body`, or the restore error if only the restore
/// failed.
pub fn with_restored_files<T, F>(guard: RestoreGuard<'_>, body: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let outcome = body();
    let restored = guard.restore();

    match (outcome, restored) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(restore_err)) => Err(restore_err),
        (Err(body_err), Ok(())) => Err(body_err),
        (Err(body_err), Err(restore_err)) => {
            log::error!("failed to restore tracked files: {restore_err}");
            Err(body_err)
        }
    }
}
