//! Removal of stale build outputs.
//!
//! Previous builds leave `build/`, `dist/`, and egg-info directories behind.
//! They are removed before every build so that the dist directory only ever
//! holds the artefacts of the current run.

use crate::error::{PackagerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io::ErrorKind;

/// Removes each of `paths` (relative to `project_root`) that exists.
///
/// Files and symlinks are unlinked; directories are removed recursively.
/// Missing paths are skipped. Returns the paths that were removed.
///
/// # Errors
///
/// Returns [`PackagerError::Cleanup`] for any removal failure other than the
/// path being absent.
pub fn remove_build_outputs(
    project_root: &Utf8Path,
    paths: &[Utf8PathBuf],
) -> Result<Vec<Utf8PathBuf>> {
    let mut removed = Vec::new();

    for relative in paths {
        let path = project_root.join(relative);
        if remove_path(&path)? {
            log::debug!("removed {path}");
            removed.push(path);
        } else {
            log::trace!("skipping {path}: not present");
        }
    }

    Ok(removed)
}

/// Returns the paths among `paths` that currently exist under `project_root`.
#[must_use]
pub fn existing_outputs(project_root: &Utf8Path, paths: &[Utf8PathBuf]) -> Vec<Utf8PathBuf> {
    paths
        .iter()
        .map(|relative| project_root.join(relative))
        .filter(|path| path.symlink_metadata().is_ok())
        .collect()
}

/// Removes a single path, returning `false` when it did not exist.
fn remove_path(path: &Utf8Path) -> Result<bool> {
    // symlink_metadata so a symlinked directory is unlinked, not traversed.
    let metadata = match path.symlink_metadata() {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(source) => {
            return Err(PackagerError::Cleanup {
                path: path.to_owned(),
                source,
            });
        }
    };

    let outcome = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match outcome {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(PackagerError::Cleanup {
            path: path.to_owned(),
            source,
        }),
    }
}
