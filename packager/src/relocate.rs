//! Gathering artefacts into the dist directory.
//!
//! The build frontend writes skinny artefacts to the skinny subdirectory's
//! own `dist/`. They are moved into the canonical dist directory so that
//! every variant leaves its output in the same place.

use crate::error::{PackagerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io::ErrorKind;

/// Creates the dist directory if it does not exist and returns its path.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dist_dir(project_root: &Utf8Path, dist_dir: &Utf8Path) -> Result<Utf8PathBuf> {
    let path = project_root.join(dist_dir);
    fs::create_dir_all(&path)?;
    Ok(path)
}

/// Moves every entry of `source_dir` into `dist_dir`.
///
/// An entry already present in `dist_dir` under the same name is replaced.
/// A missing `source_dir` moves nothing. Returns the destination paths,
/// sorted by name.
///
/// # Errors
///
/// Returns [`PackagerError::Relocation`] if an entry cannot be moved or an
/// existing destination cannot be replaced.
pub fn relocate_artifacts(source_dir: &Utf8Path, dist_dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    let entries = match source_dir.read_dir_utf8() {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::debug!("{source_dir} does not exist; nothing to relocate");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut sources: Vec<Utf8PathBuf> = entries
        .map(|entry| entry.map(|e| e.into_path()))
        .collect::<std::io::Result<_>>()?;
    sources.sort();

    let mut moved = Vec::with_capacity(sources.len());
    for source in sources {
        let Some(name) = source.file_name() else {
            continue;
        };
        let destination = dist_dir.join(name);
        move_replacing(&source, &destination)?;
        log::debug!("moved {source} to {destination}");
        moved.push(destination);
    }

    Ok(moved)
}

fn move_replacing(from: &Utf8Path, to: &Utf8Path) -> Result<()> {
    let relocation_error = |source| PackagerError::Relocation {
        from: from.to_owned(),
        to: to.to_owned(),
        source,
    };

    match to.symlink_metadata() {
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(to).map_err(relocation_error)?,
        Ok(_) => fs::remove_file(to).map_err(relocation_error)?,
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(relocation_error(e)),
    }

    fs::rename(from, to).map_err(relocation_error)
}
