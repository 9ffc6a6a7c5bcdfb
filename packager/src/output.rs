//! Output formatting for the packager CLI.
//!
//! Progress lines, the dry-run plan, and the closing artefact summary are
//! all written to stderr so that stdout stays free for the build frontend.

use crate::error::Result;
use crate::package_type::PackageType;
use camino::{Utf8Path, Utf8PathBuf};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Write;

/// Writes one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Size and digest of a file left in the dist directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSummary {
    /// Path to the artefact.
    pub path: Utf8PathBuf,
    /// Size in bytes.
    pub bytes: u64,
    /// Lowercase hex SHA-256 of the contents.
    pub sha256: String,
}

impl ArtifactSummary {
    /// Reads `path` and computes its size and digest.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read.
    pub fn from_path(path: &Utf8Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut hasher = Sha256::new();
        let bytes = std::io::copy(&mut file, &mut hasher)?;
        let sha256 = format!("{:x}", hasher.finalize());

        Ok(Self {
            path: path.to_owned(),
            bytes,
            sha256,
        })
    }

    /// Format the summary as a single indented line.
    #[must_use]
    pub fn display_line(&self) -> String {
        let name = self.path.file_name().unwrap_or(self.path.as_str());
        let sha_short: String = self.sha256.chars().take(12).collect();
        format!("  {name} ({} bytes, sha256={sha_short}…)", self.bytes)
    }
}

/// Summarises every regular file in `dist_dir`, sorted by name.
///
/// # Errors
///
/// Returns an I/O error if the directory or a file cannot be read.
pub fn summarize_artifacts(dist_dir: &Utf8Path) -> Result<Vec<ArtifactSummary>> {
    let mut paths = Vec::new();
    for entry in dist_dir.read_dir_utf8()? {
        let dir_entry = entry?;
        if dir_entry.file_type()?.is_file() {
            paths.push(dir_entry.into_path());
        }
    }
    paths.sort();

    paths.iter().map(|path| ArtifactSummary::from_path(path)).collect()
}

/// Format a success message after a build.
#[must_use]
pub fn success_message(package_type: PackageType, count: usize, dist_dir: &Utf8Path) -> String {
    let plural = if count == 1 { "artefact" } else { "artefacts" };
    format!("Built {package_type} package: {count} {plural} in {dist_dir}")
}

/// Plan information printed by `--dry-run`.
///
/// # Example
///
/// ```
/// use camino::Utf8PathBuf;
/// use mlflow_packager::output::DryRunInfo;
/// use mlflow_packager::package_type::PackageType;
///
/// let root = Utf8PathBuf::from("/src/mlflow");
/// let dist = root.join("dist");
/// let info = DryRunInfo {
///     project_root: &root,
///     package_type: PackageType::Release,
///     stale_outputs: &[],
///     manifest_swap: Some(("pyproject.release.toml", "pyproject.toml")),
///     build_command: "python3 -m build .",
///     restore_command: "git restore README.md pyproject.toml",
///     relocate_from: None,
///     dist_dir: &dist,
///     wheel_pattern: "mlflow*.whl",
///     build_tag: None,
/// };
///
/// let output = info.display_text();
/// assert!(output.contains("Dry run"));
/// assert!(output.contains("python3 -m build ."));
/// ```
#[derive(Debug)]
pub struct DryRunInfo<'a> {
    /// Project root the build runs in.
    pub project_root: &'a Utf8Path,
    /// Selected build variant.
    pub package_type: PackageType,
    /// Cleanup paths that currently exist and would be removed.
    pub stale_outputs: &'a [Utf8PathBuf],
    /// Template and manifest when a release swap would happen.
    pub manifest_swap: Option<(&'a str, &'a str)>,
    /// Rendered build command.
    pub build_command: &'a str,
    /// Rendered restore command.
    pub restore_command: &'a str,
    /// Directory whose entries would be moved into the dist directory.
    pub relocate_from: Option<&'a Utf8Path>,
    /// Canonical dist directory.
    pub dist_dir: &'a Utf8Path,
    /// Pattern used to find the wheel for tagging.
    pub wheel_pattern: &'a str,
    /// Build tag that would be inserted, if any.
    pub build_tag: Option<&'a str>,
}

impl DryRunInfo<'_> {
    /// Format the dry-run information for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        let mut lines = vec![
            "Dry run - no files will be modified".to_owned(),
            String::new(),
            format!("Project root: {}", self.project_root),
            format!("Package type: {}", self.package_type),
        ];

        if self.stale_outputs.is_empty() {
            lines.push("Stale outputs: none".to_owned());
        } else {
            lines.push("Stale outputs to remove:".to_owned());
            for path in self.stale_outputs {
                lines.push(format!("  - {path}"));
            }
        }

        match self.manifest_swap {
            Some((template, manifest)) => {
                lines.push(format!("Manifest: copy {template} over {manifest}"));
            }
            None => lines.push("Manifest: unchanged".to_owned()),
        }

        lines.push(format!("Build command: {}", self.build_command));
        lines.push(format!("Restore command: {}", self.restore_command));
        if let Some(source) = self.relocate_from {
            lines.push(format!("Relocate: {source}/* -> {}", self.dist_dir));
        }
        lines.push(format!("Dist directory: {}", self.dist_dir));

        match self.build_tag {
            Some(tag) => lines.push(format!("Build tag: {tag} (applied to {})", self.wheel_pattern)),
            None => lines.push("Build tag: none".to_owned()),
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeProject;
    use rstest::rstest;

    #[test]
    fn write_stderr_line_appends_newline() {
        let mut buffer = Vec::new();
        write_stderr_line(&mut buffer, "hello");
        assert_eq!(buffer, b"hello\n");
    }

    #[rstest]
    #[case::singular(1, "1 artefact in")]
    #[case::plural(2, "2 artefacts in")]
    fn success_message_pluralises_correctly(#[case] count: usize, #[case] expected: &str) {
        let msg = success_message(PackageType::Skinny, count, Utf8Path::new("/tmp/dist"));
        assert!(msg.contains(expected));
        assert!(msg.contains("skinny"));
    }

    #[test]
    fn summary_hashes_contents() {
        let project = FakeProject::new();
        project.write("dist/a.whl", "abc");

        let summaries = summarize_artifacts(&project.root().join("dist")).expect("summary");

        assert_eq!(summaries.len(), 1);
        let summary = summaries.first().expect("one summary");
        assert_eq!(summary.bytes, 3);
        assert_eq!(
            summary.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert!(summary.display_line().contains("a.whl (3 bytes, sha256=ba7816bf8f01"));
    }

    #[test]
    fn dry_run_lists_stale_outputs_and_relocation() {
        let root = Utf8PathBuf::from("/src/mlflow");
        let dist = root.join("dist");
        let skinny_dist = root.join("skinny/dist");
        let stale = vec![root.join("build")];
        let info = DryRunInfo {
            project_root: &root,
            package_type: PackageType::Skinny,
            stale_outputs: &stale,
            manifest_swap: None,
            build_command: "python3 -m build skinny",
            restore_command: "git restore README.md pyproject.toml",
            relocate_from: Some(&skinny_dist),
            dist_dir: &dist,
            wheel_pattern: "mlflow*.whl",
            build_tag: Some("0.sha.abc123"),
        };

        let text = info.display_text();
        assert!(text.contains("  - /src/mlflow/build"));
        assert!(text.contains("Manifest: unchanged"));
        assert!(text.contains("Relocate: /src/mlflow/skinny/dist/* -> /src/mlflow/dist"));
        assert!(text.contains("Build tag: 0.sha.abc123 (applied to mlflow*.whl)"));
    }
}
