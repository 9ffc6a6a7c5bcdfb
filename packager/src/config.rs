//! Project layout configuration.
//!
//! The packager knows where a project keeps its manifests, build outputs, and
//! skinny subdirectory through [`LayoutConfig`]. The defaults describe the
//! MLflow repository; other layouts can be described in a `packager.toml`
//! at the project root. Values are deserialised with
//! `deny_unknown_fields` so that typos fail loudly instead of silently
//! falling back to a default.

use crate::error::{PackagerError, Result};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::time::Duration;

/// Name of the optional configuration file looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "packager.toml";

/// Paths and tools used by a build, relative to the project root.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Distribution name prefix used to discover the built wheel
    /// (`<prefix>*.whl`).
    pub wheel_prefix: String,
    /// Build outputs removed before every build.
    pub cleanup_paths: Vec<Utf8PathBuf>,
    /// Subdirectory holding the skinny package.
    pub skinny_dir: Utf8PathBuf,
    /// Where the build frontend writes skinny artefacts.
    pub skinny_dist_dir: Utf8PathBuf,
    /// Canonical output directory for every variant.
    pub dist_dir: Utf8PathBuf,
    /// Primary manifest, overwritten for release builds.
    pub manifest: Utf8PathBuf,
    /// Template copied over the primary manifest for release builds.
    pub release_manifest: Utf8PathBuf,
    /// Tracked files restored with `git restore` once the build finishes.
    pub restore_files: Vec<Utf8PathBuf>,
    /// Python interpreter used to run `-m build`.
    pub python: String,
    /// Literal prepended to the revision to form a wheel build tag.
    pub build_tag_prefix: String,
    /// Upper bound, in seconds, on the `git restore` invocation.
    pub restore_timeout_secs: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            wheel_prefix: "mlflow".to_owned(),
            cleanup_paths: [
                "build",
                "dist",
                "mlflow.egg-info",
                "skinny/dist",
                "skinny/mlflow_skinny.egg_info",
            ]
            .into_iter()
            .map(Utf8PathBuf::from)
            .collect(),
            skinny_dir: Utf8PathBuf::from("skinny"),
            skinny_dist_dir: Utf8PathBuf::from("skinny/dist"),
            dist_dir: Utf8PathBuf::from("dist"),
            manifest: Utf8PathBuf::from("pyproject.toml"),
            release_manifest: Utf8PathBuf::from("pyproject.release.toml"),
            restore_files: vec![
                Utf8PathBuf::from("README.md"),
                Utf8PathBuf::from("pyproject.toml"),
            ],
            python: "python3".to_owned(),
            build_tag_prefix: "0.sha.".to_owned(),
            restore_timeout_secs: 60,
        }
    }
}

impl LayoutConfig {
    /// Loads the layout for `project_root`.
    ///
    /// An explicit path must exist. Without one, `packager.toml` in the
    /// project root is used when present and the defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Config`] if the file cannot be read, does not
    /// parse, or names a path that escapes the project root.
    pub fn load(project_root: &Utf8Path, explicit: Option<&Utf8Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_owned(),
            None => {
                let candidate = project_root.join(CONFIG_FILE_NAME);
                if !candidate.is_file() {
                    log::debug!("no {CONFIG_FILE_NAME} in {project_root}; using defaults");
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let contents = std::fs::read_to_string(&path).map_err(|e| PackagerError::Config {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        log::debug!("loaded layout configuration from {path}");
        Self::parse(&contents, &path)
    }

    /// Parses and validates a layout from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Config`] if the text does not parse or fails
    /// validation; `origin` is reported as the offending file.
    pub fn parse(contents: &str, origin: &Utf8Path) -> Result<Self> {
        let config: Self = toml::from_str(contents).map_err(|e| PackagerError::Config {
            path: origin.to_owned(),
            reason: e.to_string(),
        })?;

        config.validate().map_err(|reason| PackagerError::Config {
            path: origin.to_owned(),
            reason,
        })?;

        Ok(config)
    }

    /// Returns the timeout applied to `git restore`.
    #[must_use]
    pub const fn restore_timeout(&self) -> Duration {
        Duration::from_secs(self.restore_timeout_secs)
    }

    /// Returns the glob pattern matching the project's wheels.
    #[must_use]
    pub fn wheel_pattern(&self) -> String {
        format!("{}*.whl", self.wheel_prefix)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.wheel_prefix.is_empty() {
            return Err("wheel_prefix must not be empty".to_owned());
        }
        if self.wheel_prefix.contains(['/', '\\', '*', '?', '[']) {
            return Err(format!(
                "wheel_prefix \"{}\" must be a plain distribution name",
                self.wheel_prefix
            ));
        }
        if self.python.trim().is_empty() {
            return Err("python must not be empty".to_owned());
        }
        if self.restore_timeout_secs == 0 {
            return Err("restore_timeout_secs must be at least 1".to_owned());
        }
        if self.restore_files.is_empty() {
            return Err("restore_files must name at least one file".to_owned());
        }

        let single = [
            ("skinny_dir", &self.skinny_dir),
            ("skinny_dist_dir", &self.skinny_dist_dir),
            ("dist_dir", &self.dist_dir),
            ("manifest", &self.manifest),
            ("release_manifest", &self.release_manifest),
        ];
        let lists = [
            ("cleanup_paths", &self.cleanup_paths),
            ("restore_files", &self.restore_files),
        ];

        single
            .into_iter()
            .chain(
                lists
                    .into_iter()
                    .flat_map(|(key, paths)| paths.iter().map(move |path| (key, path))),
            )
            .try_for_each(|(key, path)| ensure_contained(key, path))
    }
}

/// Rejects paths that are absolute, empty, or do not name an entry below
/// the project root.
fn ensure_contained(key: &str, path: &Utf8Path) -> std::result::Result<(), String> {
    if path.as_str().is_empty() {
        return Err(format!("{key} contains an empty path"));
    }

    // `.` and `./` resolve to the root itself; cleanup would wipe the tree.
    let mut components = path.components().peekable();
    let below_root = components.peek().is_some()
        && components.all(|component| matches!(component, Utf8Component::Normal(_)));
    if !below_root {
        return Err(format!(
            "{key} entry \"{path}\" must name a path below the project root"
        ));
    }

    Ok(())
}
