//! Error types for the packager.
//!
//! Each variant names the path, command, or value it concerns so that the
//! single line printed by the binary is enough to act on.

use camino::Utf8PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors that can occur while building a package.
#[derive(Debug, Error)]
pub enum PackagerError {
    /// A stale build output could not be removed.
    #[error("failed to remove {path}")]
    Cleanup {
        /// Path that could not be removed.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The release manifest could not be copied over the primary manifest.
    #[error("failed to apply release manifest {template} to {manifest}")]
    ManifestSwap {
        /// The release manifest template.
        template: Utf8PathBuf,
        /// The primary manifest being overwritten.
        manifest: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An external command could not be started.
    #[error("{step} failed: could not run `{command}`")]
    CommandSpawn {
        /// The pipeline step that ran the command.
        step: &'static str,
        /// The rendered command line.
        command: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An external command exited unsuccessfully.
    #[error("{step} failed: `{command}` exited with {status}")]
    CommandFailed {
        /// The pipeline step that ran the command.
        step: &'static str,
        /// The rendered command line.
        command: String,
        /// The exit status reported by the child process.
        status: ExitStatus,
    },

    /// An external command did not finish within its timeout.
    #[error("{step} failed: `{command}` timed out after {seconds} seconds")]
    CommandTimedOut {
        /// The pipeline step that ran the command.
        step: &'static str,
        /// The rendered command line.
        command: String,
        /// The timeout that elapsed.
        seconds: u64,
    },

    /// A built artefact could not be moved into the dist directory.
    #[error("failed to move {from} to {to}")]
    Relocation {
        /// The artefact being moved.
        from: Utf8PathBuf,
        /// The destination path.
        to: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// No wheel matched the expected pattern when tagging.
    #[error("no wheel matching {pattern} found in {dir}")]
    WheelNotFound {
        /// The glob pattern used for discovery.
        pattern: String,
        /// The directory that was searched.
        dir: Utf8PathBuf,
    },

    /// More than one wheel matched the expected pattern when tagging.
    #[error("expected exactly one wheel matching {pattern}, found: {}", .matches.join(", "))]
    AmbiguousWheel {
        /// The glob pattern used for discovery.
        pattern: String,
        /// File names of every matching wheel.
        matches: Vec<String>,
    },

    /// The wheel discovery pattern is not a valid glob.
    #[error("invalid wheel pattern {pattern}: {reason}")]
    WheelPattern {
        /// The full glob pattern that failed to compile.
        pattern: String,
        /// Description of the syntax error.
        reason: String,
    },

    /// A wheel filename does not follow the `name-version-rest` scheme.
    #[error("invalid wheel filename \"{name}\": {reason}")]
    InvalidWheelName {
        /// The rejected filename.
        name: String,
        /// Description of the violated rule.
        reason: String,
    },

    /// A revision cannot be used as a wheel build tag.
    #[error("invalid build tag \"{value}\": {reason}")]
    InvalidBuildTag {
        /// The rejected revision or tag.
        value: String,
        /// Description of the violated rule.
        reason: String,
    },

    /// The project layout configuration is unreadable or unsafe.
    #[error("invalid configuration at {path}: {reason}")]
    Config {
        /// Path to the configuration file.
        path: Utf8PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// The project root could not be resolved.
    #[error("project root not usable: {reason}")]
    ProjectRoot {
        /// Description of why the root was rejected.
        reason: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to write output.
    #[error("failed to write output")]
    WriteFailed {
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using [`PackagerError`].
pub type Result<T> = std::result::Result<T, PackagerError>;
