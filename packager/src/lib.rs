//! MLflow packager library.
//!
//! This crate provides the build orchestration behind the `build-package`
//! binary: it cleans stale build outputs, swaps in the release manifest when
//! asked to, runs `python -m build`, gathers the produced artefacts into the
//! canonical `dist/` directory, and optionally stamps the wheel with a build
//! tag derived from a source-control revision. Tracked files touched during
//! the build are always restored with `git restore`, including on failure.
//!
//! # Modules
//!
//! - [`builder`] - `python -m build` invocation
//! - [`cleanup`] - Removal of stale build outputs
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Project layout configuration and `packager.toml` loading
//! - [`error`] - Semantic error types
//! - [`executor`] - Abstraction over external commands
//! - [`logging`] - Stderr backend for the `log` facade
//! - [`manifest`] - Release manifest swapping
//! - [`output`] - Progress lines, dry-run plans, and artefact summaries
//! - [`package_type`] - The dev, release, and skinny build variants
//! - [`pipeline`] - End-to-end build sequencing
//! - [`relocate`] - Gathering artefacts into the dist directory
//! - [`restore`] - Guaranteed restoration of tracked files
//! - [`wheel`] - Wheel filename parsing and build tagging

pub mod builder;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod manifest;
pub mod output;
pub mod package_type;
pub mod pipeline;
pub mod relocate;
pub mod restore;
pub mod wheel;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
