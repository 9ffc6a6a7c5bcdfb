//! CLI argument definitions for the packager.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::package_type::PackageType;
use camino::Utf8PathBuf;
use clap::Parser;

/// Build an MLflow wheel.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "build-package")]
#[command(version, about)]
#[command(long_about = concat!(
    "Build an MLflow package.\n\n",
    "Removes stale build outputs, runs `python -m build`, and collects the ",
    "artefacts in dist/. Release builds temporarily replace pyproject.toml with ",
    "pyproject.release.toml; skinny builds run from the skinny/ subdirectory. ",
    "README.md and pyproject.toml are restored with `git restore` afterwards, ",
    "even when the build fails.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Build the development wheel:\n",
    "    $ build-package\n\n",
    "  Build the skinny wheel:\n",
    "    $ build-package --package-type skinny\n\n",
    "  Build a release wheel tagged with the current commit:\n",
    "    $ build-package --package-type release --sha \"$(git rev-parse --short HEAD)\"\n\n",
    "  Preview without building:\n",
    "    $ build-package --dry-run",
))]
pub struct Cli {
    /// Package type to build.
    #[arg(long, value_enum, default_value_t = PackageType::Dev)]
    pub package_type: PackageType,

    /// Include this revision in the wheel name as a build tag.
    #[arg(long, value_name = "SHA")]
    pub sha: Option<String>,

    /// Project root containing pyproject.toml [default: current directory].
    #[arg(long, value_name = "DIR")]
    pub project_root: Option<Utf8PathBuf>,

    /// Layout configuration file [default: <project-root>/packager.toml if present].
    #[arg(long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Python interpreter used to run `-m build`.
    #[arg(long, value_name = "PROGRAM")]
    pub python: Option<String>,

    /// Show the build plan and exit without touching the tree.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}
