//! Python build frontend invocation.
//!
//! Packages are built with `python -m build`, the standard PEP 517 frontend.
//! The skinny variant is built from its own subdirectory; every other variant
//! is built from the project root.

use crate::config::LayoutConfig;
use crate::error::Result;
use crate::executor::{CommandExecutor, Invocation, run_checked};
use crate::package_type::PackageType;
use camino::Utf8Path;

/// Returns the directory argument passed to the build frontend.
#[must_use]
pub fn build_target(layout: &LayoutConfig, package_type: PackageType) -> &str {
    if package_type.is_skinny() {
        layout.skinny_dir.as_str()
    } else {
        "."
    }
}

/// Builds the `python -m build <target>` invocation.
#[must_use]
pub fn build_invocation(
    project_root: &Utf8Path,
    layout: &LayoutConfig,
    python: &str,
    package_type: PackageType,
) -> Invocation {
    Invocation::new(
        "build",
        python,
        ["-m", "build", build_target(layout, package_type)],
        project_root,
    )
}

/// Runs the build frontend for `package_type`.
///
/// # Errors
///
/// Returns an error if the interpreter cannot be started or the build exits
/// unsuccessfully.
pub fn run_build_tool(
    executor: &dyn CommandExecutor,
    project_root: &Utf8Path,
    layout: &LayoutConfig,
    python: &str,
    package_type: PackageType,
) -> Result<()> {
    let invocation = build_invocation(project_root, layout, python, package_type);
    run_checked(executor, &invocation)
}
