//! Build pipeline orchestration.
//!
//! This module sequences the individual steps of a package build:
//!
//! 1. remove stale build outputs;
//! 2. inside a restore scope, swap in the release manifest when needed, run
//!    the build frontend, and gather artefacts into the dist directory;
//! 3. outside the scope, tag the wheel when a revision was supplied.
//!
//! The restore scope guarantees that tracked files are reverted before any
//! error from step 2 reaches the caller.

use crate::builder::{build_invocation, run_build_tool};
use crate::cleanup::{existing_outputs, remove_build_outputs};
use crate::config::LayoutConfig;
use crate::error::Result;
use crate::executor::CommandExecutor;
use crate::manifest::apply_release_manifest;
use crate::output::{DryRunInfo, write_stderr_line};
use crate::package_type::PackageType;
use crate::relocate::{ensure_dist_dir, relocate_artifacts};
use crate::restore::{RestoreGuard, restore_invocation, with_restored_files};
use crate::wheel::{BuildTag, tag_wheel};
use camino::{Utf8Path, Utf8PathBuf};
use std::io::Write;

/// Context shared by every step of a pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct PipelineContext<'a> {
    /// Project root directory.
    pub project_root: &'a Utf8Path,
    /// Layout of the project.
    pub layout: &'a LayoutConfig,
    /// Python interpreter used for the build frontend.
    pub python: &'a str,
    /// Suppress progress output.
    pub quiet: bool,
}

/// What to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Selected build variant.
    pub package_type: PackageType,
    /// Build tag inserted into the wheel name, if any.
    pub build_tag: Option<BuildTag>,
}

impl BuildRequest {
    /// Creates a request, composing the build tag from `revision`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::PackagerError::InvalidBuildTag`] if the
    /// revision cannot be used as a build tag.
    pub fn new(
        package_type: PackageType,
        revision: Option<&str>,
        layout: &LayoutConfig,
    ) -> Result<Self> {
        let build_tag = revision
            .map(|revision| BuildTag::from_revision(&layout.build_tag_prefix, revision))
            .transpose()?;

        Ok(Self {
            package_type,
            build_tag,
        })
    }
}

/// Outcome of a successful pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Stale outputs removed before the build.
    pub removed: Vec<Utf8PathBuf>,
    /// Canonical dist directory.
    pub dist_dir: Utf8PathBuf,
    /// Artefacts moved from the skinny dist directory.
    pub relocated: Vec<Utf8PathBuf>,
    /// Final path of the wheel when a build tag was applied.
    pub tagged_wheel: Option<Utf8PathBuf>,
}

/// Runs the complete build pipeline.
///
/// Prints progress to stderr if not in quiet mode.
///
/// # Errors
///
/// Returns the first error raised by any step. Errors raised between the
/// manifest swap and artefact relocation are returned only after the tracked
/// files have been restored.
pub fn run_build(
    context: &PipelineContext<'_>,
    request: &BuildRequest,
    executor: &dyn CommandExecutor,
    stderr: &mut dyn Write,
) -> Result<BuildReport> {
    let PipelineContext {
        project_root,
        layout,
        python,
        quiet,
    } = *context;

    progress(quiet, stderr, "Removing stale build outputs...");
    let removed = remove_build_outputs(project_root, &layout.cleanup_paths)?;

    let guard = RestoreGuard::new(
        executor,
        project_root,
        &layout.restore_files,
        layout.restore_timeout(),
    );
    let (dist_dir, relocated) = with_restored_files(guard, || {
        if apply_release_manifest(project_root, layout, request.package_type)? {
            progress(
                quiet,
                stderr,
                format!("Using {} as {}", layout.release_manifest, layout.manifest),
            );
        }

        progress(
            quiet,
            stderr,
            format!("Building {} package...", request.package_type),
        );
        run_build_tool(
            executor,
            project_root,
            layout,
            python,
            request.package_type,
        )?;

        let dist_dir = ensure_dist_dir(project_root, &layout.dist_dir)?;
        let relocated = if request.package_type.is_skinny() {
            let source = project_root.join(&layout.skinny_dist_dir);
            progress(quiet, stderr, format!("Moving {source} to {dist_dir}..."));
            relocate_artifacts(&source, &dist_dir)?
        } else {
            Vec::new()
        };

        Ok((dist_dir, relocated))
    })?;

    let tagged_wheel = match &request.build_tag {
        Some(tag) => {
            let tagged = tag_wheel(&dist_dir, &layout.wheel_pattern(), tag)?;
            progress(quiet, stderr, format!("Tagged wheel as {tagged}"));
            Some(tagged)
        }
        None => None,
    };

    Ok(BuildReport {
        removed,
        dist_dir,
        relocated,
        tagged_wheel,
    })
}

/// Describes what [`run_build`] would do, without side effects.
#[must_use]
pub fn describe_plan(context: &PipelineContext<'_>, request: &BuildRequest) -> String {
    let PipelineContext {
        project_root,
        layout,
        python,
        ..
    } = *context;

    let stale = existing_outputs(project_root, &layout.cleanup_paths);
    let build_command =
        build_invocation(project_root, layout, python, request.package_type).to_string();
    let restore_command = restore_invocation(
        project_root,
        &layout.restore_files,
        layout.restore_timeout(),
    )
    .to_string();
    let dist_dir = project_root.join(&layout.dist_dir);
    let skinny_dist = project_root.join(&layout.skinny_dist_dir);
    let wheel_pattern = layout.wheel_pattern();

    let info = DryRunInfo {
        project_root,
        package_type: request.package_type,
        stale_outputs: &stale,
        manifest_swap: request
            .package_type
            .uses_release_manifest()
            .then(|| (layout.release_manifest.as_str(), layout.manifest.as_str())),
        build_command: &build_command,
        restore_command: &restore_command,
        relocate_from: request
            .package_type
            .is_skinny()
            .then_some(skinny_dist.as_path()),
        dist_dir: &dist_dir,
        wheel_pattern: &wheel_pattern,
        build_tag: request.build_tag.as_ref().map(BuildTag::as_str),
    };

    info.display_text()
}

fn progress(quiet: bool, stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if !quiet {
        write_stderr_line(stderr, message);
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for pipeline sequencing.
    //!
    //! The end-to-end scenarios over a fake project tree live in
    //! `tests/behaviour_build.rs`; these focus on step ordering and progress
    //! output.

    use super::*;
    use crate::error::PackagerError;
    use crate::test_utils::{BuildBehaviour, FULL_WHEEL, FakeProject};
    use rstest::rstest;

    fn context<'a>(
        project: &'a FakeProject,
        layout: &'a LayoutConfig,
        quiet: bool,
    ) -> PipelineContext<'a> {
        PipelineContext {
            project_root: project.root(),
            layout,
            python: "python3",
            quiet,
        }
    }

    #[rstest]
    #[case::quiet_mode(true)]
    #[case::verbose_mode(false)]
    fn run_build_respects_quiet_flag(#[case] quiet: bool) {
        let project = FakeProject::new();
        let layout = LayoutConfig::default();
        let executor = project.executor(BuildBehaviour::Succeed);
        let request = BuildRequest::new(PackageType::Dev, None, &layout).expect("request");
        let mut stderr = Vec::new();

        run_build(&context(&project, &layout, quiet), &request, &executor, &mut stderr)
            .expect("build succeeds");

        let output = String::from_utf8_lossy(&stderr);
        if quiet {
            assert!(output.is_empty(), "expected no output in quiet mode");
        } else {
            assert!(output.contains("Building dev package"), "expected progress output");
        }
    }

    #[test]
    fn commands_run_build_then_restore() {
        let project = FakeProject::new();
        let layout = LayoutConfig::default();
        let executor = project.executor(BuildBehaviour::Succeed);
        let request = BuildRequest::new(PackageType::Release, None, &layout).expect("request");

        run_build(&context(&project, &layout, true), &request, &executor, &mut Vec::new())
            .expect("build succeeds");

        let invocations = executor.invocations();
        assert_eq!(invocations.len(), 2);
        assert!(invocations[0].matches("python3", &["-m", "build", "."]));
        assert!(invocations[1].matches("git", &["restore", "README.md", "pyproject.toml"]));
    }

    #[test]
    fn tagging_failure_happens_after_restore() {
        let project = FakeProject::new();
        let layout = LayoutConfig {
            wheel_prefix: "other".to_owned(),
            ..LayoutConfig::default()
        };
        let executor = project.executor(BuildBehaviour::Succeed);
        let request =
            BuildRequest::new(PackageType::Dev, Some("abc123"), &layout).expect("request");

        let err = run_build(
            &context(&project, &layout, true),
            &request,
            &executor,
            &mut Vec::new(),
        )
        .expect_err("no wheel matches other*.whl");

        assert!(matches!(err, PackagerError::WheelNotFound { .. }));
        assert_eq!(project.observation().restore_calls, 1);
        assert!(project.exists(&format!("dist/{FULL_WHEEL}")));
    }

    #[test]
    fn invalid_revision_is_rejected_before_any_side_effect() {
        let err = BuildRequest::new(PackageType::Dev, Some("abc-123"), &LayoutConfig::default())
            .expect_err("dash is not allowed");
        assert!(matches!(err, PackagerError::InvalidBuildTag { .. }));
    }

    #[test]
    fn describe_plan_has_no_side_effects() {
        let project = FakeProject::new();
        project.write("build/lib/mlflow/__init__.py", "");
        let layout = LayoutConfig::default();
        let request =
            BuildRequest::new(PackageType::Release, Some("abc123"), &layout).expect("request");

        let plan = describe_plan(&context(&project, &layout, false), &request);

        assert!(plan.contains("Manifest: copy pyproject.release.toml over pyproject.toml"));
        assert!(plan.contains("Build tag: 0.sha.abc123"));
        assert!(plan.contains("/build"));
        assert!(project.exists("build/lib/mlflow/__init__.py"));
        assert_eq!(project.read("pyproject.toml"), crate::test_utils::COMMITTED_MANIFEST);
    }
}
