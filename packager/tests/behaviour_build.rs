//! Behaviour-driven tests for the build pipeline.
//!
//! These scenarios run the full pipeline against a temporary project tree,
//! with a scripted executor standing in for `python -m build` and
//! `git restore`.

use clap::ValueEnum;
use mlflow_packager::config::LayoutConfig;
use mlflow_packager::error::PackagerError;
use mlflow_packager::package_type::PackageType;
use mlflow_packager::pipeline::{BuildReport, BuildRequest, PipelineContext, run_build};
use mlflow_packager::test_utils::{
    BuildBehaviour, COMMITTED_MANIFEST, COMMITTED_README, FakeProject, RELEASE_MANIFEST,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::{Cell, RefCell};

struct BuildWorld {
    project: FakeProject,
    layout: RefCell<LayoutConfig>,
    revision: RefCell<Option<String>>,
    behaviour: Cell<BuildBehaviour>,
    result: RefCell<Option<mlflow_packager::error::Result<BuildReport>>>,
}

#[fixture]
fn build_world() -> BuildWorld {
    BuildWorld {
        project: FakeProject::new(),
        layout: RefCell::new(LayoutConfig::default()),
        revision: RefCell::new(None),
        behaviour: Cell::new(BuildBehaviour::Succeed),
        result: RefCell::new(None),
    }
}

fn report(
    build_world: &BuildWorld,
) -> std::cell::Ref<'_, mlflow_packager::error::Result<BuildReport>> {
    let result = build_world.result.borrow();
    std::cell::Ref::map(result, |opt| opt.as_ref().expect("build has not run"))
}

fn build_error(build_world: &BuildWorld) -> std::cell::Ref<'_, PackagerError> {
    std::cell::Ref::map(report(build_world), |result| match result {
        Ok(report) => panic!("expected the build to fail, got {report:?}"),
        Err(err) => err,
    })
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

#[given("a clean project")]
fn given_clean_project(build_world: &BuildWorld) {
    assert!(!build_world.project.exists("dist"));
}

#[given("a project with stale build outputs")]
fn given_stale_outputs(build_world: &BuildWorld) {
    let project = &build_world.project;
    project.write("build/lib/mlflow/__init__.py", "");
    project.write("dist/mlflow-1.0.0-py3-none-any.whl", "old");
    project.write("mlflow.egg-info/PKG-INFO", "");
    project.write("skinny/dist/mlflow_skinny-1.0.0.tar.gz", "old");
}

#[given("the revision \"{revision}\"")]
fn given_revision(build_world: &BuildWorld, revision: String) {
    build_world.revision.replace(Some(revision));
}

#[given("a build tool that fails")]
fn given_failing_build(build_world: &BuildWorld) {
    build_world.behaviour.set(BuildBehaviour::Fail);
}

#[given("a wheel prefix of \"{prefix}\"")]
fn given_wheel_prefix(build_world: &BuildWorld, prefix: String) {
    build_world.layout.borrow_mut().wheel_prefix = prefix;
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

#[when("a {kind} package is built")]
fn when_package_built(build_world: &BuildWorld, kind: String) {
    let package_type = PackageType::from_str(&kind, true).expect("unknown package type");
    let layout = build_world.layout.borrow();
    let revision = build_world.revision.borrow();
    let executor = build_world.project.executor(build_world.behaviour.get());

    let context = PipelineContext {
        project_root: build_world.project.root(),
        layout: &layout,
        python: "python3",
        quiet: true,
    };
    let result = BuildRequest::new(package_type, revision.as_deref(), &layout)
        .and_then(|request| run_build(&context, &request, &executor, &mut Vec::new()));

    build_world.result.replace(Some(result));
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then("the build succeeds")]
fn then_build_succeeds(build_world: &BuildWorld) {
    let result = report(build_world);
    assert!(result.is_ok(), "expected success, got {:?}", result.as_ref().err());
}

#[then("the build fails with a command error")]
fn then_build_fails_with_command_error(build_world: &BuildWorld) {
    let err = build_error(build_world);
    assert!(
        matches!(*err, PackagerError::CommandFailed { step: "build", .. }),
        "expected CommandFailed, got {err:?}"
    );
}

#[then("the build fails because no wheel was found")]
fn then_build_fails_without_wheel(build_world: &BuildWorld) {
    let err = build_error(build_world);
    assert!(
        matches!(*err, PackagerError::WheelNotFound { .. }),
        "expected WheelNotFound, got {err:?}"
    );
}

#[then("no stale output existed when the build ran")]
fn then_no_stale_output(build_world: &BuildWorld) {
    let observation = build_world.project.observation();
    assert!(
        observation.stale_paths_at_build.is_empty(),
        "stale outputs present at build time: {:?}",
        observation.stale_paths_at_build
    );
}

#[then("the build tool saw the release manifest")]
fn then_release_manifest_seen(build_world: &BuildWorld) {
    let observation = build_world.project.observation();
    assert_eq!(observation.manifest_at_build.as_deref(), Some(RELEASE_MANIFEST));
}

#[then("the build ran from the skinny directory")]
fn then_build_ran_from_skinny(build_world: &BuildWorld) {
    let observation = build_world.project.observation();
    assert_eq!(observation.build_target.as_deref(), Some("skinny"));
}

#[then("the dist directory contains \"{name}\"")]
fn then_dist_contains(build_world: &BuildWorld, name: String) {
    let entries = build_world.project.list("dist");
    assert!(entries.contains(&name), "{name} not in {entries:?}");
}

#[then("the dist directory does not contain \"{name}\"")]
fn then_dist_lacks(build_world: &BuildWorld, name: String) {
    let entries = build_world.project.list("dist");
    assert!(!entries.contains(&name), "{name} unexpectedly in {entries:?}");
}

#[then("the skinny dist directory is empty")]
fn then_skinny_dist_empty(build_world: &BuildWorld) {
    let leftovers = build_world.project.list("skinny/dist");
    assert!(leftovers.is_empty(), "leftovers: {leftovers:?}");
}

#[then("the tracked files match their committed state")]
fn then_tracked_files_restored(build_world: &BuildWorld) {
    assert_eq!(build_world.project.read("pyproject.toml"), COMMITTED_MANIFEST);
    assert_eq!(build_world.project.read("README.md"), COMMITTED_README);
}

#[then("git restore ran once")]
fn then_restore_ran_once(build_world: &BuildWorld) {
    assert_eq!(build_world.project.observation().restore_calls, 1);
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(path = "tests/features/packager.feature", index = 0)]
fn scenario_dev_build_collects_artefacts(build_world: BuildWorld) {
    let _ = build_world;
}

#[scenario(path = "tests/features/packager.feature", index = 1)]
fn scenario_release_build_sees_release_manifest(build_world: BuildWorld) {
    let _ = build_world;
}

#[scenario(path = "tests/features/packager.feature", index = 2)]
fn scenario_skinny_build_relocates_artefacts(build_world: BuildWorld) {
    let _ = build_world;
}

#[scenario(path = "tests/features/packager.feature", index = 3)]
fn scenario_revision_tags_wheel(build_world: BuildWorld) {
    let _ = build_world;
}

#[scenario(path = "tests/features/packager.feature", index = 4)]
fn scenario_no_revision_keeps_wheel_name(build_world: BuildWorld) {
    let _ = build_world;
}

#[scenario(path = "tests/features/packager.feature", index = 5)]
fn scenario_failing_build_restores(build_world: BuildWorld) {
    let _ = build_world;
}

#[scenario(path = "tests/features/packager.feature", index = 6)]
fn scenario_tagging_without_wheel_fails(build_world: BuildWorld) {
    let _ = build_world;
}
