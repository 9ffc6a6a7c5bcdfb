//! MLflow package builder CLI entrypoint.
//!
//! This binary removes stale build outputs, builds the requested package
//! variant with `python -m build`, restores the tracked manifest and readme,
//! and optionally tags the resulting wheel with a revision.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use mlflow_packager::cli::Cli;
use mlflow_packager::config::LayoutConfig;
use mlflow_packager::error::{PackagerError, Result};
use mlflow_packager::executor::SystemCommandExecutor;
use mlflow_packager::logging;
use mlflow_packager::output::{success_message, summarize_artifacts, write_stderr_line};
use mlflow_packager::pipeline::{
    BuildReport, BuildRequest, PipelineContext, describe_plan, run_build,
};
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    if logging::init(cli.verbosity, cli.quiet).is_err() {
        // A logger is already installed; keep using it.
    }
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let project_root = resolve_project_root(cli.project_root.as_deref())?;
    let layout = LayoutConfig::load(&project_root, cli.config.as_deref())?;
    let python = resolve_python(cli, &layout);

    // Reject a bad revision before anything on disk changes.
    let request = BuildRequest::new(cli.package_type, cli.sha.as_deref(), &layout)?;

    let context = PipelineContext {
        project_root: &project_root,
        layout: &layout,
        python,
        quiet: cli.quiet,
    };

    if cli.dry_run {
        write_stderr_line(stderr, describe_plan(&context, &request));
        return Ok(());
    }

    let report = run_build(&context, &request, &SystemCommandExecutor, stderr)?;
    if !cli.quiet {
        print_summary(cli, &report, stderr)?;
    }
    Ok(())
}

/// Resolves the project root from the CLI or the current directory.
fn resolve_project_root(cli_root: Option<&Utf8Path>) -> Result<Utf8PathBuf> {
    let root = match cli_root {
        Some(root) => root.to_owned(),
        None => {
            let cwd = std::env::current_dir()?;
            Utf8PathBuf::try_from(cwd).map_err(|e| PackagerError::ProjectRoot {
                reason: format!("current directory is not valid UTF-8: {e}"),
            })?
        }
    };

    if !root.is_dir() {
        return Err(PackagerError::ProjectRoot {
            reason: format!("{root} is not a directory"),
        });
    }
    log::debug!("project root: {root}");
    Ok(root)
}

/// Picks the interpreter: the `--python` flag, then the layout setting.
fn resolve_python<'a>(cli: &'a Cli, layout: &'a LayoutConfig) -> &'a str {
    cli.python.as_deref().unwrap_or(&layout.python)
}

fn print_summary(cli: &Cli, report: &BuildReport, stderr: &mut dyn Write) -> Result<()> {
    let artifacts = summarize_artifacts(&report.dist_dir)?;
    write_stderr_line(
        stderr,
        success_message(cli.package_type, artifacts.len(), &report.dist_dir),
    );
    for artifact in &artifacts {
        write_stderr_line(stderr, artifact.display_line());
    }
    if let Some(wheel) = &report.tagged_wheel {
        let name = wheel.file_name().unwrap_or(wheel.as_str());
        write_stderr_line(stderr, format!("Wheel: {name}"));
    }
    Ok(())
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}
