//! Mapping of CLI commands onto the build flows.
//!
//! The binary resolves the project directory and configuration, then hands a
//! [`DispatchContext`] to [`dispatch`]. Keeping the flows here lets tests
//! drive every command with a stub command runner and in-memory sinks.

use crate::cli::{Command, PackageArgs};
use crate::command::CommandRunner;
use crate::config::BuildConfig;
use crate::error::{BuildError, Result};
use crate::output::{write_stderr_line, write_stdout_line};
use crate::packaging::{PackageParams, package_addon};
use crate::steps::groups::{GroupBuilder, TEST};
use crate::steps::runner::StepRunner;
use crate::steps::StepGroup;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use std::io::Write;

/// Everything a command needs to run.
pub struct DispatchContext<'a> {
    /// The addon project directory (absolute).
    pub project_root: &'a Utf8Path,
    /// The directory relative command-line paths are resolved against.
    pub invocation_dir: &'a Utf8Path,
    /// The loaded configuration.
    pub config: &'a BuildConfig,
    /// Spawns external tools.
    pub runner: &'a dyn CommandRunner,
    /// Progress and status lines.
    pub status: &'a mut dyn Write,
    /// Machine-readable results (the archive path).
    pub stdout: &'a mut dyn Write,
}

/// Run `command`.
///
/// # Errors
///
/// Returns [`BuildError::StepsFailed`] when a verification step fails, or
/// the error that stopped packaging.
pub fn dispatch(command: &Command, context: &mut DispatchContext<'_>) -> Result<()> {
    match command {
        Command::Package(args) => package(args, context),
        Command::Test => {
            let builder = group_builder(context)?;
            let groups = [
                builder.sanity(context.config),
                builder.unit(context.config),
            ];
            StepRunner::new(context.runner, context.status)
                .run_composite(TEST, &groups)
                .into_result()
        }
        Command::Sanity => {
            let group = group_builder(context)?.sanity(context.config);
            run_group(context, &group)
        }
        Command::Unit => {
            let group = group_builder(context)?.unit(context.config);
            run_group(context, &group)
        }
        Command::Addon => {
            clean(context)?;
            let group = group_builder(context)?.addon_group(&context.config.addon);
            run_group(context, &group)
        }
        Command::Clean => clean(context),
    }
}

fn group_builder(context: &DispatchContext<'_>) -> Result<GroupBuilder> {
    GroupBuilder::new(context.project_root, context.config)
}

fn run_group(context: &mut DispatchContext<'_>, group: &StepGroup) -> Result<()> {
    if group.steps().is_empty() {
        log::warn!("no {} steps are configured", group.name());
    }
    StepRunner::new(context.runner, context.status)
        .run_group(group)
        .into_result()
}

fn clean(context: &mut DispatchContext<'_>) -> Result<()> {
    let report = context.config.cleaner()?.clean(context.project_root);
    let noun = if report.removed.len() == 1 { "path" } else { "paths" };
    write_stderr_line(
        context.status,
        format!("clean: removed {} {noun}", report.removed.len()),
    );
    for warning in &report.warnings {
        write_stderr_line(context.status, format!("clean: {warning}"));
    }
    Ok(())
}

fn package(args: &PackageArgs, context: &mut DispatchContext<'_>) -> Result<()> {
    let output_dir = args.output_dir.as_deref().map_or_else(
        || resolve_path(context.project_root, &context.config.package.output_dir),
        |dir| resolve_path(context.invocation_dir, dir),
    );
    let exclude = context.config.package_excludes()?;
    let cleaner = context.config.cleaner()?;

    let output = package_addon(
        &PackageParams {
            project_root: context.project_root,
            manifest: &context.config.manifest,
            include: &context.config.package.include,
            exclude: &exclude,
            output_dir: &output_dir,
        },
        &cleaner,
        context.runner,
    )?;

    write_stderr_line(
        context.status,
        format!(
            "package: {} {} ({} @ {})",
            output.metadata.name(),
            output.metadata.version(),
            output.metadata.branch(),
            output.metadata.commit_hash()
        ),
    );
    write_stdout_line(context.stdout, output.archive.path());
    Ok(())
}

/// Resolve the project directory: `requested` (relative to `invocation_dir`)
/// or `invocation_dir` itself.
///
/// # Errors
///
/// Returns [`BuildError::ProjectNotFound`] if the directory does not exist
/// or is not a directory.
pub fn resolve_project_root(
    invocation_dir: &Utf8Path,
    requested: Option<&Utf8Path>,
) -> Result<Utf8PathBuf> {
    let root = requested.map_or_else(
        || invocation_dir.to_owned(),
        |dir| resolve_path(invocation_dir, dir),
    );
    let not_found = |reason: String| BuildError::ProjectNotFound {
        path: root.clone(),
        reason,
    };
    let metadata = std::fs::metadata(&root).map_err(|err| not_found(err.to_string()))?;
    if !metadata.is_dir() {
        return Err(not_found("not a directory".to_owned()));
    }
    Ok(root)
}

/// Load the configuration `command` runs with.
///
/// `clean` must always succeed, so for it an unusable configuration is
/// logged and replaced by the defaults.
///
/// # Errors
///
/// Returns [`BuildError::InvalidConfig`] for every other command.
pub fn load_config(
    command: &Command,
    project_root: &Utf8Path,
    invocation_dir: &Utf8Path,
    explicit: Option<&Utf8Path>,
) -> Result<BuildConfig> {
    let explicit = explicit.map(|path| resolve_path(invocation_dir, path));
    match BuildConfig::load(project_root, explicit.as_deref()) {
        Err(err) if *command == Command::Clean => {
            log::warn!("{err}; cleaning with the default configuration");
            Ok(BuildConfig::default())
        }
        other => other,
    }
}

/// Join `path` onto `base` and fold away `.` and `..` components.
#[must_use]
pub fn resolve_path(base: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    let mut resolved = Utf8PathBuf::new();
    for component in base.join(path).components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => match resolved.components().next_back() {
                Some(Utf8Component::Normal(_)) => {
                    resolved.pop();
                }
                Some(Utf8Component::RootDir | Utf8Component::Prefix(_)) => {}
                _ => resolved.push(component),
            },
            other => resolved.push(other),
        }
    }
    resolved
}
