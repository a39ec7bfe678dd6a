//! `addon-build` CLI entrypoint.
//!
//! Resolves the project directory and configuration, installs the log
//! subscriber, and maps the outcome of the requested command onto the
//! process exit code: 0 on success, 1 when a verification step failed, and 2
//! for any other error.

use addon_build::cli::Cli;
use addon_build::command::SystemCommandRunner;
use addon_build::dispatch::{DispatchContext, dispatch, load_config, resolve_project_root};
use addon_build::error::{BuildError, Result};
use addon_build::output::write_stderr_line;
use camino::Utf8PathBuf;
use clap::Parser;
use std::io::Write;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level());

    let mut stderr = std::io::stderr();
    let mut stdout = std::io::stdout();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Installs the fmt subscriber; `RUST_LOG` overrides the level from flags.
fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init()
        .is_err()
    {
        // A subscriber is already installed.
    }
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let invocation_dir = Utf8PathBuf::try_from(cwd).map_err(|err| BuildError::ProjectNotFound {
        path: Utf8PathBuf::from(err.as_path().to_string_lossy().into_owned()),
        reason: "current directory is not valid UTF-8".to_owned(),
    })?;

    let project_root = resolve_project_root(&invocation_dir, cli.project_dir.as_deref())?;
    let config = load_config(
        &cli.command,
        &project_root,
        &invocation_dir,
        cli.config.as_deref(),
    )?;

    let mut silent = std::io::sink();
    let status: &mut dyn Write = if cli.quiet { &mut silent } else { stderr };
    let mut context = DispatchContext {
        project_root: &project_root,
        invocation_dir: &invocation_dir,
        config: &config,
        runner: &SystemCommandRunner,
        status,
        stdout,
    };
    dispatch(&cli.command, &mut context)
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            err.exit_code()
        }
    }
}
