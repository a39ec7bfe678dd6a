//! External command execution.
//!
//! Every external tool (git, linters, test runners, compatibility checkers)
//! is spawned through the [`CommandRunner`] capability so the orchestration
//! logic can be exercised with a fake runner instead of real processes.

use crate::error::{BuildError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::ffi::OsString;
use std::fmt;
use std::process::{Command, Output, Stdio};

/// How a child process's standard streams are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdioMode {
    /// Capture stdout and stderr into the returned [`Output`].
    #[default]
    Capture,
    /// Pass stdout and stderr through to this process; the returned
    /// [`Output`] carries only the exit status.
    Inherit,
}

/// A fully described external command: argv, working directory, and
/// environment overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    current_dir: Option<Utf8PathBuf>,
    env: Vec<(String, OsString)>,
    stdio: StdioMode,
}

impl Invocation {
    /// Create an invocation of `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            env: Vec::new(),
            stdio: StdioMode::Capture,
        }
    }

    /// Build an invocation from an argv vector (`argv[0]` is the program).
    ///
    /// Returns `None` for an empty vector.
    #[must_use]
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone()).args(args.iter().cloned()))
    }

    /// Append a single argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run the command from `dir`.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Set an environment variable for the child process.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Choose how the child's standard streams are wired.
    #[must_use]
    pub const fn stdio(mut self, stdio: StdioMode) -> Self {
        self.stdio = stdio;
        self
    }

    /// Return the program name.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Return the arguments.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Return the working directory, if one was set.
    #[must_use]
    pub fn working_dir(&self) -> Option<&Utf8Path> {
        self.current_dir.as_deref()
    }

    /// Return the environment overrides.
    #[must_use]
    pub fn env_vars(&self) -> &[(String, OsString)] {
        &self.env
    }

    /// Return the stdio wiring.
    #[must_use]
    pub const fn stdio_mode(&self) -> StdioMode {
        self.stdio
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Abstraction for running external commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner {
    /// Runs the invocation to completion and returns its output.
    ///
    /// A non-zero exit is not an error at this level; callers inspect
    /// `output.status`.
    ///
    /// # Errors
    ///
    /// Returns any I/O error encountered while spawning or waiting for the
    /// process.
    fn run(&self, invocation: &Invocation) -> Result<Output>;
}

/// Runs commands on the host system.
///
/// # Examples
///
/// ```no_run
/// use addon_build::command::{CommandRunner, Invocation, SystemCommandRunner};
///
/// let output = SystemCommandRunner.run(&Invocation::new("git").arg("--version"))?;
/// assert!(output.status.success());
/// # Ok::<(), addon_build::error::BuildError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<Output> {
        let mut cmd = Command::new(invocation.program());
        cmd.args(invocation.arguments());
        if let Some(dir) = invocation.working_dir() {
            cmd.current_dir(dir.as_std_path());
        }
        for (key, value) in invocation.env_vars() {
            cmd.env(key, value);
        }

        log::trace!("spawning `{invocation}`");
        let result = match invocation.stdio_mode() {
            StdioMode::Capture => cmd.stdin(Stdio::null()).output(),
            StdioMode::Inherit => cmd.status().map(|status| Output {
                status,
                stdout: Vec::new(),
                stderr: Vec::new(),
            }),
        };
        result.map_err(BuildError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_argv_splits_program_and_args() {
        let argv = vec!["pylint".to_owned(), "lib/".to_owned(), "test/".to_owned()];
        let invocation = Invocation::from_argv(&argv).expect("non-empty argv");
        assert_eq!(invocation.program(), "pylint");
        assert_eq!(invocation.arguments(), ["lib/", "test/"]);
    }

    #[test]
    fn from_argv_rejects_empty_vector() {
        assert!(Invocation::from_argv(&[]).is_none());
    }

    #[test]
    fn display_renders_command_line() {
        let invocation = Invocation::new("git").args(["rev-parse", "--short", "HEAD"]);
        assert_eq!(invocation.to_string(), "git rev-parse --short HEAD");
    }

    #[test]
    fn builder_records_directory_environment_and_stdio() {
        let invocation = Invocation::new("tox")
            .current_dir("/work/addon")
            .env("PYTHONPATH", "lib:test")
            .stdio(StdioMode::Inherit);
        assert_eq!(
            invocation.working_dir(),
            Some(Utf8Path::new("/work/addon"))
        );
        assert_eq!(
            invocation.env_vars(),
            [("PYTHONPATH".to_owned(), OsString::from("lib:test"))]
        );
        assert_eq!(invocation.stdio_mode(), StdioMode::Inherit);
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_reports_exit_status() {
        let ok = SystemCommandRunner
            .run(&Invocation::new("true"))
            .expect("spawn true");
        assert!(ok.status.success());

        let failed = SystemCommandRunner
            .run(&Invocation::new("false"))
            .expect("spawn false");
        assert!(!failed.status.success());
    }

    #[test]
    fn system_runner_fails_for_missing_program() {
        let result = SystemCommandRunner.run(&Invocation::new("addon-build-no-such-tool"));
        assert!(matches!(result, Err(BuildError::Io(_))));
    }
}
