//! CLI argument definitions for `addon-build`.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint so parsing can be tested without running a build.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

/// Package, lint, and test a plugin-style addon.
#[derive(Parser, Debug)]
#[command(name = "addon-build")]
#[command(version, about)]
#[command(long_about = concat!(
    "Package, lint, and test a plugin-style addon.\n\n",
    "The addon identity comes from the `id` and `version` attributes of its ",
    "manifest (addon.xml) and the branch and commit come from git. Packaging ",
    "writes <name>-<version>-<branch>-<commit>.zip, with every entry nested ",
    "under <name>/, into the directory above the project.\n\n",
    "Settings are read from addon-build.toml in the project root when present.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Build the distributable archive:\n",
    "    $ addon-build package\n\n",
    "  Run static analysis, then unit tests if it passes:\n",
    "    $ addon-build test\n\n",
    "  Check compatibility with every configured host branch:\n",
    "    $ addon-build addon\n\n",
    "  Remove bytecode, caches, and logs from another checkout:\n",
    "    $ addon-build -C ../script.module.routing clean",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Addon project directory [default: current directory].
    #[arg(short = 'C', long, value_name = "DIR", global = true)]
    pub project_dir: Option<Utf8PathBuf>,

    /// Configuration file [default: <project>/addon-build.toml].
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet",
        global = true
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity", global = true)]
    pub quiet: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Clean, then write the distributable zip archive.
    Package(PackageArgs),

    /// Run the sanity checks, then the unit tests if they pass.
    Test,

    /// Run the static-analysis checks.
    Sanity,

    /// Clean, then run the host compatibility checker for each branch.
    Addon,

    /// Run the unit tests.
    Unit,

    /// Remove bytecode, caches, and logs.
    Clean,
}

/// Arguments for the package command.
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageArgs {
    /// Directory the archive is written into [default: from configuration].
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<Utf8PathBuf>,
}

impl Cli {
    /// Return the log filter directive implied by `-v` and `-q`.
    ///
    /// # Examples
    ///
    /// ```
    /// use addon_build::cli::Cli;
    /// use clap::Parser;
    ///
    /// let cli = Cli::parse_from(["addon-build", "-vv", "package"]);
    /// assert_eq!(cli.log_level(), "debug");
    /// ```
    #[must_use]
    pub const fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
