//! Tests for CLI parsing and default behaviours.

use super::*;
use rstest::rstest;

#[test]
fn cli_parses_defaults() {
    let cli = Cli::parse_from(["addon-build", "package"]);
    assert_eq!(cli.command, Command::Package(PackageArgs::default()));
    assert!(cli.project_dir.is_none());
    assert!(cli.config.is_none());
    assert_eq!(cli.verbosity, 0);
    assert!(!cli.quiet);
}

#[rstest]
#[case::test("test", Command::Test)]
#[case::sanity("sanity", Command::Sanity)]
#[case::addon("addon", Command::Addon)]
#[case::unit("unit", Command::Unit)]
#[case::clean("clean", Command::Clean)]
fn cli_parses_each_subcommand(#[case] name: &str, #[case] expected: Command) {
    let cli = Cli::parse_from(["addon-build", name]);
    assert_eq!(cli.command, expected);
}

#[test]
fn cli_parses_output_dir() {
    let cli = Cli::parse_from(["addon-build", "package", "--output-dir", "/tmp/dist"]);
    assert_eq!(
        cli.command,
        Command::Package(PackageArgs {
            output_dir: Some(Utf8PathBuf::from("/tmp/dist")),
        })
    );
}

#[test]
fn global_options_are_accepted_after_subcommand() {
    let cli = Cli::parse_from([
        "addon-build",
        "sanity",
        "-C",
        "../routing",
        "--config",
        "ci.toml",
    ]);
    assert_eq!(cli.project_dir, Some(Utf8PathBuf::from("../routing")));
    assert_eq!(cli.config, Some(Utf8PathBuf::from("ci.toml")));
}

#[test]
fn cli_requires_a_subcommand() {
    assert!(Cli::try_parse_from(["addon-build"]).is_err());
}

#[test]
fn verbose_conflicts_with_quiet() {
    assert!(Cli::try_parse_from(["addon-build", "-v", "-q", "clean"]).is_err());
}

#[rstest]
#[case::default(&["addon-build", "unit"], "warn")]
#[case::verbose(&["addon-build", "-v", "unit"], "info")]
#[case::very_verbose(&["addon-build", "-vv", "unit"], "debug")]
#[case::trace(&["addon-build", "-vvvv", "unit"], "trace")]
#[case::quiet(&["addon-build", "-q", "unit"], "error")]
fn log_level_follows_flags(#[case] args: &[&str], #[case] expected: &str) {
    let cli = Cli::parse_from(args);
    assert_eq!(cli.log_level(), expected);
}
