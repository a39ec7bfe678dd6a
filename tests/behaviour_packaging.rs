//! Behaviour-driven tests for addon packaging.
//!
//! These scenarios drive `package_addon` against a real project tree in a
//! temporary directory, answering git queries with a `StubRunner`, and read
//! the resulting zip back to check its name and layout.

use addon_build::config::BuildConfig;
use addon_build::error::BuildError;
use addon_build::packaging::{PackageOutput, PackageParams, package_addon};
use addon_build::test_utils::{ExpectedCall, StubRunner, failure_output, stdout_output};
use camino::{Utf8Path, Utf8PathBuf};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::fs;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// World types
// ---------------------------------------------------------------------------

#[derive(Default)]
struct PackagingWorld {
    temp_dir: Option<TempDir>,
    git_calls: Vec<ExpectedCall>,
    output: Option<PackageOutput>,
    error: Option<BuildError>,
}

#[fixture]
fn world() -> PackagingWorld {
    let world = PackagingWorld {
        temp_dir: Some(TempDir::new().expect("temp dir")),
        ..PackagingWorld::default()
    };
    fs::create_dir_all(project_root(&world).join("lib")).expect("mkdir lib");
    fs::write(project_root(&world).join("lib/module.py"), "VALUE = 1\n").expect("write source");
    world
}

fn base(world: &PackagingWorld) -> Utf8PathBuf {
    let dir = world.temp_dir.as_ref().expect("temp_dir set");
    Utf8Path::from_path(dir.path())
        .expect("utf-8 temp dir")
        .to_owned()
}

fn project_root(world: &PackagingWorld) -> Utf8PathBuf {
    base(world).join("myaddon")
}

fn output_dir(world: &PackagingWorld) -> Utf8PathBuf {
    base(world).join("dist")
}

/// Read entry names back from the written zip, in archive order.
fn zip_entries(world: &PackagingWorld) -> Vec<String> {
    let output = world.output.as_ref().expect("packaging succeeded");
    let file = fs::File::open(output.archive.path()).expect("open archive");
    let mut archive = zip::ZipArchive::new(file).expect("read archive");
    (0..archive.len())
        .map(|index| {
            archive
                .by_index(index)
                .expect("archive entry")
                .name()
                .to_owned()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Step definitions
// ---------------------------------------------------------------------------

#[given("an addon \"{name}\" at version \"{version}\"")]
fn given_addon(world: &mut PackagingWorld, name: String, version: String) {
    let manifest = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <addon id=\"{name}\" name=\"Test Addon\" version=\"{version}\" provider-name=\"tests\">\n\
         </addon>\n"
    );
    fs::write(project_root(world).join("addon.xml"), manifest).expect("write manifest");
}

#[given("a project without a manifest")]
fn given_no_manifest(world: &mut PackagingWorld) {
    assert!(!project_root(world).join("addon.xml").exists());
}

#[given("the checkout is on branch \"{branch}\" at commit \"{commit}\"")]
fn given_checkout(world: &mut PackagingWorld, branch: String, commit: String) {
    world.git_calls = vec![
        ExpectedCall::new(
            "git",
            &["rev-parse", "--is-inside-work-tree"],
            Ok(stdout_output("true\n")),
        ),
        ExpectedCall::new(
            "git",
            &["rev-parse", "--abbrev-ref", "HEAD"],
            Ok(stdout_output(&format!("{branch}\n"))),
        ),
        ExpectedCall::new(
            "git",
            &["rev-parse", "--short", "HEAD"],
            Ok(stdout_output(&format!("{commit}\n"))),
        ),
    ];
}

#[given("the project is not under version control")]
fn given_no_vcs(world: &mut PackagingWorld) {
    world.git_calls = vec![ExpectedCall::new(
        "git",
        &["rev-parse", "--is-inside-work-tree"],
        Ok(failure_output(
            128,
            "fatal: not a git repository (or any of the parent directories): .git",
        )),
    )];
}

#[given("a stale bytecode file \"{path}\"")]
fn given_bytecode(world: &mut PackagingWorld, path: String) {
    fs::write(project_root(world).join(path), b"\x42\x0d\x0d\x0a").expect("write bytecode");
}

#[when("the addon is packaged")]
fn when_packaged(world: &mut PackagingWorld) {
    let config = BuildConfig::default();
    let exclude = config.package_excludes().expect("default excludes");
    let cleaner = config.cleaner().expect("default cleaner");
    let runner = StubRunner::new(std::mem::take(&mut world.git_calls));
    let root = project_root(world);
    let output_dir = output_dir(world);

    let result = package_addon(
        &PackageParams {
            project_root: &root,
            manifest: &config.manifest,
            include: &config.package.include,
            exclude: &exclude,
            output_dir: &output_dir,
        },
        &cleaner,
        &runner,
    );
    match result {
        Ok(output) => world.output = Some(output),
        Err(err) => world.error = Some(err),
    }
}

#[then("the archive is named \"{filename}\"")]
fn then_archive_named(world: &mut PackagingWorld, filename: String) {
    let output = world.output.as_ref().expect("packaging succeeded");
    assert_eq!(output.name.filename(), filename);
    assert_eq!(output.archive.path(), output_dir(world).join(&filename));
    assert!(output.archive.path().is_file(), "archive must exist");
}

#[then("the first archive entry is \"{entry}\"")]
fn then_first_entry(world: &mut PackagingWorld, entry: String) {
    let entries = zip_entries(world);
    assert_eq!(entries.first(), Some(&entry));
}

#[then("every archive entry starts with \"{prefix}\"")]
fn then_entries_prefixed(world: &mut PackagingWorld, prefix: String) {
    let entries = zip_entries(world);
    assert!(!entries.is_empty(), "archive must not be empty");
    for entry in entries {
        assert!(entry.starts_with(&prefix), "{entry} escapes {prefix}");
    }
}

#[then("the archive contains \"{entry}\"")]
fn then_archive_contains(world: &mut PackagingWorld, entry: String) {
    assert!(zip_entries(world).contains(&entry), "missing {entry}");
}

#[then("the archive does not contain \"{entry}\"")]
fn then_archive_lacks(world: &mut PackagingWorld, entry: String) {
    assert!(!zip_entries(world).contains(&entry), "unexpected {entry}");
}

#[then("packaging fails with a version control error")]
fn then_vcs_error(world: &mut PackagingWorld) {
    let error = world.error.as_ref().expect("packaging failed");
    assert!(
        matches!(error, BuildError::VcsUnavailable { .. }),
        "unexpected error: {error}"
    );
    assert_eq!(error.exit_code(), addon_build::error::EXIT_BUILD_ERROR);
}

#[then("packaging fails with a manifest error")]
fn then_manifest_error(world: &mut PackagingWorld) {
    let error = world.error.as_ref().expect("packaging failed");
    assert!(
        matches!(error, BuildError::ManifestRead { .. }),
        "unexpected error: {error}"
    );
}

#[then("no archive is written")]
fn then_no_archive(world: &mut PackagingWorld) {
    assert!(world.output.is_none());
    let dist = output_dir(world);
    let leftovers = fs::read_dir(&dist).map_or(0, Iterator::count);
    assert_eq!(leftovers, 0, "{dist} must stay empty");
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/packaging.feature",
    name = "Package an addon checked out on a feature branch"
)]
fn scenario_package_feature_branch(world: PackagingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/packaging.feature",
    name = "Packaging outside version control fails"
)]
fn scenario_package_without_vcs(world: PackagingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/packaging.feature",
    name = "Packaging without a manifest fails"
)]
fn scenario_package_without_manifest(world: PackagingWorld) {
    let _ = world;
}
