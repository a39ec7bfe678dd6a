//! Addon packaging: naming, filtering, and writing the distributable zip.
//!
//! # Sub-modules
//!
//! - [`archive`]: Deterministic, atomic zip writing (`ArchiveSpec`).
//! - [`archive_error`]: Error types for archive writing.
//! - [`exclude`]: Glob exclusion patterns (`ExcludeSet`).
//! - [`naming`]: Archive naming policy (`ArchiveName`).
//!
//! The packaging flow runs as a fixed sequence of stages:
//! clean, resolve metadata, name the archive, write it. Any error ends the
//! flow without leaving a partial archive at the destination.

pub mod archive;
pub mod archive_error;
pub mod exclude;
pub mod naming;

use crate::cleaner::Cleaner;
use crate::command::CommandRunner;
use crate::error::Result;
use crate::metadata::{BuildMetadata, MetadataResolver};
use archive::{ArchiveSpec, ArchivedFile};
use camino::{Utf8Path, Utf8PathBuf};
use exclude::ExcludeSet;
use naming::ArchiveName;
use std::fmt;

/// Progress of a packaging run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackagingStage {
    /// Nothing has happened yet.
    Start,
    /// Transient artefacts have been removed.
    Cleaned,
    /// Manifest and version control have been read.
    MetadataResolved,
    /// The archive filename is known.
    Named,
    /// The archive has been written.
    Archived,
    /// The run finished successfully.
    Done,
    /// The run stopped on an error.
    Failed,
}

impl fmt::Display for PackagingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Start => "start",
            Self::Cleaned => "cleaned",
            Self::MetadataResolved => "metadata resolved",
            Self::Named => "named",
            Self::Archived => "archived",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Inputs for [`package_addon`].
#[derive(Debug)]
pub struct PackageParams<'a> {
    /// The addon project directory.
    pub project_root: &'a Utf8Path,
    /// Manifest location relative to `project_root`.
    pub manifest: &'a Utf8Path,
    /// Paths to archive, relative to `project_root`, in order.
    pub include: &'a [Utf8PathBuf],
    /// Patterns for entries to leave out.
    pub exclude: &'a ExcludeSet,
    /// Directory the archive is written into.
    pub output_dir: &'a Utf8Path,
}

/// Result of a successful [`package_addon`] run.
#[derive(Debug)]
pub struct PackageOutput {
    /// The metadata the archive was built from.
    pub metadata: BuildMetadata,
    /// The archive filename.
    pub name: ArchiveName,
    /// The archive on disk.
    pub archive: ArchivedFile,
}

/// Clean the project, then build its distributable archive.
///
/// # Errors
///
/// Returns the first resolver or archiver error; the destination archive
/// does not exist afterwards.
pub fn package_addon(
    params: &PackageParams<'_>,
    cleaner: &Cleaner,
    runner: &dyn CommandRunner,
) -> Result<PackageOutput> {
    enter(PackagingStage::Start);
    run_stages(params, cleaner, runner)
        .inspect(|_| enter(PackagingStage::Done))
        .inspect_err(|err| log::debug!("packaging: {} ({err})", PackagingStage::Failed))
}

fn run_stages(
    params: &PackageParams<'_>,
    cleaner: &Cleaner,
    runner: &dyn CommandRunner,
) -> Result<PackageOutput> {
    cleaner.clean(params.project_root);
    enter(PackagingStage::Cleaned);

    let metadata = MetadataResolver::new(runner).resolve(params.project_root, params.manifest)?;
    enter(PackagingStage::MetadataResolved);

    let name = ArchiveName::new(&metadata);
    let destination = params.output_dir.join(name.filename());
    enter(PackagingStage::Named);

    let spec = ArchiveSpec::new(
        metadata.name(),
        params.project_root,
        params.include.to_vec(),
        params.exclude.clone(),
    )?;
    let archive = archive::archive(&spec, &destination)?;
    enter(PackagingStage::Archived);

    Ok(PackageOutput {
        metadata,
        name,
        archive,
    })
}

fn enter(stage: PackagingStage) {
    log::debug!("packaging: {stage}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildError;
    use crate::test_utils::{ExpectedCall, StubRunner, stdout_output};
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct Fixture {
        workspace: TempDir,
    }

    impl Fixture {
        fn root(&self) -> Utf8PathBuf {
            Utf8Path::from_path(self.workspace.path())
                .expect("utf-8 temp dir")
                .join("myaddon")
        }

        fn output_dir(&self) -> Utf8PathBuf {
            Utf8Path::from_path(self.workspace.path())
                .expect("utf-8 temp dir")
                .to_owned()
        }
    }

    #[fixture]
    fn fixture() -> Fixture {
        let fixture = Fixture {
            workspace: TempDir::new().expect("temp dir"),
        };
        let root = fixture.root();
        std::fs::create_dir_all(root.join("lib")).expect("create lib");
        std::fs::write(
            root.join("addon.xml"),
            r#"<addon id="myaddon" version="1.2.0"/>"#,
        )
        .expect("write manifest");
        std::fs::write(root.join("lib/routing.py"), "").expect("write source");
        std::fs::write(root.join("lib/routing.pyc"), "").expect("write bytecode");
        fixture
    }

    fn git_calls(commit: &'static str) -> Vec<ExpectedCall> {
        vec![
            ExpectedCall::new(
                "git",
                &["rev-parse", "--is-inside-work-tree"],
                Ok(stdout_output("true\n")),
            ),
            ExpectedCall::new(
                "git",
                &["rev-parse", "--abbrev-ref", "HEAD"],
                Ok(stdout_output("main\n")),
            ),
            ExpectedCall::new(
                "git",
                &["rev-parse", "--short", "HEAD"],
                Ok(stdout_output(commit)),
            ),
        ]
    }

    fn cleaner() -> Cleaner {
        Cleaner::new(
            ExcludeSet::new(["*.pyc"]).expect("valid pattern"),
            ExcludeSet::default(),
        )
    }

    #[rstest]
    fn packages_named_archive_in_output_dir(fixture: Fixture) {
        let root = fixture.root();
        let output_dir = fixture.output_dir();
        let include = [Utf8PathBuf::from("addon.xml"), Utf8PathBuf::from("lib")];
        let exclude = ExcludeSet::new(["*.pyc"]).expect("valid pattern");
        let runner = StubRunner::new(git_calls("abc1234\n"));

        let output = package_addon(
            &PackageParams {
                project_root: &root,
                manifest: Utf8Path::new("addon.xml"),
                include: &include,
                exclude: &exclude,
                output_dir: &output_dir,
            },
            &cleaner(),
            &runner,
        )
        .expect("packaging succeeds");

        assert_eq!(output.name.filename(), "myaddon-1.2.0-main-abc1234.zip");
        assert_eq!(
            output.archive.path(),
            output_dir.join("myaddon-1.2.0-main-abc1234.zip")
        );
        assert_eq!(
            output.archive.entries(),
            [
                "myaddon/",
                "myaddon/addon.xml",
                "myaddon/lib/",
                "myaddon/lib/routing.py"
            ]
        );
        assert!(!root.join("lib/routing.pyc").exists(), "cleaner ran first");
        runner.assert_finished();
    }

    #[rstest]
    fn resolver_failure_writes_nothing(fixture: Fixture) {
        let root = fixture.root();
        let output_dir = fixture.output_dir();
        let include = [Utf8PathBuf::from("addon.xml")];
        let exclude = ExcludeSet::default();
        let runner = StubRunner::new(git_calls("zzz\n"));

        let result = package_addon(
            &PackageParams {
                project_root: &root,
                manifest: Utf8Path::new("addon.xml"),
                include: &include,
                exclude: &exclude,
                output_dir: &output_dir,
            },
            &cleaner(),
            &runner,
        );

        assert!(matches!(result, Err(BuildError::InvalidMetadata { .. })));
        let zips = std::fs::read_dir(&output_dir)
            .expect("list output dir")
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "zip"))
            .count();
        assert_eq!(zips, 0);
    }

    #[rstest]
    fn version_with_separator_never_leaves_output_dir(fixture: Fixture) {
        let root = fixture.root();
        let output_dir = fixture.output_dir();
        std::fs::write(
            root.join("addon.xml"),
            r#"<addon id="myaddon" version="1.0/beta"/>"#,
        )
        .expect("write manifest");
        let include = [Utf8PathBuf::from("addon.xml")];
        let exclude = ExcludeSet::default();
        let runner = StubRunner::new(git_calls("abc1234\n"));

        let result = package_addon(
            &PackageParams {
                project_root: &root,
                manifest: Utf8Path::new("addon.xml"),
                include: &include,
                exclude: &exclude,
                output_dir: &output_dir,
            },
            &cleaner(),
            &runner,
        );

        assert!(matches!(result, Err(BuildError::InvalidMetadata { .. })));
        assert!(!output_dir.join("myaddon-1.0").exists());
    }

    #[test]
    fn stages_display_as_lowercase_labels() {
        assert_eq!(
            PackagingStage::MetadataResolved.to_string(),
            "metadata resolved"
        );
        assert_eq!(PackagingStage::Failed.to_string(), "failed");
    }
}
