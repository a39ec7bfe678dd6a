//! Removal of transient build and test artefacts.
//!
//! Two pattern sets drive the cleaner: recursive patterns are matched against
//! every file and directory name under the project root, root patterns only
//! against names directly inside it. Version-control metadata is never
//! entered. Failures to remove an entry are reported as warnings; the cleaner
//! itself never fails.

use crate::packaging::exclude::ExcludeSet;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

/// Directory names the cleaner never enters.
const VCS_DIRS: &[&str] = &[".git", ".hg", ".svn"];

/// A path the cleaner matched but could not remove.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("could not remove {path}: {reason}")]
pub struct CleanupWarning {
    /// The path that survived.
    pub path: Utf8PathBuf,
    /// Why removal failed.
    pub reason: String,
}

/// What a cleaning pass did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanReport {
    /// Paths removed, in traversal order.
    pub removed: Vec<Utf8PathBuf>,
    /// Paths that matched but could not be removed.
    pub warnings: Vec<CleanupWarning>,
}

impl CleanReport {
    /// Return `true` when every matched path was removed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Removes artefacts matching the configured patterns.
#[derive(Debug, Clone, Default)]
pub struct Cleaner {
    recursive: ExcludeSet,
    root: ExcludeSet,
}

impl Cleaner {
    /// Create a cleaner from recursive and root-only pattern sets.
    #[must_use]
    pub fn new(recursive: ExcludeSet, root: ExcludeSet) -> Self {
        Self { recursive, root }
    }

    /// Remove every match under `project_root`.
    ///
    /// Matching directories are removed with their contents and not
    /// descended into. Running the cleaner twice removes nothing the second
    /// time.
    pub fn clean(&self, project_root: &Utf8Path) -> CleanReport {
        let mut report = CleanReport::default();
        let mut walker = WalkDir::new(project_root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map_or_else(|| project_root.to_owned(), lossy_utf8);
                    warn(&mut report, path, err.to_string());
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy();
            let is_dir = entry.file_type().is_dir();
            if is_dir && VCS_DIRS.iter().any(|vcs| name == *vcs) {
                walker.skip_current_dir();
                continue;
            }

            let matched = self.recursive.matches_name(&name)
                || (entry.depth() == 1 && self.root.matches_name(&name));
            if !matched {
                continue;
            }
            if is_dir {
                walker.skip_current_dir();
            }

            let path = lossy_utf8(entry.path());
            let removal = if is_dir {
                fs::remove_dir_all(entry.path())
            } else {
                fs::remove_file(entry.path())
            };
            match removal {
                Ok(()) => {
                    log::debug!("removed {path}");
                    report.removed.push(path);
                }
                Err(err) => warn(&mut report, path, err.to_string()),
            }
        }

        log::info!(
            "cleaned {project_root}: {} removed, {} warnings",
            report.removed.len(),
            report.warnings.len()
        );
        report
    }
}

fn warn(report: &mut CleanReport, path: Utf8PathBuf, reason: String) {
    let warning = CleanupWarning { path, reason };
    log::warn!("{warning}");
    report.warnings.push(warning);
}

fn lossy_utf8(path: &Path) -> Utf8PathBuf {
    Utf8PathBuf::from(path.to_string_lossy().into_owned())
}
