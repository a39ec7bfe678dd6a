//! Build metadata resolution.
//!
//! Combines the addon manifest and version-control state into an immutable
//! [`BuildMetadata`] value that feeds archive naming and packaging.
//!
//! # Sub-modules
//!
//! - [`commit_hash`]: Commit hash newtype (`CommitHash`).
//! - [`manifest`]: Addon manifest reading (`AddonManifest`).
//! - [`vcs`]: Branch and commit queries (`Vcs`).

pub mod commit_hash;
pub mod manifest;
pub mod vcs;

use crate::command::CommandRunner;
use crate::error::{BuildError, Result};
use camino::Utf8Path;
use commit_hash::CommitHash;
use manifest::AddonManifest;
use vcs::Vcs;

/// Identity of one build: addon name and version plus the branch and commit
/// it was built from.
///
/// All fields are non-empty; the value cannot change once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildMetadata {
    name: String,
    version: String,
    branch: String,
    commit_hash: CommitHash,
}

impl BuildMetadata {
    /// Create metadata from already-resolved components.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidMetadata`] if any text field is blank,
    /// or if the name or version is not a plain file name component (it
    /// contains a path separator or is `.` or `..`).
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        branch: impl Into<String>,
        commit_hash: CommitHash,
    ) -> Result<Self> {
        let name = single_component("name", non_blank("name", name.into())?)?;
        let version = single_component("version", non_blank("version", version.into())?)?;
        let branch = non_blank("branch", branch.into())?;
        Ok(Self {
            name,
            version,
            branch,
            commit_hash,
        })
    }

    /// Return the addon name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the addon version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Return the branch the build was made from.
    #[must_use]
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Return the commit the build was made from.
    #[must_use]
    pub fn commit_hash(&self) -> &CommitHash {
        &self.commit_hash
    }
}

fn non_blank(field: &str, value: String) -> Result<String> {
    if value.trim().is_empty() {
        return Err(BuildError::InvalidMetadata {
            reason: format!("{field} must not be empty"),
        });
    }
    Ok(value)
}

/// Name and version end up in the archive filename and must not steer it
/// into another directory.
fn single_component(field: &str, value: String) -> Result<String> {
    if value.contains(['/', '\\']) || value == "." || value == ".." {
        return Err(BuildError::InvalidMetadata {
            reason: format!("{field} `{value}` must not contain path separators"),
        });
    }
    Ok(value)
}

/// Resolves [`BuildMetadata`] for a project.
pub struct MetadataResolver<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> MetadataResolver<'a> {
    /// Create a resolver that queries version control through `runner`.
    #[must_use]
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Read the manifest at `project_root/manifest` and the working copy
    /// containing `project_root`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ManifestRead`], [`BuildError::VcsUnavailable`],
    /// or [`BuildError::InvalidMetadata`] when the inputs are unusable.
    pub fn resolve(&self, project_root: &Utf8Path, manifest: &Utf8Path) -> Result<BuildMetadata> {
        let manifest_path = manifest::manifest_path(project_root, manifest);
        let addon = AddonManifest::load(&manifest_path)?;
        log::debug!(
            "manifest {manifest_path}: name={} version={}",
            addon.name(),
            addon.version()
        );

        let vcs = Vcs::open(project_root, self.runner)?;
        let branch = vcs.current_branch()?;
        let commit_hash = CommitHash::try_from(vcs.short_commit()?)?;
        log::debug!("working copy at {project_root}: branch={branch} commit={commit_hash}");

        BuildMetadata::new(addon.name(), addon.version(), branch, commit_hash)
    }
}
