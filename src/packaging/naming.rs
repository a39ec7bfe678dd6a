//! Archive naming policy for distributable addon builds.
//!
//! Constructs deterministic archive names in the format
//! `<name>-<version>-<branch>-<commit>.zip`.

use crate::metadata::BuildMetadata;
use std::fmt;

/// The fixed file extension for addon archives.
const ARCHIVE_EXTENSION: &str = ".zip";

/// A fully-qualified archive name.
///
/// Branch names may contain path separators (`feature/x`); those are
/// replaced by `-` so the name always denotes a single file.
///
/// # Examples
///
/// ```
/// use addon_build::metadata::BuildMetadata;
/// use addon_build::metadata::commit_hash::CommitHash;
/// use addon_build::packaging::naming::ArchiveName;
///
/// let hash: CommitHash = "abc1234".parse().expect("valid hash");
/// let metadata = BuildMetadata::new("myaddon", "1.2.0", "main", hash).expect("valid metadata");
///
/// let name = ArchiveName::new(&metadata);
/// assert_eq!(name.to_string(), "myaddon-1.2.0-main-abc1234.zip");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveName {
    name: String,
    version: String,
    branch: String,
    commit: String,
}

impl ArchiveName {
    /// Create an archive name from resolved build metadata.
    #[must_use]
    pub fn new(metadata: &BuildMetadata) -> Self {
        Self {
            name: metadata.name().to_owned(),
            version: metadata.version().to_owned(),
            branch: metadata.branch().replace(['/', '\\'], "-"),
            commit: metadata.commit_hash().as_str().to_owned(),
        }
    }

    /// Return the branch component as it appears in the filename.
    #[must_use]
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Return the filename as a string without consuming the value.
    #[must_use]
    pub fn filename(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ArchiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}{ARCHIVE_EXTENSION}",
            self.name, self.version, self.branch, self.commit
        )
    }
}
