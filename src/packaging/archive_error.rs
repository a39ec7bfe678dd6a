//! Error types for archive writing.
//!
//! Covers filesystem failures while reading sources or writing the archive,
//! zip encoding problems, and invalid inputs to the archiver.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors arising while writing a distributable archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Reading a source file or writing the archive failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path being read or written.
        path: Utf8PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The zip encoder rejected an entry or failed to finish.
    #[error("zip encoding error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// An exclude pattern is not a valid glob.
    #[error("invalid exclude pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Why the pattern was rejected.
        reason: String,
    },

    /// A path could not be placed in the archive.
    #[error("cannot archive {path}: {reason}")]
    InvalidPath {
        /// The offending path.
        path: Utf8PathBuf,
        /// Why the path was rejected.
        reason: String,
    },

    /// The finished archive could not be moved into place.
    #[error("cannot move archive into place at {path}: {source}")]
    Persist {
        /// The destination path.
        path: Utf8PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
}

impl ArchiveError {
    pub(crate) fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
