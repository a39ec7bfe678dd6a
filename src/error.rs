//! Error types for the addon build tool.
//!
//! This module defines semantic error variants for every stage of the build:
//! manifest and version-control resolution, verification steps, archive
//! writing, and configuration loading. Each variant names the input that
//! failed so the CLI can report an actionable message.

use crate::packaging::archive_error::ArchiveError;
use crate::steps::StepFailure;
use camino::Utf8PathBuf;
use std::fmt;
use thiserror::Error;

/// Process exit code used when a verification step failed.
pub const EXIT_VERIFICATION_FAILED: i32 = 1;

/// Process exit code used for every other failure.
pub const EXIT_BUILD_ERROR: i32 = 2;

/// Errors that can occur while building, checking, or packaging an addon.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The addon manifest is missing, unreadable, or lacks required attributes.
    #[error("cannot read manifest {path}: {reason}")]
    ManifestRead {
        /// Path to the manifest that failed to load.
        path: Utf8PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// The project is not inside a usable version-control working copy.
    #[error("version control unavailable at {path}: {reason}")]
    VcsUnavailable {
        /// Directory that was queried.
        path: Utf8PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// Resolved metadata violated an invariant (for example a blank field).
    #[error("invalid build metadata: {reason}")]
    InvalidMetadata {
        /// Description of the violated invariant.
        reason: String,
    },

    /// One or more verification steps in a group failed.
    #[error("{group} failed: {}", FailureList(.failures))]
    StepsFailed {
        /// Name of the group whose steps failed.
        group: String,
        /// Every failing step, in execution order.
        failures: Vec<StepFailure>,
    },

    /// Writing the distributable archive failed.
    #[error("archive write failed: {0}")]
    ArchiveWrite(#[from] ArchiveError),

    /// The build configuration file could not be used.
    #[error("invalid configuration {path}: {reason}")]
    InvalidConfig {
        /// Path to the configuration file.
        path: Utf8PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// The project directory does not exist or cannot be used.
    #[error("project directory {path} is unusable: {reason}")]
    ProjectNotFound {
        /// The directory that was requested.
        path: Utf8PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

impl BuildError {
    /// Return the process exit code for this error.
    ///
    /// Verification failures exit with 1 so scripts can tell "the checks
    /// ran and found problems" apart from "the build could not run".
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::StepsFailed { .. } => EXIT_VERIFICATION_FAILED,
            _ => EXIT_BUILD_ERROR,
        }
    }
}

/// Renders failing steps as `label (exit 1), label (exit 1)`.
struct FailureList<'a>(&'a [StepFailure]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, failure) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

/// Result type alias using [`BuildError`].
pub type Result<T> = std::result::Result<T, BuildError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::StepLabel;

    #[test]
    fn manifest_read_includes_path_and_reason() {
        let err = BuildError::ManifestRead {
            path: Utf8PathBuf::from("/work/addon.xml"),
            reason: "missing attribute `version`".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/work/addon.xml"));
        assert!(msg.contains("version"));
    }

    #[test]
    fn steps_failed_lists_every_failure() {
        let err = BuildError::StepsFailed {
            group: "sanity".to_owned(),
            failures: vec![
                StepFailure::new(StepLabel::from("tox"), Some(1)),
                StepFailure::new(StepLabel::from("pylint"), Some(16)),
            ],
        };
        assert_eq!(
            err.to_string(),
            "sanity failed: tox (exit 1), pylint (exit 16)"
        );
    }

    #[test]
    fn step_failures_use_verification_exit_code() {
        let err = BuildError::StepsFailed {
            group: "unit".to_owned(),
            failures: Vec::new(),
        };
        assert_eq!(err.exit_code(), EXIT_VERIFICATION_FAILED);
    }

    #[test]
    fn other_errors_use_build_error_exit_code() {
        let err = BuildError::VcsUnavailable {
            path: Utf8PathBuf::from("/work"),
            reason: "not a git repository".to_owned(),
        };
        assert_eq!(err.exit_code(), EXIT_BUILD_ERROR);
    }
}
