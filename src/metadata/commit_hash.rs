//! The commit component of an archive name.
//!
//! Values come from `git rev-parse --short HEAD`. Git abbreviates to at least
//! seven hex digits and, with `core.abbrev=no`, prints the whole object name:
//! 40 digits in a SHA-1 repository, 64 in a SHA-256 one.

use crate::error::{BuildError, Result};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Lengths git can print for an object name, from the shortest abbreviation
/// to a full SHA-256 name.
const OBJECT_NAME_LEN: RangeInclusive<usize> = 7..=64;

/// An abbreviated or full git object name in lowercase hex.
///
/// # Examples
///
/// ```
/// use addon_build::metadata::commit_hash::CommitHash;
///
/// let hash: CommitHash = "abc1234".parse().expect("valid hash");
/// assert_eq!(hash.as_str(), "abc1234");
/// assert!("ABC1234".parse::<CommitHash>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitHash(String);

impl CommitHash {
    /// Return the hash as printed by git.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CommitHash {
    type Err = BuildError;

    fn from_str(value: &str) -> Result<Self> {
        let problem = if !OBJECT_NAME_LEN.contains(&value.len()) {
            Some(format!(
                "expected {} to {} hex digits, got {}",
                OBJECT_NAME_LEN.start(),
                OBJECT_NAME_LEN.end(),
                value.len()
            ))
        } else {
            value
                .chars()
                .find(|c| !matches!(c, '0'..='9' | 'a'..='f'))
                .map(|bad| format!("'{bad}' is not a lowercase hex digit"))
        };
        match problem {
            Some(reason) => Err(BuildError::InvalidMetadata {
                reason: format!("commit `{value}` from git: {reason}"),
            }),
            None => Ok(Self(value.to_owned())),
        }
    }
}

impl TryFrom<String> for CommitHash {
    type Error = BuildError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
