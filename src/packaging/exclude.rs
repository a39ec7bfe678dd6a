//! Glob-based exclusion of archive entries.

use super::archive_error::ArchiveError;
use camino::Utf8Path;
use glob::Pattern;

/// A compiled set of glob patterns.
///
/// A path is excluded when any pattern matches the whole relative path or
/// any single component of it, so `*.pyc` catches `lib/a/b.pyc` and
/// `__pycache__` catches the directory wherever it appears.
#[derive(Debug, Clone, Default)]
pub struct ExcludeSet {
    patterns: Vec<Pattern>,
}

impl ExcludeSet {
    /// Compile `patterns`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidPattern`] for the first pattern that is
    /// not a valid glob.
    pub fn new<I, S>(patterns: I) -> Result<Self, ArchiveError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|raw| {
                let raw = raw.as_ref();
                Pattern::new(raw).map_err(|err| ArchiveError::InvalidPattern {
                    pattern: raw.to_owned(),
                    reason: err.msg.to_owned(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Return `true` when the set holds no patterns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Return `true` when any pattern matches the bare `name`.
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches(name))
    }

    /// Return `true` when `relative` (a path relative to the archive source
    /// root) should be left out of the archive.
    #[must_use]
    pub fn is_excluded(&self, relative: &Utf8Path) -> bool {
        let joined = relative
            .components()
            .map(|component| component.as_str())
            .collect::<Vec<_>>()
            .join("/");
        self.matches_name(&joined)
            || relative
                .components()
                .any(|component| self.matches_name(component.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn defaults() -> ExcludeSet {
        ExcludeSet::new(["*.new", "*.orig", "*.pyc", "*.pyo", "__pycache__"])
            .expect("valid patterns")
    }

    #[rstest]
    #[case::top_level("addon.xml.orig")]
    #[case::nested_file("lib/routing/__init__.pyc")]
    #[case::deep_file("lib/a/b/c.pyo")]
    #[case::cache_dir("lib/__pycache__")]
    #[case::inside_cache_dir("lib/__pycache__/routing.cpython-311.opt-1.pyc")]
    #[case::backup("resources/settings.xml.new")]
    fn excludes_matching_paths(defaults: ExcludeSet, #[case] path: &str) {
        assert!(defaults.is_excluded(Utf8Path::new(path)));
    }

    #[rstest]
    #[case::manifest("addon.xml")]
    #[case::source("lib/routing.py")]
    #[case::similar_name("lib/pyc_helpers.py")]
    #[case::resource("resources/language/strings.po")]
    fn keeps_other_paths(defaults: ExcludeSet, #[case] path: &str) {
        assert!(!defaults.is_excluded(Utf8Path::new(path)));
    }

    #[test]
    fn full_path_patterns_match_across_separators() {
        let set = ExcludeSet::new(["resources/skins/*"]).expect("valid pattern");
        assert!(set.is_excluded(Utf8Path::new("resources/skins/default/a.png")));
        assert!(!set.is_excluded(Utf8Path::new("resources/icon.png")));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = ExcludeSet::new(["[unclosed"]).expect_err("invalid glob");
        assert!(matches!(
            err,
            ArchiveError::InvalidPattern { ref pattern, .. } if pattern == "[unclosed"
        ));
    }

    #[test]
    fn empty_set_excludes_nothing() {
        let set = ExcludeSet::default();
        assert!(set.is_empty());
        assert!(!set.is_excluded(Utf8Path::new("lib/a.pyc")));
    }
}
