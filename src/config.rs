//! Project configuration loaded from `addon-build.toml`.
//!
//! Every table is optional. A missing file yields the defaults, which
//! describe a conventional Kodi addon layout: an `addon.xml` manifest,
//! Python sources under `lib/`, tests under `test/`, and tox, pylint and
//! `kodi-addon-checker` as the external tools.

use crate::cleaner::Cleaner;
use crate::error::{BuildError, Result};
use crate::packaging::exclude::ExcludeSet;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

/// Configuration file looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "addon-build.toml";

/// Complete build configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Manifest location relative to the project root.
    pub manifest: Utf8PathBuf,
    /// Archive contents and destination.
    pub package: PackageConfig,
    /// Patterns removed by the cleaner.
    pub clean: CleanConfig,
    /// Environment given to every verification step.
    pub environment: EnvironmentConfig,
    /// Static-analysis steps.
    pub sanity: StepsConfig,
    /// Unit-test steps.
    pub unit: StepsConfig,
    /// Host compatibility checks.
    pub addon: AddonConfig,
    #[serde(skip)]
    source: Option<Utf8PathBuf>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            manifest: Utf8PathBuf::from("addon.xml"),
            package: PackageConfig::default(),
            clean: CleanConfig::default(),
            environment: EnvironmentConfig::default(),
            sanity: StepsConfig {
                steps: vec![
                    StepConfig::new("tox", &["tox"]),
                    StepConfig::new("pylint", &["pylint", "lib/", "test/"]),
                ],
            },
            unit: StepsConfig {
                steps: vec![StepConfig::new("unit", &["python", "test/run.py"])],
            },
            addon: AddonConfig::default(),
            source: None,
        }
    }
}

impl BuildConfig {
    /// Load the configuration for `project_root`.
    ///
    /// With `explicit` set, that file must exist (relative paths are taken
    /// from the project root). Otherwise `addon-build.toml` in the project
    /// root is used when present and the defaults when not.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidConfig`] if the file cannot be read,
    /// is not valid TOML, contains unknown keys, or fails validation.
    pub fn load(project_root: &Utf8Path, explicit: Option<&Utf8Path>) -> Result<Self> {
        let path = explicit.map_or_else(
            || project_root.join(CONFIG_FILE_NAME),
            |path| project_root.join(path),
        );
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if explicit.is_none() && err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no {path}; using default configuration");
                return Ok(Self::default());
            }
            Err(err) => return Err(invalid(&path, err.to_string())),
        };
        Self::parse(&contents, &path)
    }

    /// Parse and validate configuration text read from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidConfig`] naming `path` when the text is
    /// unusable.
    pub fn parse(contents: &str, path: &Utf8Path) -> Result<Self> {
        let mut config: Self =
            toml::from_str(contents).map_err(|err| invalid(path, err.to_string()))?;
        config.source = Some(path.to_owned());
        config.validate()?;
        log::debug!("loaded configuration from {path}");
        Ok(config)
    }

    /// Return the file this configuration came from, if any.
    #[must_use]
    pub fn source(&self) -> Option<&Utf8Path> {
        self.source.as_deref()
    }

    /// Compile the archive exclusion patterns.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidConfig`] if a pattern is not a valid glob.
    pub fn package_excludes(&self) -> Result<ExcludeSet> {
        self.patterns(&self.package.exclude)
    }

    /// Build the cleaner described by the `[clean]` table.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidConfig`] if a pattern is not a valid glob.
    pub fn cleaner(&self) -> Result<Cleaner> {
        Ok(Cleaner::new(
            self.patterns(&self.clean.recursive)?,
            self.patterns(&self.clean.root)?,
        ))
    }

    fn patterns(&self, raw: &[String]) -> Result<ExcludeSet> {
        ExcludeSet::new(raw).map_err(|err| invalid(self.origin(), err.to_string()))
    }

    /// Return the path reported in configuration errors.
    pub(crate) fn origin(&self) -> &Utf8Path {
        self.source().unwrap_or(Utf8Path::new(CONFIG_FILE_NAME))
    }

    fn validate(&self) -> Result<()> {
        let fail = |reason: String| Err(invalid(self.origin(), reason));

        if self.manifest.as_str().trim().is_empty() {
            return fail("`manifest` must not be empty".to_owned());
        }
        if self.environment.search_path_var.trim().is_empty() {
            return fail("`environment.search_path_var` must not be empty".to_owned());
        }
        if self.addon.checker.is_empty() {
            return fail("`addon.checker` must name a program".to_owned());
        }
        for (group, steps) in [("sanity", &self.sanity), ("unit", &self.unit)] {
            for step in &steps.steps {
                if step.label.trim().is_empty() {
                    return fail(format!("a `{group}` step has an empty label"));
                }
                if step.command.is_empty() {
                    return fail(format!(
                        "`{group}` step `{}` has an empty command",
                        step.label
                    ));
                }
            }
        }
        self.package_excludes()?;
        self.cleaner()?;
        Ok(())
    }
}

fn invalid(path: &Utf8Path, reason: String) -> BuildError {
    BuildError::InvalidConfig {
        path: path.to_owned(),
        reason,
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}

/// The `[package]` table.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PackageConfig {
    /// Paths placed in the archive, relative to the project root, in order.
    pub include: Vec<Utf8PathBuf>,
    /// Glob patterns for entries left out of the archive.
    pub exclude: Vec<String>,
    /// Archive destination, relative to the project root.
    pub output_dir: Utf8PathBuf,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            include: ["addon.xml", "LICENSE", "README.md", "lib", "resources"]
                .into_iter()
                .map(Utf8PathBuf::from)
                .collect(),
            exclude: strings(&["*.new", "*.orig", "*.pyc", "*.pyo", "__pycache__"]),
            output_dir: Utf8PathBuf::from(".."),
        }
    }
}

/// The `[clean]` table.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CleanConfig {
    /// Patterns matched against names anywhere under the project root.
    pub recursive: Vec<String>,
    /// Patterns matched against names directly inside the project root.
    pub root: Vec<String>,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            recursive: strings(&["*.pyc", "*.pyo", "__pycache__"]),
            root: strings(&[".pytest_cache", ".tox", "*.log"]),
        }
    }
}

/// The `[environment]` table.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EnvironmentConfig {
    /// Name of the library search path variable.
    pub search_path_var: String,
    /// Directories placed on the search path; relative entries are resolved
    /// against the project root.
    pub search_path: Vec<Utf8PathBuf>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            search_path_var: "PYTHONPATH".to_owned(),
            search_path: vec![Utf8PathBuf::from("lib"), Utf8PathBuf::from("test")],
        }
    }
}

/// A `[sanity]` or `[unit]` table.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StepsConfig {
    /// Steps in execution order.
    pub steps: Vec<StepConfig>,
}

/// One configured verification step.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StepConfig {
    /// Name shown in status output.
    pub label: String,
    /// Program followed by its arguments.
    pub command: Vec<String>,
}

impl StepConfig {
    /// Create a step running `command` under `label`.
    #[must_use]
    pub fn new(label: &str, command: &[&str]) -> Self {
        Self {
            label: label.to_owned(),
            command: strings(command),
        }
    }
}

/// The `[addon]` table.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AddonConfig {
    /// Checker program and any leading arguments.
    pub checker: Vec<String>,
    /// Host compatibility branches, checked in order.
    pub branches: Vec<String>,
}

impl Default for AddonConfig {
    fn default() -> Self {
        Self {
            checker: strings(&["kodi-addon-checker"]),
            branches: strings(&["krypton", "leia"]),
        }
    }
}
