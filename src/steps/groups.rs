//! Construction of the verification groups from configuration.
//!
//! Every step runs from the project root with the library search path
//! variable pointing at the configured directories, and passes the tool's
//! own output straight through to the terminal.

use super::{StepGroup, VerificationStep};
use crate::command::{Invocation, StdioMode};
use crate::config::{AddonConfig, BuildConfig, StepConfig};
use crate::dispatch::resolve_path;
use crate::error::{BuildError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::ffi::OsString;

/// Name of the static-analysis group.
pub const SANITY: &str = "sanity";

/// Name of the unit-test group.
pub const UNIT: &str = "unit";

/// Name of the host compatibility group.
pub const ADDON: &str = "addon";

/// Name of the composite run of [`SANITY`] then [`UNIT`].
pub const TEST: &str = "test";

/// Builds [`StepGroup`]s that share a working directory and environment.
#[derive(Debug, Clone)]
pub struct GroupBuilder {
    project_root: Utf8PathBuf,
    search_path_var: String,
    search_path: OsString,
}

impl GroupBuilder {
    /// Prepare groups for `project_root` using the `[environment]` settings
    /// of `config`.
    ///
    /// Relative search path entries are anchored at `project_root`, and tools
    /// that change directory still find the project modules.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidConfig`] if a search path entry contains
    /// the platform's path list separator.
    pub fn new(project_root: &Utf8Path, config: &BuildConfig) -> Result<Self> {
        let entries = config
            .environment
            .search_path
            .iter()
            .map(|entry| resolve_path(project_root, entry));
        let search_path =
            std::env::join_paths(entries).map_err(|err| BuildError::InvalidConfig {
                path: config.origin().to_owned(),
                reason: format!("`environment.search_path`: {err}"),
            })?;
        Ok(Self {
            project_root: project_root.to_owned(),
            search_path_var: config.environment.search_path_var.clone(),
            search_path,
        })
    }

    /// Build the group `name` from configured steps.
    #[must_use]
    pub fn group(&self, name: &str, steps: &[StepConfig]) -> StepGroup {
        let steps = steps
            .iter()
            .filter_map(|step| {
                Invocation::from_argv(&step.command).map(|invocation| {
                    VerificationStep::new(step.label.as_str(), self.prepare(invocation))
                })
            })
            .collect();
        StepGroup::new(name, steps)
    }

    /// Build the compatibility group: one checker run per branch.
    #[must_use]
    pub fn addon_group(&self, config: &AddonConfig) -> StepGroup {
        let steps = Invocation::from_argv(&config.checker).map_or_else(Vec::new, |checker| {
            config
                .branches
                .iter()
                .map(|branch| {
                    let invocation = checker.clone().arg(format!("--branch={branch}"));
                    VerificationStep::new(
                        format!("{} ({branch})", checker.program()),
                        self.prepare(invocation),
                    )
                })
                .collect()
        });
        StepGroup::new(ADDON, steps)
    }

    /// Build the sanity group from `config`.
    #[must_use]
    pub fn sanity(&self, config: &BuildConfig) -> StepGroup {
        self.group(SANITY, &config.sanity.steps)
    }

    /// Build the unit group from `config`.
    #[must_use]
    pub fn unit(&self, config: &BuildConfig) -> StepGroup {
        self.group(UNIT, &config.unit.steps)
    }

    fn prepare(&self, invocation: Invocation) -> Invocation {
        invocation
            .current_dir(self.project_root.clone())
            .env(self.search_path_var.clone(), self.search_path.clone())
            .stdio(StdioMode::Inherit)
    }
}
