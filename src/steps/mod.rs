//! Verification steps and their outcomes.
//!
//! A [`StepGroup`] is an ordered list of [`VerificationStep`]s. Running a
//! group yields a [`GroupReport`] holding one [`StepOutcome`] per step;
//! composite runs chain several groups into a [`CompositeReport`].
//!
//! # Sub-modules
//!
//! - [`groups`]: Builds the sanity, unit, and addon groups from configuration.
//! - [`runner`]: Executes groups (`StepRunner`).

pub mod groups;
pub mod runner;

use crate::command::Invocation;
use crate::error::{BuildError, Result};
use std::fmt;

/// Name of a verification step as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StepLabel(String);

impl StepLabel {
    /// Return the label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StepLabel {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for StepLabel {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for StepLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named external check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationStep {
    label: StepLabel,
    action: Invocation,
}

impl VerificationStep {
    /// Create a step that runs `action`.
    #[must_use]
    pub fn new(label: impl Into<StepLabel>, action: Invocation) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }

    /// Return the step label.
    #[must_use]
    pub fn label(&self) -> &StepLabel {
        &self.label
    }

    /// Return the command the step runs.
    #[must_use]
    pub fn action(&self) -> &Invocation {
        &self.action
    }
}

/// An ordered, named collection of steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepGroup {
    name: String,
    steps: Vec<VerificationStep>,
}

impl StepGroup {
    /// Create a group running `steps` in order.
    #[must_use]
    pub fn new(name: impl Into<String>, steps: Vec<VerificationStep>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }

    /// Return the group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[VerificationStep] {
        &self.steps
    }
}

/// How a single step ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The tool exited successfully.
    Passed,
    /// The tool ran and reported failure.
    Failed {
        /// The tool's exit code; `None` when it was ended by a signal.
        exit_code: Option<i32>,
    },
    /// The tool could not be run at all.
    Errored {
        /// Why the tool could not be run.
        message: String,
    },
}

impl StepOutcome {
    /// Return `true` for [`StepOutcome::Passed`].
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => f.write_str("passed"),
            Self::Failed {
                exit_code: Some(code),
            } => write!(f, "FAILED (exit {code})"),
            Self::Failed { exit_code: None } => f.write_str("FAILED (no exit code)"),
            Self::Errored { message } => write!(f, "FAILED (could not run: {message})"),
        }
    }
}

/// A failed step: its label and what the tool reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    label: StepLabel,
    exit_code: Option<i32>,
    error: Option<String>,
}

impl StepFailure {
    /// Record a step whose tool exited with `exit_code`.
    #[must_use]
    pub fn new(label: StepLabel, exit_code: Option<i32>) -> Self {
        Self {
            label,
            exit_code,
            error: None,
        }
    }

    /// Record a step whose tool could not be run.
    #[must_use]
    pub fn errored(label: StepLabel, message: impl Into<String>) -> Self {
        Self {
            label,
            exit_code: None,
            error: Some(message.into()),
        }
    }

    /// Return the failing step's label.
    #[must_use]
    pub fn label(&self) -> &StepLabel {
        &self.label
    }

    /// Return the tool's exit code, if it produced one.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.exit_code, &self.error) {
            (Some(code), _) => write!(f, "{} (exit {code})", self.label),
            (None, Some(error)) => write!(f, "{} (could not run: {error})", self.label),
            (None, None) => write!(f, "{} (no exit code)", self.label),
        }
    }
}

/// The outcome of one step within a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    /// The step label.
    pub label: StepLabel,
    /// How the step ended.
    pub outcome: StepOutcome,
}

impl StepRecord {
    fn failure(&self) -> Option<StepFailure> {
        match &self.outcome {
            StepOutcome::Passed => None,
            StepOutcome::Failed { exit_code } => {
                Some(StepFailure::new(self.label.clone(), *exit_code))
            }
            StepOutcome::Errored { message } => {
                Some(StepFailure::errored(self.label.clone(), message.clone()))
            }
        }
    }
}

/// Outcomes of every step in one group, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReport {
    group: String,
    records: Vec<StepRecord>,
}

impl GroupReport {
    /// Create a report for `group`.
    #[must_use]
    pub fn new(group: impl Into<String>, records: Vec<StepRecord>) -> Self {
        Self {
            group: group.into(),
            records,
        }
    }

    /// Return the group name.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Return the per-step records.
    #[must_use]
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Return `true` when every step passed. An empty group passes.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.records.iter().all(|record| record.outcome.passed())
    }

    /// Return every failing step, in execution order.
    #[must_use]
    pub fn failures(&self) -> Vec<StepFailure> {
        self.records.iter().filter_map(StepRecord::failure).collect()
    }

    /// Convert the report into `Ok(())` or [`BuildError::StepsFailed`].
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::StepsFailed`] listing every failed step.
    pub fn into_result(self) -> Result<()> {
        let failures = self.failures();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(BuildError::StepsFailed {
                group: self.group,
                failures,
            })
        }
    }
}

/// Outcome of a chain of groups that stops at the first failing group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeReport {
    name: String,
    groups: Vec<GroupReport>,
    skipped: Vec<String>,
}

impl CompositeReport {
    /// Create a composite report.
    #[must_use]
    pub fn new(name: impl Into<String>, groups: Vec<GroupReport>, skipped: Vec<String>) -> Self {
        Self {
            name: name.into(),
            groups,
            skipped,
        }
    }

    /// Return the composite name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the reports of the groups that ran.
    #[must_use]
    pub fn groups(&self) -> &[GroupReport] {
        &self.groups
    }

    /// Return the names of groups that never ran.
    #[must_use]
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// Return `true` when every member group ran and passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.skipped.is_empty() && self.groups.iter().all(GroupReport::passed)
    }

    /// Convert the report into `Ok(())` or the first group failure.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::StepsFailed`] for the group that stopped the
    /// chain.
    pub fn into_result(self) -> Result<()> {
        self.groups
            .into_iter()
            .try_for_each(GroupReport::into_result)
    }
}
