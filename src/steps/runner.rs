//! Execution of verification groups.
//!
//! Within a group every step runs regardless of earlier failures, so one run
//! shows every problem. Composite runs stop at the first failing group: later
//! groups are recorded as skipped and none of their tools are started.

use super::{CompositeReport, GroupReport, StepGroup, StepOutcome, StepRecord, VerificationStep};
use crate::command::CommandRunner;
use crate::output::{group_summary, write_stderr_line};
use std::io::Write;

/// Runs step groups through a [`CommandRunner`], writing progress lines to a
/// status sink.
pub struct StepRunner<'a> {
    runner: &'a dyn CommandRunner,
    status: &'a mut dyn Write,
}

impl<'a> StepRunner<'a> {
    /// Create a runner that spawns tools with `runner` and reports progress
    /// to `status`.
    #[must_use]
    pub fn new(runner: &'a dyn CommandRunner, status: &'a mut dyn Write) -> Self {
        Self { runner, status }
    }

    /// Run every step of `group` in declared order.
    pub fn run_group(&mut self, group: &StepGroup) -> GroupReport {
        let mut records = Vec::with_capacity(group.steps().len());
        for step in group.steps() {
            write_stderr_line(self.status, format!("==> {}: {}", group.name(), step.label()));
            let outcome = self.run_step(step);
            write_stderr_line(self.status, format!("{}: {outcome}", step.label()));
            records.push(StepRecord {
                label: step.label().clone(),
                outcome,
            });
        }

        let report = GroupReport::new(group.name(), records);
        let failed = report.failures().len();
        write_stderr_line(
            self.status,
            group_summary(group.name(), report.records().len(), failed),
        );
        log::info!("group {} finished: {failed} failed", group.name());
        report
    }

    /// Run `groups` in order, stopping after the first group that fails.
    pub fn run_composite(&mut self, name: &str, groups: &[StepGroup]) -> CompositeReport {
        let mut reports: Vec<GroupReport> = Vec::with_capacity(groups.len());
        let mut skipped = Vec::new();
        for group in groups {
            if let Some(failed) = reports.iter().find(|report| !report.passed()) {
                write_stderr_line(
                    self.status,
                    format!(
                        "==> {name}: skipping {} because {} failed",
                        group.name(),
                        failed.group()
                    ),
                );
                skipped.push(group.name().to_owned());
                continue;
            }
            reports.push(self.run_group(group));
        }
        CompositeReport::new(name, reports, skipped)
    }

    fn run_step(&self, step: &VerificationStep) -> StepOutcome {
        log::debug!("running `{}`", step.action());
        match self.runner.run(step.action()) {
            Ok(output) if output.status.success() => StepOutcome::Passed,
            Ok(output) => StepOutcome::Failed {
                exit_code: output.status.code(),
            },
            Err(err) => {
                log::warn!("could not run `{}`: {err}", step.action());
                StepOutcome::Errored {
                    message: err.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
