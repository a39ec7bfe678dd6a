//! User-facing status output.
//!
//! Status lines go to a caller-supplied writer (stderr in the binary) and
//! results to another (stdout) so both can be captured in tests. Diagnostics belong in the log instead.

use std::fmt::Display;
use std::io::Write;

/// Write `message` followed by a newline, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; a closed stderr must not abort the build.
    }
}

/// Write a machine-readable result line to `stdout`, ignoring write
/// failures.
pub fn write_stdout_line(stdout: &mut dyn Write, message: impl Display) {
    if writeln!(stdout, "{message}").is_err() {
        // A closed pipe must not turn a finished build into a failure.
    }
}

/// Format the summary line printed after a step group finishes.
#[must_use]
pub fn group_summary(group: &str, total: usize, failed: usize) -> String {
    let noun = if total == 1 { "step" } else { "steps" };
    if failed == 0 {
        format!("{group}: all {total} {noun} passed")
    } else {
        format!("{group}: {failed} of {total} {noun} failed")
    }
}
