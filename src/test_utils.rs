//! Shared test utilities for the addon build crate.

use crate::command::{CommandRunner, Invocation};
use crate::error::{BuildError, Result};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a successful command `Output` whose stdout is `stdout`.
#[must_use]
pub fn stdout_output(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with exit code `code` and the given
/// stderr message.
#[must_use]
pub fn failure_output(code: i32, stderr: &str) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The program to execute (e.g., "git").
    pub program: &'static str,
    /// The arguments to pass to the program.
    pub args: Vec<&'static str>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

impl ExpectedCall {
    /// Expect `program args...` and answer with `result`.
    #[must_use]
    pub fn new(program: &'static str, args: &[&'static str], result: Result<Output>) -> Self {
        Self {
            program,
            args: args.to_vec(),
            result,
        }
    }
}

/// A stub implementation of `CommandRunner` for testing.
///
/// Records expected command invocations in order and returns predefined
/// results, allowing tests to verify command execution without side effects.
/// Every invocation actually received is kept for later inspection.
#[derive(Debug)]
pub struct StubRunner {
    expected: RefCell<VecDeque<ExpectedCall>>,
    received: RefCell<Vec<Invocation>>,
}

impl StubRunner {
    /// Creates a new `StubRunner` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
            received: RefCell::new(Vec::new()),
        }
    }

    /// Returns every invocation received so far, in order.
    #[must_use]
    pub fn received(&self) -> Vec<Invocation> {
        self.received.borrow().clone()
    }

    /// Returns `true` when no expected calls remain.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.expected.borrow().is_empty()
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.is_finished(),
            "expected no further command invocations"
        );
    }
}

impl CommandRunner for StubRunner {
    fn run(&self, invocation: &Invocation) -> Result<Output> {
        self.received.borrow_mut().push(invocation.clone());

        let Some(call) = self.expected.borrow_mut().pop_front() else {
            return Err(BuildError::StubMismatch {
                message: format!("unexpected invocation `{invocation}`"),
            });
        };

        let args: Vec<&str> = invocation.arguments().iter().map(String::as_str).collect();
        if call.program != invocation.program() || call.args != args {
            return Err(BuildError::StubMismatch {
                message: format!(
                    "expected `{} {}`, received `{invocation}`",
                    call.program,
                    call.args.join(" ")
                ),
            });
        }

        call.result
    }
}
