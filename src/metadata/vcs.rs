//! Version-control queries for build metadata.
//!
//! The branch and abbreviated commit are read through `git rev-parse`, run
//! via the [`CommandRunner`] capability so tests never need a real
//! repository.

use crate::command::{CommandRunner, Invocation};
use crate::error::{BuildError, Result};
use camino::{Utf8Path, Utf8PathBuf};

const GIT: &str = "git";

/// A git working copy rooted at (or containing) a project directory.
pub struct Vcs<'a> {
    root: Utf8PathBuf,
    runner: &'a dyn CommandRunner,
}

impl<'a> Vcs<'a> {
    /// Open the working copy containing `root`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::VcsUnavailable`] if git cannot be spawned or
    /// `root` is not inside a work tree.
    pub fn open(root: &Utf8Path, runner: &'a dyn CommandRunner) -> Result<Self> {
        let vcs = Self {
            root: root.to_owned(),
            runner,
        };
        let answer = vcs.rev_parse(&["--is-inside-work-tree"])?;
        if answer != "true" {
            return Err(vcs.unavailable(format!("not inside a work tree (git said `{answer}`)")));
        }
        Ok(vcs)
    }

    /// Return the checked-out branch name.
    ///
    /// A detached HEAD yields `HEAD`, which is what git reports.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::VcsUnavailable`] if git fails or prints nothing.
    pub fn current_branch(&self) -> Result<String> {
        self.rev_parse(&["--abbrev-ref", "HEAD"])
    }

    /// Return the abbreviated hash of the checked-out commit.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::VcsUnavailable`] if git fails or prints nothing.
    pub fn short_commit(&self) -> Result<String> {
        self.rev_parse(&["--short", "HEAD"])
    }

    fn rev_parse(&self, args: &[&str]) -> Result<String> {
        let invocation = Invocation::new(GIT)
            .arg("rev-parse")
            .args(args.iter().copied())
            .current_dir(self.root.clone());

        let output = self
            .runner
            .run(&invocation)
            .map_err(|err| self.unavailable(format!("cannot run `{invocation}`: {err}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.unavailable(format!("`{invocation}` failed: {}", stderr.trim())));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_owned();
        if stdout.is_empty() {
            return Err(self.unavailable(format!("`{invocation}` printed nothing")));
        }
        Ok(stdout)
    }

    fn unavailable(&self, reason: String) -> BuildError {
        BuildError::VcsUnavailable {
            path: self.root.clone(),
            reason,
        }
    }
}
