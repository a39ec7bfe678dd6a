//! Build orchestration for plugin-style addons.
//!
//! The crate resolves an addon's identity from its manifest and version
//! control, packages it into a deterministic zip archive, runs the external
//! static-analysis, unit-test and compatibility tools, and removes generated
//! clutter from the project tree.
//!
//! # Modules
//!
//! - [`metadata`]: Manifest parsing, git queries, and [`metadata::BuildMetadata`].
//! - [`packaging`]: Archive naming, writing, and the package flow.
//! - [`steps`]: Verification groups and the step runner.
//! - [`cleaner`]: Removal of bytecode, caches, and logs.
//! - [`config`]: The `addon-build.toml` configuration file.
//! - [`command`]: External command invocation behind [`command::CommandRunner`].
//! - [`dispatch`]: Maps CLI commands onto the flows above.

pub mod cleaner;
pub mod cli;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod metadata;
pub mod output;
pub mod packaging;
pub mod steps;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
