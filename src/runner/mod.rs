//! Branch build runner
//!
//! Prepares one branch of a repository for comparison:
//! 1. remove any previous working directory
//! 2. shallow single-branch clone
//! 3. install dependencies
//! 4. build and analyze, writing the size manifest
//! 5. parse the manifest into a snapshot
//!
//! Steps run strictly in order and the first failure aborts the rest.

pub mod command;
pub mod fake;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::snapshot::{ArtifactSizeSnapshot, ManifestParseError};

pub use command::CommandBuildRunner;
pub use fake::{CallKind, FakeBuildRunner, RunnerCall};

/// One step of preparing a branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildStep {
    /// Remove the previous working directory
    Clean,
    /// Clone the branch
    Fetch,
    /// Install dependencies
    Install,
    /// Build and write the size manifest
    Analyze,
    /// Parse the size manifest
    ParseManifest,
}

impl BuildStep {
    /// Step label used in logs and errors
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Fetch => "fetch",
            Self::Install => "install",
            Self::Analyze => "analyze",
            Self::ParseManifest => "parse-manifest",
        }
    }
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A build step failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{step} step failed{}: {diagnostics}", exit_suffix(.exit_code))]
pub struct BuildError {
    /// Failing step
    pub step: BuildStep,
    /// Exit code of the external command, if it ran to completion
    pub exit_code: Option<i32>,
    /// Captured diagnostic output
    pub diagnostics: String,
}

fn exit_suffix(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!(" (exit code {})", code),
        None => String::new(),
    }
}

/// Errors preparing a branch
#[derive(Debug, Error)]
pub enum PrepareError {
    /// A build step failed
    #[error(transparent)]
    Build(#[from] BuildError),

    /// The manifest was missing or malformed after a successful build
    #[error(transparent)]
    Manifest(#[from] ManifestParseError),
}

impl PrepareError {
    /// Step at which preparation stopped
    pub fn step(&self) -> BuildStep {
        match self {
            Self::Build(e) => e.step,
            Self::Manifest(_) => BuildStep::ParseManifest,
        }
    }
}

/// A branch that was built and measured
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedBranch {
    /// Branch name
    pub branch: String,
    /// Checkout directory
    pub working_dir: PathBuf,
    /// Absolute manifest path inside the checkout
    pub manifest_path: PathBuf,
    /// Absolute analyzer report path, which may not exist
    pub analyzer_report_path: Option<PathBuf>,
    /// Parsed artifact sizes
    pub snapshot: ArtifactSizeSnapshot,
}

/// Capability to build a branch and measure its artifacts.
///
/// [`CommandBuildRunner`] shells out to git and the project's package tool;
/// [`FakeBuildRunner`] returns canned snapshots.
#[async_trait]
pub trait BuildRunner: Send + Sync {
    /// Run all preparation steps for `branch` inside `target_dir`
    async fn prepare_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        target_dir: &Path,
    ) -> Result<PreparedBranch, PrepareError>;

    /// Read the manifest of a branch already built in `target_dir`
    async fn load_prepared(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        target_dir: &Path,
    ) -> Result<PreparedBranch, PrepareError>;
}
