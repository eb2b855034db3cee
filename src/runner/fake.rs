//! In-memory build runner for tests and dry runs

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;

use crate::snapshot::{ArtifactSizeSnapshot, ManifestParseError};

use super::{BuildError, BuildRunner, BuildStep, PrepareError, PreparedBranch};

/// File name the fake writes its canned manifest to
const FAKE_MANIFEST: &str = "stats.json";

/// Which runner operation was invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// [`BuildRunner::prepare_branch`]
    Prepare,
    /// [`BuildRunner::load_prepared`]
    Load,
}

/// A recorded runner invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerCall {
    /// Operation invoked
    pub kind: CallKind,
    /// Branch it was invoked for
    pub branch: String,
}

/// Returns canned snapshots per branch without running anything.
///
/// Branches without a configured snapshot yield an empty one. The canned
/// snapshot is also written as a manifest into the target directory so
/// publishing code finds a real file.
#[derive(Debug, Default)]
pub struct FakeBuildRunner {
    snapshots: HashMap<String, ArtifactSizeSnapshot>,
    failures: HashMap<String, BuildStep>,
    calls: Mutex<Vec<RunnerCall>>,
}

impl FakeBuildRunner {
    /// Create a fake with no configured branches
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `snapshot` for `branch`
    pub fn with_snapshot(mut self, branch: impl Into<String>, snapshot: ArtifactSizeSnapshot) -> Self {
        self.snapshots.insert(branch.into(), snapshot);
        self
    }

    /// Fail preparation of `branch` at `step`
    pub fn fail_at(mut self, branch: impl Into<String>, step: BuildStep) -> Self {
        self.failures.insert(branch.into(), step);
        self
    }

    /// Invocations so far, in order
    pub fn calls(&self) -> Vec<RunnerCall> {
        self.calls.lock().clone()
    }

    fn record(&self, kind: CallKind, branch: &str) {
        self.calls.lock().push(RunnerCall {
            kind,
            branch: branch.to_string(),
        });
    }

    async fn produce(&self, branch: &str, target_dir: &Path) -> Result<PreparedBranch, PrepareError> {
        let manifest_path = target_dir.join(FAKE_MANIFEST);

        if let Some(&step) = self.failures.get(branch) {
            return Err(match step {
                BuildStep::ParseManifest => PrepareError::Manifest(ManifestParseError::Unreadable {
                    path: manifest_path,
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "manifest not written"),
                }),
                step => PrepareError::Build(BuildError {
                    step,
                    exit_code: Some(1),
                    diagnostics: format!("simulated {} failure", step),
                }),
            });
        }

        let snapshot = self.snapshots.get(branch).cloned().unwrap_or_default();
        let io_failure = |e: std::io::Error| {
            PrepareError::Build(BuildError {
                step: BuildStep::Analyze,
                exit_code: None,
                diagnostics: e.to_string(),
            })
        };
        let contents = serde_json::to_vec(&snapshot).map_err(|e| io_failure(e.into()))?;
        tokio::fs::create_dir_all(target_dir).await.map_err(io_failure)?;
        tokio::fs::write(&manifest_path, contents)
            .await
            .map_err(io_failure)?;

        Ok(PreparedBranch {
            branch: branch.to_string(),
            working_dir: target_dir.to_path_buf(),
            manifest_path,
            analyzer_report_path: None,
            snapshot,
        })
    }
}

#[async_trait]
impl BuildRunner for FakeBuildRunner {
    async fn prepare_branch(
        &self,
        _owner: &str,
        _repo: &str,
        branch: &str,
        target_dir: &Path,
    ) -> Result<PreparedBranch, PrepareError> {
        self.record(CallKind::Prepare, branch);
        self.produce(branch, target_dir).await
    }

    async fn load_prepared(
        &self,
        _owner: &str,
        _repo: &str,
        branch: &str,
        target_dir: &Path,
    ) -> Result<PreparedBranch, PrepareError> {
        self.record(CallKind::Load, branch);
        self.produce(branch, target_dir).await
    }
}
