//! Run states and the values handed from one stage to the next

use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use super::error::PipelineError;
use super::event::PipelineRun;
use super::verdict::Verdict;
use crate::diff::DiffResult;
use crate::report::ReportDocument;
use crate::runner::PreparedBranch;

/// Where a run is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Event accepted
    Received,
    /// Pending status posted
    Pending,
    /// Building the baseline branch
    BaselineBuilding,
    /// Building the change branch
    ChangeBuilding,
    /// Comparing snapshots
    Diffing,
    /// Rendering and writing the report
    Reporting,
    /// Uploading run files
    Publishing,
    /// Posting the final status
    Finalizing,
    /// Completed with a verdict
    Succeeded,
    /// Aborted by an error
    Failed,
}

impl RunState {
    /// Lowercase label for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Pending => "pending",
            Self::BaselineBuilding => "baseline-building",
            Self::ChangeBuilding => "change-building",
            Self::Diffing => "diffing",
            Self::Reporting => "reporting",
            Self::Publishing => "publishing",
            Self::Finalizing => "finalizing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    /// True for `Succeeded` and `Failed`
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Both branches built and measured
#[derive(Debug, Clone)]
pub struct Builds {
    /// The run
    pub run: PipelineRun,
    /// Baseline branch result
    pub baseline: PreparedBranch,
    /// Change branch result
    pub change: PreparedBranch,
}

/// Snapshots compared
#[derive(Debug, Clone)]
pub struct Comparison {
    /// Built branches
    pub builds: Builds,
    /// Per-artifact diff
    pub diff: DiffResult,
    /// Sum of all deltas
    pub total_delta: i64,
}

impl Comparison {
    /// Diff the baseline snapshot against the change snapshot
    pub fn from_builds(builds: Builds) -> Self {
        let diff = crate::diff::diff(&builds.baseline.snapshot, &builds.change.snapshot);
        let total_delta = diff.total_delta();
        Self {
            builds,
            diff,
            total_delta,
        }
    }
}

/// Report rendered and written to the change working directory
#[derive(Debug, Clone)]
pub struct RenderedReport {
    /// Compared snapshots
    pub comparison: Comparison,
    /// Rendered document
    pub document: ReportDocument,
    /// Where the document was written
    pub path: PathBuf,
}

/// A run that reached a verdict
#[derive(Debug, Clone)]
pub struct CompletedRun {
    /// Correlation id
    pub run_id: Uuid,
    /// Pass/fail judgement
    pub verdict: Verdict,
    /// Published report URL
    pub report_url: String,
    /// Per-artifact diff
    pub diff: DiffResult,
}

/// Why an event did not start a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Action other than `opened` or `synchronize`
    Action(String),
    /// Repository not on the allowlist
    NotMonitored {
        /// Repository owner
        owner: String,
        /// Repository name
        repo: String,
    },
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action(action) => write!(f, "action '{}' does not trigger a run", action),
            Self::NotMonitored { owner, repo } => {
                write!(f, "{}/{} is not a monitored repository", owner, repo)
            }
        }
    }
}

/// Terminal result of handling one event
#[derive(Debug)]
pub enum RunOutcome {
    /// No run was started and no collaborator was called
    Ignored(IgnoreReason),
    /// The run completed with a verdict, which may be failing
    Succeeded(CompletedRun),
    /// The run was aborted
    Failed(PipelineError),
}

impl RunOutcome {
    /// Process exit code: 0 for a pass or ignored event, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Ignored(_) => 0,
            Self::Succeeded(completed) if completed.verdict.passed() => 0,
            Self::Succeeded(_) | Self::Failed(_) => 1,
        }
    }

    /// Final state of the run, if one was started
    pub fn final_state(&self) -> Option<RunState> {
        match self {
            Self::Ignored(_) => None,
            Self::Succeeded(_) => Some(RunState::Succeeded),
            Self::Failed(_) => Some(RunState::Failed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(RunState::Succeeded.is_terminal());
        assert!(RunState::Failed.is_terminal());
        assert!(!RunState::Publishing.is_terminal());
    }

    #[test]
    fn test_ignored_outcome_exits_zero() {
        let outcome = RunOutcome::Ignored(IgnoreReason::Action("closed".to_string()));
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(outcome.final_state(), None);
    }

    #[test]
    fn test_ignore_reason_display() {
        let reason = IgnoreReason::NotMonitored {
            owner: "acme".to_string(),
            repo: "web".to_string(),
        };
        assert_eq!(reason.to_string(), "acme/web is not a monitored repository");
    }
}
