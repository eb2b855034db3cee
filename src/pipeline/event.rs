//! Inbound pull request events and the runs they start

use serde::Deserialize;
use std::fmt;
use uuid::Uuid;

/// Actions that start a run; every other action is ignored
pub const ACCEPTED_ACTIONS: [&str; 2] = ["opened", "synchronize"];

/// A `pull_request` webhook payload, already authenticated and parsed.
///
/// Only the fields a run needs are modelled; everything else is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequestEvent {
    /// What happened to the pull request (`opened`, `synchronize`, `closed`, ...)
    pub action: String,
    /// The pull request
    pub pull_request: PullRequest,
    /// The repository it belongs to
    pub repository: Repository,
}

/// Pull request head
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    /// Head of the change branch
    pub head: GitRef,
}

/// A branch reference and the commit it points to
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitRef {
    /// Branch name
    #[serde(rename = "ref")]
    pub ref_name: String,
    /// Commit SHA
    pub sha: String,
}

/// Repository identity
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Repository {
    /// Repository name
    pub name: String,
    /// Repository owner
    pub owner: Owner,
}

/// Repository owner
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Owner {
    /// Owner login
    pub login: String,
}

impl PullRequestEvent {
    /// Parse a webhook payload
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    /// Whether the action should start a run
    pub fn is_actionable(&self) -> bool {
        ACCEPTED_ACTIONS.contains(&self.action.as_str())
    }

    /// Repository owner login
    pub fn owner(&self) -> &str {
        &self.repository.owner.login
    }

    /// Repository name
    pub fn repo(&self) -> &str {
        &self.repository.name
    }

    /// Change branch name
    pub fn branch(&self) -> &str {
        &self.pull_request.head.ref_name
    }

    /// Head commit SHA
    pub fn commit_sha(&self) -> &str {
        &self.pull_request.head.sha
    }
}

/// One accepted event being processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRun {
    /// Log correlation id, not persisted
    pub run_id: Uuid,
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Head commit of the change
    pub commit_sha: String,
    /// Change branch
    pub branch: String,
    /// Branch the change is compared against
    pub baseline_branch: String,
    /// Event action that started the run
    pub action: String,
}

impl PipelineRun {
    /// Start a run for `event` compared against `baseline_branch`
    pub fn from_event(event: &PullRequestEvent, baseline_branch: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            owner: event.owner().to_string(),
            repo: event.repo().to_string(),
            commit_sha: event.commit_sha().to_string(),
            branch: event.branch().to_string(),
            baseline_branch: baseline_branch.to_string(),
            action: event.action.clone(),
        }
    }
}

impl fmt::Display for PipelineRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}@{} ({} vs {})",
            self.owner, self.repo, self.commit_sha, self.branch, self.baseline_branch
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "action": "synchronize",
        "number": 7,
        "pull_request": {
            "head": {"ref": "feature-branch", "sha": "git-commit-sha", "label": "x"},
            "base": {"ref": "develop", "sha": "base-sha"}
        },
        "repository": {"name": "repository-name", "owner": {"login": "repository-owner"}},
        "sender": {"login": "someone"}
    }"#;

    #[test]
    fn test_from_json_reads_required_fields_and_ignores_rest() {
        let event = PullRequestEvent::from_json(PAYLOAD).unwrap();

        assert_eq!(event.owner(), "repository-owner");
        assert_eq!(event.repo(), "repository-name");
        assert_eq!(event.branch(), "feature-branch");
        assert_eq!(event.commit_sha(), "git-commit-sha");
        assert!(event.is_actionable());
    }

    #[test]
    fn test_from_json_missing_head_sha_fails() {
        let payload = r#"{"action":"opened","pull_request":{"head":{"ref":"b"}},
            "repository":{"name":"r","owner":{"login":"o"}}}"#;
        assert!(PullRequestEvent::from_json(payload).is_err());
    }

    #[test]
    fn test_closed_action_is_not_actionable() {
        let mut event = PullRequestEvent::from_json(PAYLOAD).unwrap();
        event.action = "closed".to_string();
        assert!(!event.is_actionable());
    }

    #[test]
    fn test_pipeline_run_uses_configured_baseline() {
        let event = PullRequestEvent::from_json(PAYLOAD).unwrap();
        let run = PipelineRun::from_event(&event, "master");

        assert_eq!(run.baseline_branch, "master");
        assert_eq!(run.branch, "feature-branch");
        assert_ne!(run.run_id, PipelineRun::from_event(&event, "master").run_id);
    }
}
