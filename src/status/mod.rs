//! Commit status reporting
//!
//! A run posts `pending` when it starts and exactly one of `success` or
//! `failure` when it ends. Posting is best-effort: the orchestrator logs a
//! [`StatusPostError`] and carries on.

pub mod github;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use github::GitHubStatusReporter;
pub use memory::MemoryStatusReporter;

/// State of a commit status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitState {
    /// Run in progress
    Pending,
    /// Size change within threshold
    Success,
    /// Size change above threshold, or the run failed
    Failure,
}

impl CommitState {
    /// Wire name of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl fmt::Display for CommitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status to attach to one commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Commit the status applies to
    pub commit_sha: String,
    /// Status state
    pub state: CommitState,
    /// Short human-readable description
    pub description: Option<String>,
    /// Link shown next to the status
    pub target_url: Option<String>,
}

impl StatusUpdate {
    /// Status without description or link
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        commit_sha: impl Into<String>,
        state: CommitState,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            commit_sha: commit_sha.into(),
            state,
            description: None,
            target_url: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the target URL
    pub fn with_target_url(mut self, target_url: impl Into<String>) -> Self {
        self.target_url = Some(target_url.into());
        self
    }
}

/// Errors posting a commit status
#[derive(Debug, Error)]
pub enum StatusPostError {
    /// The request could not be sent or its response not read
    #[error("status request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status code
    #[error("status API rejected the update with HTTP {status}: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// The reporter is not able to post at all
    #[error("status reporter unavailable: {0}")]
    Unavailable(String),
}

/// Capability to attach a status to a commit
#[async_trait]
pub trait StatusReporter: Send + Sync {
    /// Post `update`; callers treat failure as non-fatal
    async fn post_status(&self, update: &StatusUpdate) -> Result<(), StatusPostError>;
}
