//! GitHub commit status API client

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Serialize;

use super::{CommitState, StatusPostError, StatusReporter, StatusUpdate};
use crate::config::StatusSettings;
use crate::fmt::truncate;

/// Longest description the statuses API accepts
pub const MAX_DESCRIPTION_CHARS: usize = 140;

const USER_AGENT: &str = concat!("bundle-delta/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct StatusPayload<'a> {
    state: CommitState,
    context: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_url: Option<&'a str>,
}

/// Posts statuses to `POST {api}/repos/{owner}/{repo}/statuses/{sha}`
#[derive(Debug, Clone)]
pub struct GitHubStatusReporter {
    client: Client,
    api_base_url: String,
    context: String,
    token: Option<String>,
}

impl GitHubStatusReporter {
    /// Build a reporter from settings
    pub fn new(settings: &StatusSettings) -> Result<Self, StatusPostError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            context: settings.context.clone(),
            token: settings.token.clone(),
        })
    }

    /// Endpoint for one commit
    pub fn statuses_url(&self, update: &StatusUpdate) -> String {
        format!(
            "{}/repos/{}/{}/statuses/{}",
            self.api_base_url, update.owner, update.repo, update.commit_sha
        )
    }

    fn payload<'a>(&'a self, update: &'a StatusUpdate) -> StatusPayload<'a> {
        StatusPayload {
            state: update.state,
            context: &self.context,
            description: update
                .description
                .as_deref()
                .map(|d| truncate(d, MAX_DESCRIPTION_CHARS)),
            target_url: update.target_url.as_deref(),
        }
    }
}

#[async_trait]
impl StatusReporter for GitHubStatusReporter {
    async fn post_status(&self, update: &StatusUpdate) -> Result<(), StatusPostError> {
        let url = self.statuses_url(update);
        debug!("POST {} ({})", url, update.state);

        let mut request = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .json(&self.payload(update));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(StatusPostError::Rejected {
            status: status.as_u16(),
            body: truncate(body.trim(), 500),
        })
    }
}
