//! S3-like object storage over plain HTTP `PUT`

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Url};
use thiserror::Error;

use super::{ArtifactPublisher, ObjectKey, PublishError, PublishRequest};
use crate::config::StorageSettings;

/// Errors building an [`HttpObjectStore`]
#[derive(Debug, Error)]
pub enum StoreSetupError {
    /// Endpoint or public base is not an absolute hierarchical URL
    #[error("invalid storage URL '{url}': {reason}")]
    InvalidUrl {
        /// Offending setting value
        url: String,
        /// Parser message
        reason: String,
    },

    /// The HTTP client could not be built
    #[error("cannot build storage HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Uploads to `PUT {endpoint}/{bucket}/{key}`.
///
/// Public URLs are `{public_base_url}/{key}`, where the base defaults to
/// `{endpoint}/{bucket}`. Key segments are percent-encoded.
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    client: Client,
    object_base: Url,
    public_base: Url,
    bearer_token: Option<String>,
}

impl HttpObjectStore {
    /// Build a store client from settings
    pub fn new(settings: &StorageSettings) -> Result<Self, StoreSetupError> {
        let mut object_base = parse_base(&settings.endpoint)?;
        if let Ok(mut segments) = object_base.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(settings.bucket.split('/').filter(|part| !part.is_empty()));
        }
        let public_base = match settings.public_base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => parse_base(url)?,
            _ => object_base.clone(),
        };

        Ok(Self {
            client: Client::builder().build()?,
            object_base,
            public_base,
            bearer_token: settings.token.clone(),
        })
    }

    /// Upload URL of `key`
    pub fn object_url(&self, key: &ObjectKey) -> String {
        key.url_under(&self.object_base).into()
    }
}

fn parse_base(url: &str) -> Result<Url, StoreSetupError> {
    let invalid = |reason: String| StoreSetupError::InvalidUrl {
        url: url.to_string(),
        reason,
    };
    let parsed = Url::parse(url.trim()).map_err(|e| invalid(e.to_string()))?;
    if parsed.cannot_be_a_base() {
        return Err(invalid("not a hierarchical URL".to_string()));
    }
    Ok(parsed)
}

#[async_trait]
impl ArtifactPublisher for HttpObjectStore {
    async fn publish(&self, request: PublishRequest) -> Result<String, PublishError> {
        let url = self.object_url(&request.key);
        let key = request.key.path();
        debug!("PUT {} ({} bytes)", url, request.content.len());

        let mut put = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, request.content_type())
            .body(request.content);
        if let Some(token) = &self.bearer_token {
            put = put.bearer_auth(token);
        }

        let response = put.send().await.map_err(|source| PublishError::Transport {
            key: key.clone(),
            source,
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::Rejected {
                key,
                status: status.as_u16(),
            });
        }
        Ok(self.public_url(&request.key))
    }

    fn public_url(&self, key: &ObjectKey) -> String {
        key.url_under(&self.public_base).into()
    }
}
