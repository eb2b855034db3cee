//! Publishing run files to object storage
//!
//! Each published file is addressed by an [`ObjectKey`]: the repository,
//! the branch it belongs to, and its [`FileKind`]. The report renderer
//! links to these keys before they are uploaded, so [`ArtifactPublisher::public_url`]
//! must be deterministic and agree with the URL returned by `publish`.

pub mod http_store;
pub mod memory;

use async_trait::async_trait;
use reqwest::Url;
use std::fmt;
use thiserror::Error;

use crate::report::FileKind;

pub use http_store::{HttpObjectStore, StoreSetupError};
pub use memory::MemoryPublisher;

/// Storage address of one published file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Branch the file belongs to
    pub branch: String,
    /// Which file
    pub kind: FileKind,
}

impl ObjectKey {
    /// Key for `kind` of `owner/repo` at `branch`
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: impl Into<String>,
        kind: FileKind,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: branch.into(),
            kind,
        }
    }

    /// `base` extended by the key's segments, each percent-encoded.
    ///
    /// Branch names may contain `/`, `#`, `%` or `?`; encoding keeps every
    /// branch in a single path segment and distinct from every other branch.
    pub fn url_under(&self, base: &Url) -> Url {
        let mut url = base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend([&self.owner, &self.repo, &self.branch])
                .push(self.kind.file_name());
        }
        url
    }

    /// Object path `{owner}/{repo}/{branch}/{file_name}`, unencoded, for logs and errors
    pub fn path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.owner,
            self.repo,
            self.branch,
            self.kind.file_name()
        )
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// A file to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    /// Destination
    pub key: ObjectKey,
    /// File contents
    pub content: Vec<u8>,
}

impl PublishRequest {
    /// Upload `content` to `key`
    pub fn new(key: ObjectKey, content: impl Into<Vec<u8>>) -> Self {
        Self {
            key,
            content: content.into(),
        }
    }

    /// MIME type derived from the file kind
    pub fn content_type(&self) -> &'static str {
        self.key.kind.content_type()
    }
}

/// Errors uploading a file
#[derive(Debug, Error)]
pub enum PublishError {
    /// The request could not be sent or its response not read
    #[error("upload of {key} failed: {source}")]
    Transport {
        /// Object being uploaded
        key: String,
        #[source]
        /// HTTP client error
        source: reqwest::Error,
    },

    /// Storage answered with a non-success status code
    #[error("storage rejected {key} with HTTP {status}")]
    Rejected {
        /// Object being uploaded
        key: String,
        /// HTTP status code
        status: u16,
    },

    /// The publisher is not able to upload at all
    #[error("publisher unavailable for {key}: {reason}")]
    Unavailable {
        /// Object being uploaded
        key: String,
        /// Why
        reason: String,
    },
}

/// Capability to store run files and name their public URLs
#[async_trait]
pub trait ArtifactPublisher: Send + Sync {
    /// Upload one file, returning its public URL
    async fn publish(&self, request: PublishRequest) -> Result<String, PublishError>;

    /// Public URL `key` has, or will have, once published
    fn public_url(&self, key: &ObjectKey) -> String;
}
