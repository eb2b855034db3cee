//! Publisher that keeps uploads in memory

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Url;
use std::collections::HashSet;

use super::{ArtifactPublisher, ObjectKey, PublishError, PublishRequest};
use crate::report::FileKind;

/// Base of the URLs handed out by [`MemoryPublisher`]
pub const MEMORY_BASE_URL: &str = "memory://published";

/// Stores every upload; selected file kinds can be made to fail
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    uploads: Mutex<Vec<PublishRequest>>,
    failing: HashSet<FileKind>,
}

impl MemoryPublisher {
    /// Create an empty publisher
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject uploads of `kind`
    pub fn fail_kind(mut self, kind: FileKind) -> Self {
        self.failing.insert(kind);
        self
    }

    /// Successful uploads so far, in completion order
    pub fn uploads(&self) -> Vec<PublishRequest> {
        self.uploads.lock().clone()
    }

    /// Content uploaded to `key`, if any
    pub fn content(&self, key: &ObjectKey) -> Option<Vec<u8>> {
        self.uploads
            .lock()
            .iter()
            .rev()
            .find(|request| &request.key == key)
            .map(|request| request.content.clone())
    }
}

#[async_trait]
impl ArtifactPublisher for MemoryPublisher {
    async fn publish(&self, request: PublishRequest) -> Result<String, PublishError> {
        if self.failing.contains(&request.key.kind) {
            return Err(PublishError::Unavailable {
                key: request.key.path(),
                reason: "simulated outage".to_string(),
            });
        }
        let url = self.public_url(&request.key);
        self.uploads.lock().push(request);
        Ok(url)
    }

    fn public_url(&self, key: &ObjectKey) -> String {
        match Url::parse(MEMORY_BASE_URL) {
            Ok(base) => key.url_under(&base).into(),
            Err(_) => format!("{}/{}", MEMORY_BASE_URL, key.path()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_returns_public_url_and_stores_content() {
        let publisher = MemoryPublisher::new();
        let key = ObjectKey::new("acme", "web", "feature", FileKind::SizeReport);

        let url = publisher
            .publish(PublishRequest::new(key.clone(), "<html></html>"))
            .await
            .unwrap();

        assert_eq!(url, publisher.public_url(&key));
        assert_eq!(publisher.content(&key).unwrap(), b"<html></html>".to_vec());
    }

    #[test]
    fn test_public_url_encodes_branch() {
        let publisher = MemoryPublisher::new();
        let key = ObjectKey::new("acme", "web", "fix#12", FileKind::Manifest);

        assert_eq!(
            publisher.public_url(&key),
            "memory://published/acme/web/fix%2312/stats.json"
        );
    }

    #[tokio::test]
    async fn test_failing_kind_is_rejected_and_not_stored() {
        let publisher = MemoryPublisher::new().fail_kind(FileKind::Manifest);
        let key = ObjectKey::new("acme", "web", "feature", FileKind::Manifest);

        let err = publisher
            .publish(PublishRequest::new(key, "[]"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("stats.json"));
        assert!(publisher.uploads().is_empty());
    }
}
