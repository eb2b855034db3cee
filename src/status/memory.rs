//! Status reporter that keeps updates in memory

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{StatusPostError, StatusReporter, StatusUpdate};

/// Records every posted update; can be switched to reject posts
#[derive(Debug, Default)]
pub struct MemoryStatusReporter {
    updates: Mutex<Vec<StatusUpdate>>,
    failing: AtomicBool,
}

impl MemoryStatusReporter {
    /// Create an empty reporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Reporter whose every post fails after being recorded
    pub fn failing() -> Self {
        let reporter = Self::default();
        reporter.failing.store(true, Ordering::SeqCst);
        reporter
    }

    /// Updates posted so far, in order
    pub fn updates(&self) -> Vec<StatusUpdate> {
        self.updates.lock().clone()
    }
}

#[async_trait]
impl StatusReporter for MemoryStatusReporter {
    async fn post_status(&self, update: &StatusUpdate) -> Result<(), StatusPostError> {
        self.updates.lock().push(update.clone());
        if self.failing.load(Ordering::SeqCst) {
            return Err(StatusPostError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::CommitState;

    #[tokio::test]
    async fn test_memory_reporter_records_updates() {
        let reporter = MemoryStatusReporter::new();
        let update = StatusUpdate::new("acme", "web", "abc", CommitState::Pending);

        reporter.post_status(&update).await.unwrap();
        assert_eq!(reporter.updates(), vec![update]);
    }

    #[tokio::test]
    async fn test_failing_reporter_still_records() {
        let reporter = MemoryStatusReporter::failing();
        let update = StatusUpdate::new("acme", "web", "abc", CommitState::Failure);

        assert!(reporter.post_status(&update).await.is_err());
        assert_eq!(reporter.updates().len(), 1);
    }
}
