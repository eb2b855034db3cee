//! Per-directory run serialization
//!
//! Concurrent runs for one repository share the baseline working directory,
//! so a run holds the locks for both of its directories from the first build
//! until its uploads finish.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Async locks keyed by working directory
#[derive(Clone, Default)]
pub struct DirectoryLocks {
    held: Arc<Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>>,
}

impl DirectoryLocks {
    /// Create an empty lock table
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until every directory in `dirs` is free, then hold them all.
    ///
    /// Directories are locked in sorted order so two runs can never wait on
    /// each other; duplicates are locked once.
    pub async fn acquire(&self, dirs: &[&Path]) -> Vec<OwnedMutexGuard<()>> {
        let mut dirs: Vec<&Path> = dirs.to_vec();
        dirs.sort();
        dirs.dedup();

        let mut guards = Vec::with_capacity(dirs.len());
        for dir in dirs {
            let lock = {
                let mut held = self.held.lock();
                Arc::clone(
                    held.entry(dir.to_path_buf())
                        .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
                )
            };
            guards.push(lock.lock_owned().await);
        }
        guards
    }
}
