//! Test fixture creation utilities

#![allow(dead_code)]

use bundle_delta::snapshot::{ArtifactSize, ArtifactSizeSnapshot};
use std::path::{Path, PathBuf};

/// Snapshot from `(name, size)` pairs, in order
pub fn snapshot(entries: &[(&str, u64)]) -> ArtifactSizeSnapshot {
    entries
        .iter()
        .map(|(name, size)| ArtifactSize::new(*name, *size))
        .collect()
}

/// Minimal `pull_request` webhook body
pub fn event_json(action: &str, owner: &str, repo: &str, branch: &str, sha: &str) -> String {
    format!(
        r#"{{"action":"{action}","number":1,"pull_request":{{"head":{{"ref":"{branch}","sha":"{sha}"}}}},"repository":{{"name":"{repo}","owner":{{"login":"{owner}"}}}}}}"#
    )
}

/// Write a manifest of `entries` as a record array
pub fn write_manifest(dir: &Path, name: &str, entries: &[(&str, u64)]) -> PathBuf {
    let path = dir.join(name);
    let json = serde_json::to_string(&snapshot(entries)).expect("serialize snapshot");
    std::fs::write(&path, json).expect("write manifest");
    path
}
