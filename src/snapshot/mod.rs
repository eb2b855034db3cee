//! Artifact size snapshots
//!
//! A snapshot is the ordered list of build artifacts one build of one branch
//! produced, each with its size in bytes. Snapshots are parsed from the
//! build tool's manifest and never modified afterwards.

pub mod manifest;

use serde::{Deserialize, Serialize};

pub use manifest::{parse_manifest, read_manifest, ManifestParseError};

/// A single named build output and its size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSize {
    /// Artifact file name, unique within a snapshot
    pub name: String,
    /// Size in bytes
    pub size: u64,
}

impl ArtifactSize {
    /// Create a new artifact entry
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// Complete set of artifacts produced by one build, in manifest order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactSizeSnapshot {
    artifacts: Vec<ArtifactSize>,
}

impl ArtifactSizeSnapshot {
    /// Build a snapshot from artifacts in their original order
    pub fn new(artifacts: Vec<ArtifactSize>) -> Self {
        Self { artifacts }
    }

    /// Empty snapshot (a build that produced nothing)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Artifacts in manifest order
    pub fn artifacts(&self) -> &[ArtifactSize] {
        &self.artifacts
    }

    /// Find an artifact by exact, case-sensitive name.
    ///
    /// If a name occurs more than once the first occurrence wins.
    pub fn find(&self, name: &str) -> Option<&ArtifactSize> {
        self.artifacts.iter().find(|artifact| artifact.name == name)
    }

    /// Number of artifacts
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// True when the build produced no artifacts
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Sum of all artifact sizes
    pub fn total_size(&self) -> u64 {
        self.artifacts.iter().map(|artifact| artifact.size).sum()
    }
}

impl FromIterator<ArtifactSize> for ArtifactSizeSnapshot {
    fn from_iter<I: IntoIterator<Item = ArtifactSize>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ArtifactSizeSnapshot {
    type Item = &'a ArtifactSize;
    type IntoIter = std::slice::Iter<'a, ArtifactSize>;

    fn into_iter(self) -> Self::IntoIter {
        self.artifacts.iter()
    }
}
