//! Artifact size diff engine
//!
//! Compares the baseline snapshot against the current snapshot and
//! classifies every artifact name present in either one exactly once.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::snapshot::ArtifactSizeSnapshot;

/// How an artifact changed between baseline and current build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// Only present in the current build
    New,
    /// Only present in the baseline build
    Removed,
    /// Same size in both builds
    Unchanged,
    /// Larger in the current build
    Grew,
    /// Smaller in the current build
    Shrank,
}

impl Classification {
    /// Lowercase label, also used as the CSS class in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Removed => "removed",
            Self::Unchanged => "unchanged",
            Self::Grew => "grew",
            Self::Shrank => "shrank",
        }
    }

    /// Listing priority for changed artifacts (lower sorts first)
    pub fn priority(&self) -> u8 {
        match self {
            Self::New => 0,
            Self::Grew => 1,
            Self::Shrank => 2,
            Self::Removed => 3,
            Self::Unchanged => 4,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size change of one artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    /// Artifact name
    pub name: String,
    /// Kind of change
    pub classification: Classification,
    /// `current_size - previous_size`
    pub byte_delta: i64,
    /// Baseline size, 0 if absent from the baseline
    pub previous_size: u64,
    /// Current size, 0 if absent from the current build
    pub current_size: u64,
}

/// Ordered diff: current-snapshot order, then baseline-only entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiffResult {
    entries: Vec<DiffEntry>,
}

impl DiffResult {
    /// Wrap already-ordered entries
    pub fn from_entries(entries: Vec<DiffEntry>) -> Self {
        Self { entries }
    }

    /// All entries in diff order
    pub fn entries(&self) -> &[DiffEntry] {
        &self.entries
    }

    /// Sum of every entry's `byte_delta`
    pub fn total_delta(&self) -> i64 {
        self.entries.iter().map(|entry| entry.byte_delta).sum()
    }

    /// Entries whose classification is not `unchanged`, ordered by
    /// `new > grew > shrank > removed`, keeping input order within a class
    pub fn changed(&self) -> Vec<&DiffEntry> {
        let mut changed: Vec<&DiffEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.classification != Classification::Unchanged)
            .collect();
        // sort_by_key is stable
        changed.sort_by_key(|entry| entry.classification.priority());
        changed
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when neither snapshot had artifacts
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn signed(size: u64) -> i64 {
    i64::try_from(size).unwrap_or(i64::MAX)
}

/// Compare two snapshots.
///
/// Never fails; empty snapshots yield an all-new or all-removed result.
/// Names are matched exactly and case-sensitively.
///
/// # Examples
///
/// ```
/// use bundle_delta::diff::{diff, Classification};
/// use bundle_delta::snapshot::{ArtifactSize, ArtifactSizeSnapshot};
///
/// let baseline = ArtifactSizeSnapshot::new(vec![ArtifactSize::new("main.js", 1)]);
/// let current = ArtifactSizeSnapshot::new(vec![ArtifactSize::new("main.js", 4000)]);
///
/// let result = diff(&baseline, &current);
/// assert_eq!(result.entries()[0].classification, Classification::Grew);
/// assert_eq!(result.entries()[0].byte_delta, 3999);
/// ```
pub fn diff(baseline: &ArtifactSizeSnapshot, current: &ArtifactSizeSnapshot) -> DiffResult {
    let mut entries = Vec::with_capacity(current.len() + baseline.len());

    for artifact in current {
        let entry = match baseline.find(&artifact.name) {
            None => DiffEntry {
                name: artifact.name.clone(),
                classification: Classification::New,
                byte_delta: signed(artifact.size),
                previous_size: 0,
                current_size: artifact.size,
            },
            Some(previous) => {
                let classification = if previous.size == artifact.size {
                    Classification::Unchanged
                } else if previous.size > artifact.size {
                    Classification::Shrank
                } else {
                    Classification::Grew
                };
                DiffEntry {
                    name: artifact.name.clone(),
                    classification,
                    byte_delta: signed(artifact.size) - signed(previous.size),
                    previous_size: previous.size,
                    current_size: artifact.size,
                }
            }
        };
        entries.push(entry);
    }

    for previous in baseline {
        if current.find(&previous.name).is_some() {
            continue;
        }
        // Duplicate baseline names: first match only
        if entries.iter().any(|entry: &DiffEntry| entry.name == previous.name) {
            continue;
        }
        entries.push(DiffEntry {
            name: previous.name.clone(),
            classification: Classification::Removed,
            byte_delta: -signed(previous.size),
            previous_size: previous.size,
            current_size: 0,
        });
    }

    DiffResult::from_entries(entries)
}
