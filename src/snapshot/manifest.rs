//! Build manifest parsing
//!
//! The build-and-analyze step writes a JSON manifest listing every emitted
//! artifact and its byte size. Two layouts are accepted:
//!
//! - a top-level array: `[{"name": "main.js", "size": 1024}, ...]`
//! - a stats object with an `assets` array (webpack `stats.json` layout)
//!
//! Records without `name` may instead carry `files`, a list whose first
//! entry names the artifact (webpack chunk layout). Other fields are
//! ignored.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::{ArtifactSize, ArtifactSizeSnapshot};

/// Errors reading a manifest after a build claimed success
#[derive(Debug, Error)]
pub enum ManifestParseError {
    /// Manifest file is absent or unreadable
    #[error("manifest not readable at {path}: {source}")]
    Unreadable {
        /// Expected manifest location
        path: PathBuf,
        #[source]
        /// IO error source
        source: std::io::Error,
    },

    /// Manifest does not match the expected schema
    #[error("malformed manifest at {path}: {source}")]
    Malformed {
        /// Manifest location
        path: PathBuf,
        #[source]
        /// JSON error source
        source: serde_json::Error,
    },
}

impl ManifestParseError {
    /// Path of the manifest that failed to load
    pub fn path(&self) -> &Path {
        match self {
            Self::Unreadable { path, .. } | Self::Malformed { path, .. } => path,
        }
    }
}

#[derive(Deserialize)]
struct RawRecord {
    name: Option<String>,
    #[serde(default)]
    files: Vec<String>,
    size: u64,
}

#[derive(Deserialize)]
#[serde(try_from = "RawRecord")]
struct ManifestRecord {
    name: String,
    size: u64,
}

impl TryFrom<RawRecord> for ManifestRecord {
    type Error = String;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let name = raw
            .name
            .or_else(|| raw.files.into_iter().next())
            .ok_or_else(|| "record has neither `name` nor `files`".to_string())?;
        Ok(Self {
            name,
            size: raw.size,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestDocument {
    Records(Vec<ManifestRecord>),
    Stats { assets: Vec<ManifestRecord> },
}

/// Parse manifest JSON into a snapshot, preserving record order
///
/// # Examples
///
/// ```
/// use bundle_delta::snapshot::parse_manifest;
///
/// let snapshot = parse_manifest(r#"{"assets": [{"name": "main.js", "size": 10, "chunks": [0]}]}"#)?;
/// assert_eq!(snapshot.artifacts()[0].name, "main.js");
/// # Ok::<(), serde_json::Error>(())
/// ```
pub fn parse_manifest(contents: &str) -> Result<ArtifactSizeSnapshot, serde_json::Error> {
    let records = match serde_json::from_str::<ManifestDocument>(contents)? {
        ManifestDocument::Records(records) => records,
        ManifestDocument::Stats { assets } => assets,
    };

    Ok(records
        .into_iter()
        .map(|record| ArtifactSize::new(record.name, record.size))
        .collect())
}

/// Read and parse the manifest at `path`
pub async fn read_manifest(path: &Path) -> Result<ArtifactSizeSnapshot, ManifestParseError> {
    let contents =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ManifestParseError::Unreadable {
                path: path.to_path_buf(),
                source,
            })?;

    parse_manifest(&contents).map_err(|source| ManifestParseError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}
