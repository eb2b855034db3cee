//! Error types for a pipeline run

use std::path::PathBuf;
use thiserror::Error;

use crate::publish::PublishError;
use crate::runner::{BuildError, PrepareError};
use crate::snapshot::ManifestParseError;

/// Errors that abort a run and drive it to `Failed`
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Building or measuring a branch failed
    #[error("{branch} branch: {source}")]
    Prepare {
        /// Branch being prepared
        branch: String,
        #[source]
        /// Underlying build or manifest error
        source: PrepareError,
    },

    /// Uploading a run file failed
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// Writing the report or reading a file to publish failed
    #[error("I/O error at {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        #[source]
        /// IO error source
        source: std::io::Error,
    },
}

impl PipelineError {
    pub(crate) fn prepare(branch: &str, source: PrepareError) -> Self {
        Self::Prepare {
            branch: branch.to_string(),
            source,
        }
    }

    /// The build step error, when a step failed
    pub fn build_error(&self) -> Option<&BuildError> {
        match self {
            Self::Prepare {
                source: PrepareError::Build(e),
                ..
            } => Some(e),
            _ => None,
        }
    }

    /// The manifest error, when a build produced no usable manifest
    pub fn manifest_error(&self) -> Option<&ManifestParseError> {
        match self {
            Self::Prepare {
                source: PrepareError::Manifest(e),
                ..
            } => Some(e),
            _ => None,
        }
    }

    /// Short summary for the failing commit status
    pub fn status_description(&self) -> String {
        match self {
            Self::Prepare { branch, source } => {
                format!("Bundle size check failed: {} step of {}", source.step(), branch)
            }
            Self::Publish(_) => "Bundle size check failed: could not publish the report".to_string(),
            Self::Io { .. } => "Bundle size check failed: could not write the report".to_string(),
        }
    }
}
