//! Command handlers for the bundle-delta CLI
//!
//! Each submodule handles one CLI command. Handlers return `anyhow::Result`
//! and wrap user-facing failures in [`BundleDeltaError`] so `main` can pick
//! the exit code.

pub mod compare;
pub mod consume;
pub mod run;
pub mod tools;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use crate::config::{ConfigLoader, Settings};
use crate::error::BundleDeltaError;
use crate::pipeline::Orchestrator;
use crate::publish::{ArtifactPublisher, HttpObjectStore, MemoryPublisher, StoreSetupError};
use crate::runner::CommandBuildRunner;
use crate::status::{GitHubStatusReporter, MemoryStatusReporter, StatusReporter};
use crate::tools::{ToolChain, ToolError};

pub use compare::cmd_compare;
pub use consume::cmd_consume;
pub use run::cmd_run;
pub use tools::cmd_tools;

/// Load settings, mapping failures to [`BundleDeltaError::ConfigInvalid`]
pub fn load_settings(config: Option<&Path>) -> Result<Settings> {
    ConfigLoader::load(config).map_err(|e| {
        BundleDeltaError::ConfigInvalid {
            message: format!("{:#}", e),
        }
        .into()
    })
}

/// Wire the production collaborators.
///
/// With `dry_run`, builds still run but statuses and uploads stay in memory.
pub fn build_orchestrator(settings: Arc<Settings>, dry_run: bool) -> Result<Orchestrator> {
    let runner = Arc::new(CommandBuildRunner::new(settings.clone()));

    let (status, publisher): (Arc<dyn StatusReporter>, Arc<dyn ArtifactPublisher>) = if dry_run {
        (
            Arc::new(MemoryStatusReporter::new()),
            Arc::new(MemoryPublisher::new()),
        )
    } else {
        if settings.storage.endpoint.trim().is_empty() {
            return Err(BundleDeltaError::ConfigInvalid {
                message: "storage.endpoint is required unless --dry-run is given".to_string(),
            }
            .into());
        }
        let status = GitHubStatusReporter::new(&settings.status).map_err(|e| match e {
            crate::status::StatusPostError::Transport(source) => BundleDeltaError::ClientSetup {
                service: "status API".to_string(),
                source,
            },
            other => BundleDeltaError::ConfigInvalid {
                message: other.to_string(),
            },
        })?;
        let store = HttpObjectStore::new(&settings.storage).map_err(|e| match e {
            StoreSetupError::Client(source) => BundleDeltaError::ClientSetup {
                service: "object storage".to_string(),
                source,
            },
            invalid => BundleDeltaError::ConfigInvalid {
                message: invalid.to_string(),
            },
        })?;
        (Arc::new(status), Arc::new(store))
    };

    Ok(Orchestrator::new(settings, runner, status, publisher))
}

/// Verify git and the configured build programs are installed
pub fn require_tools(settings: &Settings) -> Result<()> {
    match ToolChain::from_settings(&settings.build).check_required() {
        Ok(()) => Ok(()),
        Err(ToolError::MissingTool { tool, install_hint }) => {
            Err(BundleDeltaError::ToolMissing { tool, install_hint }.into())
        }
        Err(e) => Err(e.into()),
    }
}
