//! Tools command implementation
//!
//! Handles `bundle-delta tools`, which prints whether every program a run
//! shells out to is installed.

use anyhow::Result;
use std::path::Path;

use crate::error::BundleDeltaError;
use crate::infra::RealCommandExecutor;
use crate::tools::{ToolChain, ToolError};

use super::load_settings;

/// Check and print the status of git and the configured build programs
pub async fn cmd_tools(config: Option<&Path>) -> Result<()> {
    let settings = load_settings(config)?;
    let toolchain = ToolChain::from_settings(&settings.build);

    match toolchain.check_all(&RealCommandExecutor).await {
        Ok(()) => Ok(()),
        Err(ToolError::MissingTool { tool, install_hint }) => {
            Err(BundleDeltaError::ToolMissing { tool, install_hint }.into())
        }
        Err(e) => Err(e.into()),
    }
}
