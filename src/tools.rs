//! Tool detection and verification module
//!
//! A run shells out to three programs, all of which must be on `PATH`:
//! - git (clone)
//! - the install command's program (`npm` by default)
//! - the build command's program (`npm` by default)

use console::style;
use std::ffi::OsString;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::BuildSettings;
use crate::infra::{CommandExecutor, CommandSpec};

/// Errors that can occur during tool checks
#[derive(Error, Debug)]
pub enum ToolError {
    /// I/O error while running the tool
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Version query exited non-zero
    #[error("Failed to get version for {0}")]
    VersionFailed(String),

    /// Required tool is missing
    #[error("Required tool missing: {tool}")]
    MissingTool {
        /// Program name
        tool: String,
        /// How to install it
        install_hint: String,
    },
}

/// A program a run depends on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    /// Human-readable name
    pub name: String,
    /// Binary name looked up in `PATH`
    pub binary: String,
    /// Installation advice shown when missing
    pub install_hint: String,
}

impl Tool {
    /// Describe a tool
    pub fn new(
        name: impl Into<String>,
        binary: impl Into<String>,
        install_hint: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            binary: binary.into(),
            install_hint: install_hint.into(),
        }
    }

    /// Version line printed by `<binary> --version`
    pub async fn version<CE: CommandExecutor>(&self, cmd_executor: &CE) -> Result<String, ToolError> {
        let output = cmd_executor
            .output(&CommandSpec::new(&self.binary).arg("--version"))
            .await?;
        if !output.succeeded() {
            return Err(ToolError::VersionFailed(self.name.clone()));
        }
        Ok(output.stdout.lines().next().unwrap_or("").trim().to_string())
    }
}

/// Status of a tool check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStatus {
    /// Found, with its version line
    Available(String),
    /// Found, but `--version` failed
    InstalledButVersionUnknown,
    /// Not on the search path
    Missing,
}

/// Every program a run needs, derived from the build settings
///
/// # Examples
///
/// ```
/// use bundle_delta::config::BuildSettings;
/// use bundle_delta::tools::ToolChain;
///
/// let toolchain = ToolChain::from_settings(&BuildSettings::default());
/// let binaries: Vec<_> = toolchain.tools().iter().map(|t| t.binary.as_str()).collect();
/// assert_eq!(binaries, vec!["git", "npm"]);
/// ```
#[derive(Debug, Clone)]
pub struct ToolChain {
    tools: Vec<Tool>,
    search_path: Option<OsString>,
}

impl ToolChain {
    /// Tools for the configured clone, install and build commands
    pub fn from_settings(build: &BuildSettings) -> Self {
        let mut tools = vec![Tool::new(
            "git",
            "git",
            "install git from https://git-scm.com or your package manager",
        )];
        for command in [&build.install_command, &build.build_command] {
            if let Some(program) = command.first() {
                if tools.iter().all(|tool| &tool.binary != program) {
                    tools.push(Tool::new(
                        program.clone(),
                        program.clone(),
                        install_hint(program),
                    ));
                }
            }
        }
        Self {
            tools,
            search_path: None,
        }
    }

    /// Look tools up in `paths` instead of `PATH`
    pub fn with_search_path(mut self, paths: impl Into<OsString>) -> Self {
        self.search_path = Some(paths.into());
        self
    }

    /// Tools in check order, without duplicates
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Resolved location of `tool`
    pub fn locate(&self, tool: &Tool) -> Option<PathBuf> {
        match &self.search_path {
            Some(paths) => {
                let cwd = std::env::current_dir().ok()?;
                which::which_in(&tool.binary, Some(paths), cwd).ok()
            }
            None => which::which(&tool.binary).ok(),
        }
    }

    /// Fail on the first tool that cannot be found
    pub fn check_required(&self) -> Result<(), ToolError> {
        match self.tools.iter().find(|tool| self.locate(tool).is_none()) {
            Some(tool) => Err(ToolError::MissingTool {
                tool: tool.binary.clone(),
                install_hint: tool.install_hint.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Status of every tool
    pub async fn statuses<CE: CommandExecutor>(&self, cmd_executor: &CE) -> Vec<(&Tool, ToolStatus)> {
        let mut statuses = Vec::with_capacity(self.tools.len());
        for tool in &self.tools {
            let status = if self.locate(tool).is_none() {
                ToolStatus::Missing
            } else {
                match tool.version(cmd_executor).await {
                    Ok(version) => ToolStatus::Available(version),
                    Err(_) => ToolStatus::InstalledButVersionUnknown,
                }
            };
            statuses.push((tool, status));
        }
        statuses
    }

    /// Print every tool's status; fails if any is missing
    pub async fn check_all<CE: CommandExecutor>(&self, cmd_executor: &CE) -> Result<(), ToolError> {
        println!("\n{} Checking build tools...", style("🔧").bold());

        let mut first_missing = None;
        for (tool, status) in self.statuses(cmd_executor).await {
            match status {
                ToolStatus::Available(version) => println!(
                    "   {} {} - {}",
                    style("✓").green(),
                    style(&tool.name).bold(),
                    style(version).dim()
                ),
                ToolStatus::InstalledButVersionUnknown => println!(
                    "   {} {} - {}",
                    style("✓").green(),
                    style(&tool.name).bold(),
                    style("(version unknown)").dim()
                ),
                ToolStatus::Missing => {
                    println!(
                        "   {} {} - {}",
                        style("✗").red(),
                        style(&tool.name).bold(),
                        style("NOT FOUND").red()
                    );
                    println!("     {}", style(&tool.install_hint).dim());
                    first_missing.get_or_insert(tool);
                }
            }
        }

        match first_missing {
            Some(tool) => Err(ToolError::MissingTool {
                tool: tool.binary.clone(),
                install_hint: tool.install_hint.clone(),
            }),
            None => Ok(()),
        }
    }
}

fn install_hint(program: &str) -> String {
    match program {
        "npm" | "npx" => "install Node.js from https://nodejs.org".to_string(),
        "yarn" => "corepack enable (ships with Node.js), or npm install -g yarn".to_string(),
        "pnpm" => "corepack enable (ships with Node.js), or npm install -g pnpm".to_string(),
        other => format!("make sure '{}' is installed and on PATH", other),
    }
}
