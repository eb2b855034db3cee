//! Settings data structures

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::runner::BuildStep;

/// Default settings file name
pub const CONFIG_FILE_NAME: &str = "bundle-delta.toml";

/// Default size increase (bytes) above which a change fails
pub const DEFAULT_THRESHOLD_BYTES: i64 = 2000;

/// Complete service configuration, constructed once at startup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Working directory layout
    pub workspace: WorkspaceSettings,
    /// Build commands and manifest location
    pub build: BuildSettings,
    /// Pipeline behaviour and verdict threshold
    pub pipeline: PipelineSettings,
    /// Commit status reporting
    pub status: StatusSettings,
    /// Object storage for published files
    pub storage: StorageSettings,
}

/// Where branch checkouts live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceSettings {
    /// Root directory; each `owner/repo/branch` gets its own subtree
    pub root: PathBuf,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            root: std::env::temp_dir().join("bundle-delta"),
        }
    }
}

/// A named, expected non-zero exit of one build step.
///
/// Some build tools exit non-zero after a successful build in certain
/// configurations. Listing the exit here makes the runner accept it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitException {
    /// Human-readable name, logged when the exception applies
    pub name: String,
    /// Step the exception applies to
    pub step: BuildStep,
    /// Exit code treated as success
    pub exit_code: i32,
}

/// Build commands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Clone URL template with `{owner}` and `{repo}` placeholders
    pub clone_url_template: String,
    /// Dependency install command line
    pub install_command: Vec<String>,
    /// Build-and-analyze command line
    pub build_command: Vec<String>,
    /// Manifest path relative to the working directory
    pub manifest_path: PathBuf,
    /// Bundle analyzer report to publish if present, relative to the working directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzer_report_path: Option<PathBuf>,
    /// Accepted non-zero exits
    pub exit_exceptions: Vec<ExitException>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            clone_url_template: "https://github.com/{owner}/{repo}.git".to_string(),
            install_command: vec!["npm".to_string(), "install".to_string()],
            build_command: vec!["npm".to_string(), "run".to_string(), "build".to_string()],
            manifest_path: PathBuf::from("dist/stats.json"),
            analyzer_report_path: Some(PathBuf::from("dist/report.html")),
            exit_exceptions: Vec::new(),
        }
    }
}

impl BuildSettings {
    /// Clone URL for a repository
    pub fn clone_url(&self, owner: &str, repo: &str) -> String {
        self.clone_url_template
            .replace("{owner}", owner)
            .replace("{repo}", repo)
    }

    /// Exception matching a step's non-zero exit, if one is configured
    pub fn exit_exception(&self, step: BuildStep, exit_code: i32) -> Option<&ExitException> {
        self.exit_exceptions
            .iter()
            .find(|exception| exception.step == step && exception.exit_code == exit_code)
    }
}

/// Pipeline behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Branch every change is compared against
    pub baseline_branch: String,
    /// Total increase in bytes above which the verdict is failure
    pub size_increase_threshold_bytes: i64,
    /// Use the baseline working directory as built out-of-band
    pub reuse_baseline: bool,
    /// `owner/repo` allowlist; empty accepts every repository
    pub monitored_repositories: Vec<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            baseline_branch: "master".to_string(),
            size_increase_threshold_bytes: DEFAULT_THRESHOLD_BYTES,
            reuse_baseline: false,
            monitored_repositories: Vec::new(),
        }
    }
}

impl PipelineSettings {
    /// Whether events for `owner/repo` should be processed
    pub fn is_monitored(&self, owner: &str, repo: &str) -> bool {
        self.monitored_repositories.is_empty()
            || self.monitored_repositories.iter().any(|entry| {
                entry
                    .split_once('/')
                    .is_some_and(|(o, r)| o == owner && r == repo)
            })
    }
}

/// Commit status API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusSettings {
    /// API base URL
    pub api_base_url: String,
    /// Status context shown on the pull request
    pub context: String,
    /// API token
    #[serde(skip_serializing)]
    pub token: Option<String>,
}

impl Default for StatusSettings {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".to_string(),
            context: "bundle-size".to_string(),
            token: None,
        }
    }
}

/// Object storage settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Upload endpoint
    pub endpoint: String,
    /// Bucket name
    pub bucket: String,
    /// Public base URL of uploaded objects; defaults to `endpoint/bucket`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,
    /// Bearer token for uploads
    #[serde(skip_serializing)]
    pub token: Option<String>,
}

impl Settings {
    /// Working directory for one branch of one repository
    pub fn branch_dir(&self, owner: &str, repo: &str, branch: &str) -> PathBuf {
        self.workspace
            .root
            .join(path_segment(owner))
            .join(path_segment(repo))
            .join(path_segment(branch))
    }

    /// Validate settings consistency
    ///
    /// # Examples
    ///
    /// ```
    /// use bundle_delta::config::Settings;
    ///
    /// let mut settings = Settings::default();
    /// assert!(settings.validate().is_ok());
    ///
    /// settings.build.build_command.clear();
    /// assert!(settings.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if self.build.install_command.is_empty() {
            anyhow::bail!("build.install_command must not be empty");
        }
        if self.build.build_command.is_empty() {
            anyhow::bail!("build.build_command must not be empty");
        }
        validate_relative(&self.build.manifest_path, "build.manifest_path")?;
        if let Some(report) = &self.build.analyzer_report_path {
            validate_relative(report, "build.analyzer_report_path")?;
        }
        if self.pipeline.baseline_branch.trim().is_empty() {
            anyhow::bail!("pipeline.baseline_branch must not be empty");
        }
        if self.pipeline.size_increase_threshold_bytes < 0 {
            anyhow::bail!(
                "pipeline.size_increase_threshold_bytes must not be negative (got {})",
                self.pipeline.size_increase_threshold_bytes
            );
        }
        for entry in &self.pipeline.monitored_repositories {
            match entry.split_once('/') {
                Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {}
                _ => anyhow::bail!(
                    "monitored repository '{}' must have the form owner/repo",
                    entry
                ),
            }
        }
        Ok(())
    }
}

fn validate_relative(path: &Path, field: &str) -> Result<()> {
    if path.as_os_str().is_empty() {
        anyhow::bail!("{} must not be empty", field);
    }
    if path.is_absolute() {
        anyhow::bail!(
            "{} must be relative to the working directory (got {})",
            field,
            path.display()
        );
    }
    Ok(())
}

/// Map a name onto a single safe path component
fn path_segment(name: &str) -> String {
    let segment: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if segment.chars().all(|c| c == '.') {
        segment.replace('.', "_")
    } else {
        segment
    }
}
