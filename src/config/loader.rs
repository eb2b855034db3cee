//! Settings loading: defaults, optional TOML file, environment overrides

use super::file::{Settings, CONFIG_FILE_NAME};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Handles loading settings at startup
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load settings from `path`, or from `bundle-delta.toml` in the current
    /// directory when no path is given, then apply environment overrides.
    ///
    /// A missing default file is not an error; a missing explicit file is.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use bundle_delta::config::ConfigLoader;
    ///
    /// let settings = ConfigLoader::load(None)?;
    /// println!("working root: {}", settings.workspace.root.display());
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Load settings with a custom environment lookup
    pub fn load_with_env<F>(path: Option<&Path>, env: F) -> Result<Settings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = PathBuf::from(CONFIG_FILE_NAME);
                match std::fs::read_to_string(&default_path) {
                    Ok(contents) => Self::from_toml(&contents)
                        .with_context(|| format!("Failed to parse {}", default_path.display()))?,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Settings::default(),
                    Err(e) => {
                        return Err(e)
                            .with_context(|| format!("Failed to read {}", default_path.display()))
                    }
                }
            }
        };

        Self::apply_env(&mut settings, env)?;
        settings.validate().context("Invalid configuration")?;
        Ok(settings)
    }

    /// Read settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Settings> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Parse settings from TOML text; absent fields keep their defaults
    pub fn from_toml(contents: &str) -> Result<Settings> {
        let settings: Settings = toml_edit::de::from_str(contents)?;
        Ok(settings)
    }

    /// Apply `BUNDLE_DELTA_*` and `GITHUB_TOKEN` overrides
    pub fn apply_env<F>(settings: &mut Settings, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = env("BUNDLE_DELTA_WORK_ROOT") {
            settings.workspace.root = PathBuf::from(root);
        }
        if let Some(path) = env("BUNDLE_DELTA_MANIFEST_PATH") {
            settings.build.manifest_path = PathBuf::from(path);
        }
        if let Some(command) = env("BUNDLE_DELTA_INSTALL_COMMAND") {
            settings.build.install_command = split_command(&command);
        }
        if let Some(command) = env("BUNDLE_DELTA_BUILD_COMMAND") {
            settings.build.build_command = split_command(&command);
        }
        if let Some(threshold) = env("BUNDLE_DELTA_THRESHOLD_BYTES") {
            settings.pipeline.size_increase_threshold_bytes =
                threshold.trim().parse().with_context(|| {
                    format!("BUNDLE_DELTA_THRESHOLD_BYTES is not an integer: '{}'", threshold)
                })?;
        }
        if let Some(branch) = env("BUNDLE_DELTA_BASELINE_BRANCH") {
            settings.pipeline.baseline_branch = branch;
        }
        if let Some(reuse) = env("BUNDLE_DELTA_REUSE_BASELINE") {
            settings.pipeline.reuse_baseline = parse_flag(&reuse).with_context(|| {
                format!("BUNDLE_DELTA_REUSE_BASELINE is not a boolean: '{}'", reuse)
            })?;
        }
        if let Some(repos) = env("BUNDLE_DELTA_REPOSITORIES") {
            settings.pipeline.monitored_repositories = repos
                .split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(token) = env("GITHUB_TOKEN") {
            settings.status.token = Some(token);
        }
        if let Some(endpoint) = env("BUNDLE_DELTA_STORAGE_ENDPOINT") {
            settings.storage.endpoint = endpoint;
        }
        if let Some(bucket) = env("BUNDLE_DELTA_STORAGE_BUCKET") {
            settings.storage.bucket = bucket;
        }
        if let Some(url) = env("BUNDLE_DELTA_STORAGE_PUBLIC_URL") {
            settings.storage.public_base_url = Some(url);
        }
        if let Some(token) = env("BUNDLE_DELTA_STORAGE_TOKEN") {
            settings.storage.token = Some(token);
        }
        Ok(())
    }
}

fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => anyhow::bail!("expected true/false"),
    }
}
