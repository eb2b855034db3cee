//! CLI-facing errors with contextual suggestions
//!
//! Library modules return their own error enums. At the binary boundary
//! those are wrapped in [`BundleDeltaError`], which adds:
//! - an actionable suggestion
//! - a sysexits-style exit code
//!
//! [`ErrorFormatter`] prints any `anyhow::Error` chain with styling and,
//! when the chain holds a [`BundleDeltaError`], its suggestion.
//!
//! # Examples
//!
//! ```
//! use bundle_delta::error::{BundleDeltaError, ErrorFormatter};
//!
//! let err = anyhow::Error::new(BundleDeltaError::SizeIncreaseExceeded {
//!     total_delta: 4000,
//!     threshold: 2000,
//! });
//! assert_eq!(ErrorFormatter::exit_code(&err), 1);
//! assert!(ErrorFormatter::format(&err).contains("help:"));
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::fmt::{human_size, signed_size};
use crate::pipeline::PipelineError;
use crate::snapshot::ManifestParseError;

/// Errors reported by the `bundle-delta` binary
#[derive(Error, Debug)]
pub enum BundleDeltaError {
    /// Required tool is not on `PATH`
    #[error("Tool not installed: {tool}")]
    ToolMissing {
        /// Program name
        tool: String,
        /// How to install it
        install_hint: String,
    },

    /// Settings could not be assembled
    #[error("Invalid configuration: {message}")]
    ConfigInvalid {
        /// What is wrong
        message: String,
    },

    /// Event payload file could not be read
    #[error("Cannot read event payload {path}")]
    EventUnreadable {
        /// Payload location
        path: PathBuf,
        #[source]
        /// IO error source
        source: std::io::Error,
    },

    /// Event payload is not a pull request event
    #[error("Malformed pull request event")]
    EventMalformed {
        #[source]
        /// JSON error source
        source: serde_json::Error,
    },

    /// A local manifest given to `compare` could not be loaded
    #[error(transparent)]
    Manifest(#[from] ManifestParseError),

    /// HTTP client for a collaborator could not be created
    #[error("Cannot create {service} client")]
    ClientSetup {
        /// Which collaborator
        service: String,
        #[source]
        /// HTTP client error
        source: reqwest::Error,
    },

    /// The size increase is above the configured threshold
    #[error(
        "Total size change {} exceeds the {} threshold",
        delta_text(.total_delta),
        threshold_text(.threshold)
    )]
    SizeIncreaseExceeded {
        /// Total delta in bytes
        total_delta: i64,
        /// Allowed increase in bytes
        threshold: i64,
    },

    /// A pipeline run was aborted
    #[error("Run failed")]
    RunFailed(#[from] PipelineError),

    /// Generic I/O error with context
    #[error("I/O error: {context}")]
    Io {
        /// Where the error occurred
        context: String,
        #[source]
        /// IO error source
        source: std::io::Error,
    },
}

impl BundleDeltaError {
    /// Get an actionable suggestion for resolving this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use bundle_delta::error::BundleDeltaError;
    ///
    /// let error = BundleDeltaError::ToolMissing {
    ///     tool: "git".to_string(),
    ///     install_hint: "install git from your package manager".to_string(),
    /// };
    /// assert!(error.suggestion().unwrap().contains("package manager"));
    /// ```
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::ToolMissing { install_hint, .. } => {
                Some(format!("Install it: {}", install_hint))
            }
            Self::ConfigInvalid { .. } => Some(
                "Check bundle-delta.toml and the BUNDLE_DELTA_* environment variables".to_string(),
            ),
            Self::EventUnreadable { path, .. } => Some(format!(
                "Ensure {} exists and is readable",
                path.display()
            )),
            Self::EventMalformed { .. } => Some(
                "Pass the raw `pull_request` webhook body; it needs action, pull_request.head and repository"
                    .to_string(),
            ),
            Self::Manifest(e) => Some(format!(
                "Expected a JSON array of {{\"name\", \"size\"}} records or a stats object with `assets` at {}",
                e.path().display()
            )),
            Self::ClientSetup { .. } => {
                Some("Check the TLS and proxy settings of this machine".to_string())
            }
            Self::SizeIncreaseExceeded { .. } => Some(
                "Look at the changed bundles in the report, or raise pipeline.size_increase_threshold_bytes"
                    .to_string(),
            ),
            Self::RunFailed(e) => match e.build_error() {
                Some(build) => Some(format!(
                    "Reproduce the {} step locally in a fresh checkout of the branch",
                    build.step
                )),
                None if e.manifest_error().is_some() => Some(
                    "Check that the build command writes the manifest at build.manifest_path"
                        .to_string(),
                ),
                None => None,
            },
            Self::Io { context, .. } => Some(format!(
                "Check file permissions and that {} is accessible",
                context
            )),
        }
    }

    /// Get the process exit code for this error, following sysexits.h.
    ///
    /// # Examples
    ///
    /// ```
    /// use bundle_delta::error::BundleDeltaError;
    ///
    /// let error = BundleDeltaError::ConfigInvalid { message: "bad".to_string() };
    /// assert_eq!(error.exit_code(), 78);
    /// ```
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ToolMissing { .. } => 127, // Command not found
            Self::ConfigInvalid { .. } => 78, // EX_CONFIG
            Self::EventUnreadable { .. } => 66, // EX_NOINPUT
            Self::EventMalformed { .. } => 65, // EX_DATAERR
            Self::Manifest(ManifestParseError::Unreadable { .. }) => 66,
            Self::Manifest(ManifestParseError::Malformed { .. }) => 65,
            Self::ClientSetup { .. } => 69, // EX_UNAVAILABLE
            Self::SizeIncreaseExceeded { .. } => 1,
            Self::RunFailed(_) => 1,
            Self::Io { .. } => 74, // EX_IOERR
        }
    }
}

fn delta_text(total_delta: &i64) -> String {
    signed_size(*total_delta)
}

fn threshold_text(threshold: &i64) -> String {
    human_size(*threshold)
}

/// Error formatter with colors and structured output
pub struct ErrorFormatter;

impl ErrorFormatter {
    /// Format the error chain and any suggestion
    pub fn format(error: &anyhow::Error) -> String {
        use console::style;

        let mut output = String::new();
        output.push_str(&format!("{} {}\n", style("error:").red().bold(), error));

        let mut source = error.source();
        let mut indent = 1;
        while let Some(err) = source {
            output.push_str(&format!(
                "{}{} {}\n",
                "  ".repeat(indent),
                style("caused by:").yellow(),
                err
            ));
            source = err.source();
            indent += 1;
        }

        if let Some(suggestion) = error
            .downcast_ref::<BundleDeltaError>()
            .and_then(BundleDeltaError::suggestion)
        {
            output.push_str(&format!(
                "\n{} {}\n",
                style("help:").cyan().bold(),
                suggestion
            ));
        }

        output
    }

    /// Exit code for an error, 1 unless it is a [`BundleDeltaError`]
    pub fn exit_code(error: &anyhow::Error) -> i32 {
        error
            .downcast_ref::<BundleDeltaError>()
            .map_or(1, BundleDeltaError::exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{BuildError, BuildStep, PrepareError};
    use anyhow::Context;

    #[test]
    fn test_size_increase_message_uses_human_sizes() {
        let err = BundleDeltaError::SizeIncreaseExceeded {
            total_delta: 3999,
            threshold: 2000,
        };
        assert_eq!(
            err.to_string(),
            "Total size change +4kB exceeds the 2kB threshold"
        );
    }

    #[test]
    fn test_run_failed_suggests_reproducing_failed_step() {
        let err = BundleDeltaError::RunFailed(PipelineError::Prepare {
            branch: "feature".to_string(),
            source: PrepareError::Build(BuildError {
                step: BuildStep::Install,
                exit_code: Some(1),
                diagnostics: "npm ERR!".to_string(),
            }),
        });

        assert!(err.suggestion().unwrap().contains("install step"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_exit_codes_follow_conventions() {
        let tool = BundleDeltaError::ToolMissing {
            tool: "git".to_string(),
            install_hint: "apt install git".to_string(),
        };
        assert_eq!(tool.exit_code(), 127);

        let event = BundleDeltaError::EventUnreadable {
            path: PathBuf::from("event.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(event.exit_code(), 66);
    }

    #[test]
    fn test_formatter_prints_chain_and_help() {
        let err = Err::<(), _>(BundleDeltaError::EventUnreadable {
            path: PathBuf::from("event.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        })
        .context("while starting run")
        .unwrap_err();

        let formatted = console::strip_ansi_codes(&ErrorFormatter::format(&err)).to_string();
        assert!(formatted.contains("error: while starting run"));
        assert!(formatted.contains("caused by: Cannot read event payload event.json"));
        assert!(formatted.contains("caused by: no such file"));
        assert!(formatted.contains("help: Ensure event.json exists"));
        assert_eq!(ErrorFormatter::exit_code(&err), 66);
    }

    #[test]
    fn test_formatter_exit_code_defaults_to_one() {
        let err = anyhow::anyhow!("plain failure");
        assert_eq!(ErrorFormatter::exit_code(&err), 1);
    }
}
