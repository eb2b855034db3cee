#![warn(missing_docs)]
#![warn(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! bundle-delta library
//!
//! Measures how a pull request changes the size of a web application's
//! build output. For each accepted pull request event the pipeline builds
//! the baseline branch and the change branch, diffs their artifact
//! manifests, renders an HTML report, publishes it, and posts a pass/fail
//! commit status.
//!
//! # Basic Example
//!
//! Diffing two snapshots and judging the result:
//!
//! ```
//! use bundle_delta::diff::{diff, Classification};
//! use bundle_delta::pipeline::Verdict;
//! use bundle_delta::snapshot::{ArtifactSize, ArtifactSizeSnapshot};
//!
//! let baseline = ArtifactSizeSnapshot::new(vec![
//!     ArtifactSize::new("main.js", 1000),
//!     ArtifactSize::new("legacy.js", 300),
//! ]);
//! let current = ArtifactSizeSnapshot::new(vec![ArtifactSize::new("main.js", 1200)]);
//!
//! let result = diff(&baseline, &current);
//! assert_eq!(result.entries()[0].classification, Classification::Grew);
//! assert_eq!(result.entries()[1].classification, Classification::Removed);
//! assert_eq!(result.total_delta(), -100);
//!
//! assert!(Verdict::judge(result.total_delta(), 2000).passed());
//! ```
//!
//! # Running the pipeline
//!
//! The orchestrator works over trait objects, so collaborators can be
//! swapped for the in-memory implementations:
//!
//! ```
//! use std::sync::Arc;
//! use bundle_delta::config::Settings;
//! use bundle_delta::pipeline::{Orchestrator, PullRequestEvent, RunOutcome};
//! use bundle_delta::publish::MemoryPublisher;
//! use bundle_delta::runner::FakeBuildRunner;
//! use bundle_delta::status::MemoryStatusReporter;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let orchestrator = Orchestrator::new(
//!     Arc::new(Settings::default()),
//!     Arc::new(FakeBuildRunner::new()),
//!     Arc::new(MemoryStatusReporter::new()),
//!     Arc::new(MemoryPublisher::new()),
//! );
//! let event = PullRequestEvent::from_json(
//!     r#"{"action":"closed","pull_request":{"head":{"ref":"f","sha":"s"}},
//!         "repository":{"name":"web","owner":{"login":"acme"}}}"#,
//! ).unwrap();
//!
//! assert!(matches!(orchestrator.handle(&event).await, RunOutcome::Ignored(_)));
//! # });
//! ```

/// Command handlers for CLI operations
pub mod cmd;
/// Settings loading and validation
pub mod config;
/// Artifact size diff engine
pub mod diff;
/// Errors with contextual suggestions
pub mod error;
/// Shared formatting utilities
pub mod fmt;
/// Infrastructure traits for command execution
pub mod infra;
/// Pull request pipeline orchestration
pub mod pipeline;
/// Publishing run files to object storage
pub mod publish;
/// HTML report rendering
pub mod report;
/// Branch build runner
pub mod runner;
/// Artifact size snapshots and manifest parsing
pub mod snapshot;
/// Commit status reporting
pub mod status;
/// Tool detection and version checking
pub mod tools;
