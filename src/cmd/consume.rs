//! Consume command implementation
//!
//! Handles `bundle-delta consume`: read newline-delimited webhook payloads
//! from stdin and run each accepted event as its own task. A failing or
//! panicking run is logged; the loop keeps going until stdin closes.

use anyhow::{Context, Result};
use log::{error, info, warn};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;

use crate::pipeline::{Orchestrator, PullRequestEvent, RunOutcome};

use super::{build_orchestrator, load_settings, require_tools};

/// Totals after the input is exhausted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumeSummary {
    /// Lines that were not valid events
    pub malformed: usize,
    /// Events ignored by action or allowlist
    pub ignored: usize,
    /// Runs that reached a verdict
    pub succeeded: usize,
    /// Runs aborted by an error
    pub failed: usize,
    /// Runs that panicked
    pub crashed: usize,
}

impl ConsumeSummary {
    fn record(&mut self, outcome: &RunOutcome) {
        match outcome {
            RunOutcome::Ignored(_) => self.ignored += 1,
            RunOutcome::Succeeded(_) => self.succeeded += 1,
            RunOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Serve events from stdin until it closes
pub async fn cmd_consume(config: Option<&Path>, dry_run: bool) -> Result<()> {
    let settings = Arc::new(load_settings(config)?);
    require_tools(&settings)?;
    let orchestrator = build_orchestrator(settings, dry_run)?;

    let summary = consume(orchestrator, BufReader::new(tokio::io::stdin())).await?;
    info!(
        "input closed: {} succeeded, {} failed, {} ignored, {} malformed, {} crashed",
        summary.succeeded, summary.failed, summary.ignored, summary.malformed, summary.crashed
    );
    Ok(())
}

/// Spawn one run per event line of `input`, then wait for all of them
pub async fn consume<R>(orchestrator: Orchestrator, input: R) -> Result<ConsumeSummary>
where
    R: AsyncBufRead + Unpin,
{
    let mut summary = ConsumeSummary::default();
    let mut runs = JoinSet::new();
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await.context("Failed to read events")? {
        if line.trim().is_empty() {
            continue;
        }
        let event = match PullRequestEvent::from_json(&line) {
            Ok(event) => event,
            Err(e) => {
                warn!("skipping malformed event: {}", e);
                summary.malformed += 1;
                continue;
            }
        };

        let orchestrator = orchestrator.clone();
        runs.spawn(async move { orchestrator.handle(&event).await });

        while let Some(joined) = runs.try_join_next() {
            record(&mut summary, joined);
        }
    }

    while let Some(joined) = runs.join_next().await {
        record(&mut summary, joined);
    }
    Ok(summary)
}

fn record(summary: &mut ConsumeSummary, joined: Result<RunOutcome, tokio::task::JoinError>) {
    match joined {
        Ok(outcome) => summary.record(&outcome),
        Err(e) => {
            error!("run task ended abnormally: {}", e);
            summary.crashed += 1;
        }
    }
}
