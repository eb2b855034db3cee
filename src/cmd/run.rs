//! Run command implementation
//!
//! Handles `bundle-delta run --event <file>`: process one webhook payload to
//! a terminal outcome and report it on the console.

use anyhow::Result;
use console::style;
use std::path::Path;
use std::sync::Arc;

use crate::error::BundleDeltaError;
use crate::fmt::{signed_size, CHECKMARK, CROSSMARK, INFO, ROCKET};
use crate::pipeline::{accept, PullRequestEvent, RunOutcome};

use super::{build_orchestrator, load_settings, require_tools};

/// Read a pull request event from `path`
pub fn read_event(path: &Path) -> Result<PullRequestEvent> {
    let payload =
        std::fs::read_to_string(path).map_err(|source| BundleDeltaError::EventUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
    let event = PullRequestEvent::from_json(&payload)
        .map_err(|source| BundleDeltaError::EventMalformed { source })?;
    Ok(event)
}

/// Process one event
///
/// # Errors
///
/// Returns an error if:
/// - the event file is missing or malformed
/// - settings are invalid or a required tool is missing
/// - the run failed, or the size increase is above the threshold
pub async fn cmd_run(event_path: &Path, config: Option<&Path>, dry_run: bool) -> Result<()> {
    let event = read_event(event_path)?;
    let settings = Arc::new(load_settings(config)?);

    println!(
        "{} {} {}/{}@{}",
        ROCKET,
        style("bundle-delta").bold(),
        event.owner(),
        event.repo(),
        event.branch()
    );

    // Ignored events need neither tools nor collaborators
    if let Err(reason) = accept(&event, &settings) {
        println!("{} Ignored: {}", INFO, reason);
        return Ok(());
    }
    require_tools(&settings)?;
    let orchestrator = build_orchestrator(settings, dry_run)?;

    match orchestrator.handle(&event).await {
        RunOutcome::Ignored(reason) => {
            println!("{} Ignored: {}", INFO, reason);
            Ok(())
        }
        RunOutcome::Succeeded(completed) => {
            println!("   {}", completed.verdict.description);
            println!("   Report: {}", style(&completed.report_url).cyan());
            if completed.verdict.passed() {
                println!(
                    "{} {} ({})",
                    CHECKMARK,
                    style("Size check passed").green().bold(),
                    signed_size(completed.verdict.total_delta)
                );
                Ok(())
            } else {
                println!("{} {}", CROSSMARK, style("Size check failed").red().bold());
                Err(BundleDeltaError::SizeIncreaseExceeded {
                    total_delta: completed.verdict.total_delta,
                    threshold: completed.verdict.threshold,
                }
                .into())
            }
        }
        RunOutcome::Failed(err) => Err(BundleDeltaError::RunFailed(err).into()),
    }
}
