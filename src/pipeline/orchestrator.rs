//! Pipeline orchestration
//!
//! Drives one accepted event through every stage, in order:
//! pending status, baseline build, change build, diff, report, publish,
//! final status. Any stage error ends the run with one best-effort failure
//! status; the outcome is always returned to the caller.

use futures::future::{try_join, try_join_all};
use log::{error, info, warn};
use std::path::Path;
use std::sync::Arc;

use super::error::PipelineError;
use super::event::{PipelineRun, PullRequestEvent};
use super::locks::DirectoryLocks;
use super::stage::{Builds, Comparison, CompletedRun, IgnoreReason, RenderedReport, RunOutcome, RunState};
use super::verdict::Verdict;
use crate::config::Settings;
use crate::publish::{ArtifactPublisher, ObjectKey, PublishRequest};
use crate::report::{self, FileKind};
use crate::runner::{BuildRunner, PreparedBranch};
use crate::status::{CommitState, StatusReporter, StatusUpdate};

/// Decide whether `event` starts a run under `settings`.
///
/// Only accepted actions on monitored repositories produce a run; anything
/// else is returned as the reason it was ignored.
pub fn accept(event: &PullRequestEvent, settings: &Settings) -> Result<PipelineRun, IgnoreReason> {
    if !event.is_actionable() {
        return Err(IgnoreReason::Action(event.action.clone()));
    }
    if !settings.pipeline.is_monitored(event.owner(), event.repo()) {
        return Err(IgnoreReason::NotMonitored {
            owner: event.owner().to_string(),
            repo: event.repo().to_string(),
        });
    }
    Ok(PipelineRun::from_event(
        event,
        &settings.pipeline.baseline_branch,
    ))
}

/// Runs the size comparison pipeline for pull request events.
///
/// Cloning is cheap; clones share collaborators and settings, so one
/// orchestrator can serve many concurrent runs.
#[derive(Clone)]
pub struct Orchestrator {
    settings: Arc<Settings>,
    runner: Arc<dyn BuildRunner>,
    status: Arc<dyn StatusReporter>,
    publisher: Arc<dyn ArtifactPublisher>,
    locks: DirectoryLocks,
}

impl Orchestrator {
    /// Create an orchestrator over the given collaborators
    pub fn new(
        settings: Arc<Settings>,
        runner: Arc<dyn BuildRunner>,
        status: Arc<dyn StatusReporter>,
        publisher: Arc<dyn ArtifactPublisher>,
    ) -> Self {
        Self {
            settings,
            runner,
            status,
            publisher,
            locks: DirectoryLocks::new(),
        }
    }

    /// Settings the orchestrator was built with
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Handle one event to a terminal outcome
    pub async fn handle(&self, event: &PullRequestEvent) -> RunOutcome {
        let run = match accept(event, &self.settings) {
            Ok(run) => run,
            Err(reason) => {
                info!(
                    "ignoring event for {}/{}: {}",
                    event.owner(),
                    event.repo(),
                    reason
                );
                return RunOutcome::Ignored(reason);
            }
        };
        self.log_state(&run, RunState::Received);

        self.post(
            &run,
            StatusUpdate::new(&run.owner, &run.repo, &run.commit_sha, CommitState::Pending)
                .with_description(format!(
                    "Measuring bundle size against {}",
                    run.baseline_branch
                )),
        )
        .await;
        self.log_state(&run, RunState::Pending);

        match self.execute(&run).await {
            Ok(completed) => {
                self.log_state(&run, RunState::Succeeded);
                RunOutcome::Succeeded(completed)
            }
            Err(err) => {
                error!("[{}] run for {} failed: {}", run.run_id, run, err);
                self.post(
                    &run,
                    StatusUpdate::new(&run.owner, &run.repo, &run.commit_sha, CommitState::Failure)
                        .with_description(err.status_description()),
                )
                .await;
                self.log_state(&run, RunState::Failed);
                RunOutcome::Failed(err)
            }
        }
    }

    async fn execute(&self, run: &PipelineRun) -> Result<CompletedRun, PipelineError> {
        let baseline_dir = self
            .settings
            .branch_dir(&run.owner, &run.repo, &run.baseline_branch);
        let change_dir = self.settings.branch_dir(&run.owner, &run.repo, &run.branch);
        let _guards = self
            .locks
            .acquire(&[baseline_dir.as_path(), change_dir.as_path()])
            .await;

        let builds = self.build(run, &baseline_dir, &change_dir).await?;

        self.log_state(run, RunState::Diffing);
        let comparison = Comparison::from_builds(builds);
        info!(
            "[{}] {} entries, total delta {} bytes",
            run.run_id,
            comparison.diff.len(),
            comparison.total_delta
        );

        self.log_state(run, RunState::Reporting);
        let rendered = self.render(comparison).await?;

        self.log_state(run, RunState::Publishing);
        let report_url = self.publish(&rendered).await?;

        self.log_state(run, RunState::Finalizing);
        let verdict = Verdict::judge(
            rendered.comparison.total_delta,
            self.settings.pipeline.size_increase_threshold_bytes,
        );
        self.post(
            run,
            StatusUpdate::new(&run.owner, &run.repo, &run.commit_sha, verdict.state)
                .with_description(verdict.description.clone())
                .with_target_url(report_url.clone()),
        )
        .await;

        Ok(CompletedRun {
            run_id: run.run_id,
            verdict,
            report_url,
            diff: rendered.comparison.diff,
        })
    }

    async fn build(
        &self,
        run: &PipelineRun,
        baseline_dir: &Path,
        change_dir: &Path,
    ) -> Result<Builds, PipelineError> {
        self.log_state(run, RunState::BaselineBuilding);
        let baseline = if self.settings.pipeline.reuse_baseline {
            self.runner
                .load_prepared(&run.owner, &run.repo, &run.baseline_branch, baseline_dir)
                .await
        } else {
            self.runner
                .prepare_branch(&run.owner, &run.repo, &run.baseline_branch, baseline_dir)
                .await
        };
        let baseline = baseline.map_err(|e| PipelineError::prepare(&run.baseline_branch, e))?;

        self.log_state(run, RunState::ChangeBuilding);
        let change = self
            .runner
            .prepare_branch(&run.owner, &run.repo, &run.branch, change_dir)
            .await
            .map_err(|e| PipelineError::prepare(&run.branch, e))?;

        Ok(Builds {
            run: run.clone(),
            baseline,
            change,
        })
    }

    async fn render(&self, comparison: Comparison) -> Result<RenderedReport, PipelineError> {
        let run = &comparison.builds.run;
        let links = |branch: &str, kind: FileKind| {
            self.publisher
                .public_url(&ObjectKey::new(&run.owner, &run.repo, branch, kind))
        };
        let document = report::render(
            &comparison.diff,
            &run.branch,
            &run.baseline_branch,
            comparison.total_delta,
            &links,
        );

        let path = comparison
            .builds
            .change
            .working_dir
            .join(FileKind::SizeReport.file_name());
        tokio::fs::write(&path, document.as_bytes())
            .await
            .map_err(|source| PipelineError::Io {
                path: path.clone(),
                source,
            })?;

        Ok(RenderedReport {
            comparison,
            document,
            path,
        })
    }

    /// Upload the report and every branch file concurrently; returns the report URL
    async fn publish(&self, rendered: &RenderedReport) -> Result<String, PipelineError> {
        let builds = &rendered.comparison.builds;
        let run = &builds.run;

        let report = PublishRequest::new(
            ObjectKey::new(&run.owner, &run.repo, &run.branch, FileKind::SizeReport),
            rendered.document.as_bytes(),
        );

        let mut files = Vec::new();
        for prepared in [&builds.baseline, &builds.change] {
            files.extend(self.branch_files(run, prepared).await?);
        }
        info!(
            "[{}] publishing report and {} branch files",
            run.run_id,
            files.len()
        );

        let (report_url, _) = try_join(
            self.publisher.publish(report),
            try_join_all(files.into_iter().map(|file| self.publisher.publish(file))),
        )
        .await?;
        Ok(report_url)
    }

    async fn branch_files(
        &self,
        run: &PipelineRun,
        prepared: &PreparedBranch,
    ) -> Result<Vec<PublishRequest>, PipelineError> {
        let key = |kind| ObjectKey::new(&run.owner, &run.repo, &prepared.branch, kind);

        let manifest = read_file(&prepared.manifest_path).await?;
        let mut files = vec![PublishRequest::new(key(FileKind::Manifest), manifest)];

        if let Some(path) = &prepared.analyzer_report_path {
            match tokio::fs::read(path).await {
                Ok(content) => files.push(PublishRequest::new(key(FileKind::AnalyzerReport), content)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    info!("[{}] no analyzer report at {}", run.run_id, path.display());
                }
                Err(source) => {
                    return Err(PipelineError::Io {
                        path: path.clone(),
                        source,
                    })
                }
            }
        }
        Ok(files)
    }

    async fn post(&self, run: &PipelineRun, update: StatusUpdate) {
        if let Err(e) = self.status.post_status(&update).await {
            warn!(
                "[{}] could not post {} status for {}: {}",
                run.run_id, update.state, run.commit_sha, e
            );
        }
    }

    fn log_state(&self, run: &PipelineRun, state: RunState) {
        info!("[{}] {}: {}", run.run_id, state, run);
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>, PipelineError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })
}
