//! End-to-end pipeline runs over the in-memory collaborators

mod common;

use bundle_delta::cmd::consume::consume;
use bundle_delta::config::Settings;
use bundle_delta::diff::Classification;
use bundle_delta::pipeline::{Orchestrator, PullRequestEvent, RunOutcome, RunState};
use bundle_delta::publish::memory::MEMORY_BASE_URL;
use bundle_delta::publish::{MemoryPublisher, ObjectKey};
use bundle_delta::report::FileKind;
use bundle_delta::runner::{BuildStep, FakeBuildRunner};
use bundle_delta::status::{CommitState, MemoryStatusReporter};
use common::fixtures::{event_json, snapshot};
use std::sync::Arc;
use tempfile::TempDir;

struct World {
    _temp_dir: TempDir,
    status: Arc<MemoryStatusReporter>,
    publisher: Arc<MemoryPublisher>,
    orchestrator: Orchestrator,
}

fn world(runner: FakeBuildRunner) -> World {
    let temp_dir = TempDir::new().unwrap();
    let mut settings = Settings::default();
    settings.workspace.root = temp_dir.path().to_path_buf();

    let status = Arc::new(MemoryStatusReporter::new());
    let publisher = Arc::new(MemoryPublisher::new());
    let orchestrator = Orchestrator::new(
        Arc::new(settings),
        Arc::new(runner),
        status.clone(),
        publisher.clone(),
    );
    World {
        _temp_dir: temp_dir,
        status,
        publisher,
        orchestrator,
    }
}

fn opened(branch: &str) -> PullRequestEvent {
    PullRequestEvent::from_json(&event_json("opened", "acme", "web", branch, "abc123")).unwrap()
}

fn position(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("{} not found", needle))
}

#[tokio::test]
async fn test_mixed_change_orders_diff_and_report() {
    let runner = FakeBuildRunner::new()
        .with_snapshot("master", snapshot(&[("a.js", 1), ("b.js", 20), ("c.js", 1000)]))
        .with_snapshot("feature", snapshot(&[("a.js", 2), ("b.js", 10), ("d.js", 100)]));
    let w = world(runner);

    let outcome = w.orchestrator.handle(&opened("feature")).await;

    let completed = match outcome {
        RunOutcome::Succeeded(completed) => completed,
        other => panic!("expected success, got {:?}", other.final_state()),
    };
    let summary: Vec<(&str, Classification, i64)> = completed
        .diff
        .entries()
        .iter()
        .map(|e| (e.name.as_str(), e.classification, e.byte_delta))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("a.js", Classification::Grew, 1),
            ("b.js", Classification::Shrank, -10),
            ("d.js", Classification::New, 100),
            ("c.js", Classification::Removed, -1000),
        ]
    );
    assert_eq!(completed.diff.total_delta(), -909);
    assert!(completed.verdict.passed());

    let key = ObjectKey::new("acme", "web", "feature", FileKind::SizeReport);
    let html = String::from_utf8(w.publisher.content(&key).unwrap()).unwrap();

    let changed_start = position(&html, "Changed bundles");
    let all_start = position(&html, "All bundles");
    let changed = &html[changed_start..all_start];
    let all = &html[all_start..];

    // new > grew > shrank > removed
    assert!(position(changed, "d.js") < position(changed, "a.js"));
    assert!(position(changed, "a.js") < position(changed, "b.js"));
    assert!(position(changed, "b.js") < position(changed, "c.js"));

    assert!(position(all, "a.js") < position(all, "b.js"));
    assert!(position(all, "b.js") < position(all, "d.js"));
    assert!(position(all, "d.js") < position(all, "c.js"));

    assert!(html.contains(&format!("{}/acme/web/master/stats.json", MEMORY_BASE_URL)));
    assert!(html.contains(&format!("{}/acme/web/feature/stats.json", MEMORY_BASE_URL)));
}

#[tokio::test]
async fn test_threshold_breach_posts_failure_with_link() {
    let runner = FakeBuildRunner::new()
        .with_snapshot("master", snapshot(&[("increased-bundle.js", 1)]))
        .with_snapshot("feature", snapshot(&[("increased-bundle.js", 4000)]));
    let w = world(runner);

    let outcome = w.orchestrator.handle(&opened("feature")).await;

    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(outcome.final_state(), Some(RunState::Succeeded));

    let updates = w.status.updates();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].state, CommitState::Pending);
    let last = &updates[1];
    assert_eq!(last.state, CommitState::Failure);
    let description = last.description.as_deref().unwrap();
    assert!(description.contains("+4kB"));
    assert!(description.contains("2kB threshold"));
    assert_eq!(
        last.target_url.as_deref(),
        Some(format!("{}/acme/web/feature/size-report.html", MEMORY_BASE_URL).as_str())
    );
}

#[tokio::test]
async fn test_change_install_failure_stops_before_publishing() {
    let runner = FakeBuildRunner::new()
        .with_snapshot("master", snapshot(&[("a.js", 1)]))
        .fail_at("feature", BuildStep::Install);
    let w = world(runner);

    let outcome = w.orchestrator.handle(&opened("feature")).await;

    assert!(matches!(outcome, RunOutcome::Failed(_)));
    assert_eq!(outcome.final_state(), Some(RunState::Failed));
    assert!(w.publisher.uploads().is_empty());

    let failures: Vec<_> = w
        .status
        .updates()
        .into_iter()
        .filter(|u| u.state == CommitState::Failure)
        .collect();
    assert_eq!(failures.len(), 1);
    assert!(w
        .status
        .updates()
        .iter()
        .all(|u| u.state != CommitState::Success));
}

#[tokio::test]
async fn test_event_stream_runs_concurrently_and_isolates_failures() {
    let runner = FakeBuildRunner::new()
        .with_snapshot("master", snapshot(&[("main.js", 10)]))
        .with_snapshot("small", snapshot(&[("main.js", 20)]))
        .fail_at("broken", BuildStep::Analyze);
    let w = world(runner);

    let input = [
        event_json("opened", "acme", "web", "small", "s1"),
        event_json("synchronize", "acme", "web", "broken", "b1"),
        event_json("closed", "acme", "web", "small", "s2"),
        "{ nope".to_string(),
        String::new(),
    ]
    .join("\n");

    let summary = consume(w.orchestrator.clone(), input.as_bytes()).await.unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.ignored, 1);
    assert_eq!(summary.malformed, 1);
    assert_eq!(summary.crashed, 0);

    let updates = w.status.updates();
    let for_commit = |sha: &str| -> Vec<CommitState> {
        updates
            .iter()
            .filter(|u| u.commit_sha == sha)
            .map(|u| u.state)
            .collect()
    };
    assert_eq!(for_commit("s1"), vec![CommitState::Pending, CommitState::Success]);
    assert_eq!(for_commit("b1"), vec![CommitState::Pending, CommitState::Failure]);
    assert!(for_commit("s2").is_empty());
}

#[tokio::test]
async fn test_reserved_branch_name_keeps_published_links_distinct() {
    let runner = FakeBuildRunner::new()
        .with_snapshot("master", snapshot(&[("main.js", 10)]))
        .with_snapshot("fix#12", snapshot(&[("main.js", 20)]));
    let w = world(runner);

    let outcome = w.orchestrator.handle(&opened("fix#12")).await;

    let completed = match outcome {
        RunOutcome::Succeeded(completed) => completed,
        other => panic!("expected success, got {:?}", other.final_state()),
    };
    let report_url = format!("{}/acme/web/fix%2312/size-report.html", MEMORY_BASE_URL);
    assert_eq!(completed.report_url, report_url);
    assert_eq!(
        w.status.updates().last().unwrap().target_url.as_deref(),
        Some(report_url.as_str())
    );

    let uploads = w.publisher.uploads();
    let keys: std::collections::HashSet<String> = uploads.iter().map(|u| u.key.path()).collect();
    assert_eq!(keys.len(), uploads.len());
    assert!(keys.contains("acme/web/fix#12/stats.json"));
    assert!(keys.contains("acme/web/fix#12/size-report.html"));

    let key = ObjectKey::new("acme", "web", "fix#12", FileKind::SizeReport);
    let html = String::from_utf8(w.publisher.content(&key).unwrap()).unwrap();
    assert!(html.contains(&format!("{}/acme/web/fix%2312/stats.json", MEMORY_BASE_URL)));
    assert!(!html.contains("fix#12/"));
}
