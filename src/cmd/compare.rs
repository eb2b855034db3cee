//! Compare command implementation
//!
//! Handles `bundle-delta compare`, which diffs two local manifests without
//! cloning or building anything. Useful for checking a build locally before
//! pushing, or for wiring the diff into another CI system.

use anyhow::{Context, Result};
use console::style;
use std::path::{Path, PathBuf};

use crate::diff::{diff, Classification, DiffResult};
use crate::error::BundleDeltaError;
use crate::fmt::{human_size_u64, signed_size, truncate, CHART, CHECKMARK, CROSSMARK};
use crate::pipeline::Verdict;
use crate::report::{self, headline, FileKind};
use crate::snapshot::read_manifest;

/// Options of the compare command
#[derive(Debug, Clone, Default)]
pub struct CompareOptions {
    /// Write the HTML report here
    pub html: Option<PathBuf>,
    /// Allowed increase in bytes
    pub threshold: i64,
    /// Print the diff as JSON instead of a table
    pub json: bool,
}

/// Compare two manifests and judge the change
///
/// # Examples
///
/// ```no_run
/// use bundle_delta::cmd::compare::{cmd_compare, CompareOptions};
/// use std::path::Path;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let options = CompareOptions { threshold: 2000, ..Default::default() };
/// cmd_compare(Path::new("master/stats.json"), Path::new("dist/stats.json"), &options).await?;
/// # Ok::<(), anyhow::Error>(())
/// # });
/// ```
///
/// # Errors
///
/// Returns an error if either manifest cannot be loaded, the report cannot
/// be written, or the increase is above the threshold.
pub async fn cmd_compare(before: &Path, after: &Path, options: &CompareOptions) -> Result<()> {
    let baseline = read_manifest(before).await.map_err(BundleDeltaError::from)?;
    let current = read_manifest(after).await.map_err(BundleDeltaError::from)?;
    let result = diff(&baseline, &current);
    let total_delta = result.total_delta();

    if options.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result, total_delta);
    }

    if let Some(html) = &options.html {
        let before_label = before.display().to_string();
        let after_label = after.display().to_string();
        let document = report::render(
            &result,
            &after_label,
            &before_label,
            total_delta,
            &local_link,
        );
        tokio::fs::write(html, document.as_bytes())
            .await
            .map_err(|source| BundleDeltaError::Io {
                context: html.display().to_string(),
                source,
            })
            .with_context(|| format!("Failed to write report to {}", html.display()))?;
        if !options.json {
            println!("   Report written to {}", style(html.display()).cyan());
        }
    }

    let verdict = Verdict::judge(total_delta, options.threshold);
    if verdict.passed() {
        if !options.json {
            println!("\n{} {}", CHECKMARK, style(&verdict.description).green());
        }
        Ok(())
    } else {
        if !options.json {
            println!("\n{} {}", CROSSMARK, style(&verdict.description).red().bold());
        }
        Err(BundleDeltaError::SizeIncreaseExceeded {
            total_delta,
            threshold: options.threshold,
        }
        .into())
    }
}

/// Links for a local report: the "branch" label is the manifest path
fn local_link(manifest: &str, kind: FileKind) -> String {
    match kind {
        FileKind::Manifest => manifest.to_string(),
        other => Path::new(manifest)
            .with_file_name(other.file_name())
            .display()
            .to_string(),
    }
}

fn print_summary(result: &DiffResult, total_delta: i64) {
    println!("{} {}", CHART, style("Bundle size comparison").bold());
    println!();

    let changed = result.changed();
    if changed.is_empty() {
        println!("   No bundle changed");
    } else {
        println!(
            "   {:<40} {:>10} {:>10} {:>10}",
            style("Bundle").bold(),
            style("Change").bold(),
            style("Size").bold(),
            style("Before").bold()
        );
        for entry in changed {
            let delta = signed_size(entry.byte_delta);
            let delta = match entry.classification {
                Classification::New | Classification::Grew => style(delta).red(),
                Classification::Shrank | Classification::Removed => style(delta).green(),
                Classification::Unchanged => style(delta).dim(),
            };
            println!(
                "   {:<40} {:>10} {:>10} {:>10}",
                truncate(&entry.name, 40),
                delta,
                human_size_u64(entry.current_size),
                style(human_size_u64(entry.previous_size)).dim()
            );
        }
    }
    println!();
    println!("   {}", headline(total_delta));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, json: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_local_link_points_next_to_manifest() {
        assert_eq!(local_link("dist/stats.json", FileKind::Manifest), "dist/stats.json");
        assert_eq!(
            local_link("dist/stats.json", FileKind::AnalyzerReport),
            "dist/report.html"
        );
    }

    #[tokio::test]
    async fn test_compare_within_threshold_writes_report() {
        let temp_dir = TempDir::new().unwrap();
        let before = write(&temp_dir, "before.json", r#"[{"name":"a.js","size":100}]"#);
        let after = write(&temp_dir, "after.json", r#"[{"name":"a.js","size":150}]"#);
        let html = temp_dir.path().join("report.html");
        let options = CompareOptions {
            html: Some(html.clone()),
            threshold: 2000,
            json: false,
        };

        cmd_compare(&before, &after, &options).await.unwrap();

        let report = std::fs::read_to_string(html).unwrap();
        assert!(report.contains("+50B"));
    }

    #[tokio::test]
    async fn test_compare_above_threshold_fails() {
        let temp_dir = TempDir::new().unwrap();
        let before = write(&temp_dir, "before.json", r#"[{"name":"a.js","size":1}]"#);
        let after = write(&temp_dir, "after.json", r#"[{"name":"a.js","size":4000}]"#);
        let options = CompareOptions {
            threshold: 2000,
            ..Default::default()
        };

        let err = cmd_compare(&before, &after, &options).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BundleDeltaError>(),
            Some(BundleDeltaError::SizeIncreaseExceeded { total_delta: 3999, .. })
        ));
    }

    #[tokio::test]
    async fn test_compare_missing_manifest_is_manifest_error() {
        let temp_dir = TempDir::new().unwrap();
        let after = write(&temp_dir, "after.json", "[]");

        let err = cmd_compare(&temp_dir.path().join("nope.json"), &after, &CompareOptions::default())
            .await
            .unwrap_err();
        assert_eq!(crate::error::ErrorFormatter::exit_code(&err), 66);
    }
}
