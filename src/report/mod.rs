//! Bundle size report rendering
//!
//! Turns a [`DiffResult`] into a standalone HTML document summarising the
//! total size change, the changed artifacts, every artifact, and links to
//! the raw data published for both branches. Rendering is pure: the same
//! diff and link resolver always produce byte-identical output.

pub mod links;

use crate::diff::{DiffEntry, DiffResult};
use crate::fmt::{human_size, human_size_u64, signed_size};

pub use links::{FileKind, LinkResolver};

/// Rendered report, immutable once created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDocument {
    html: String,
}

impl ReportDocument {
    /// Document markup
    pub fn as_str(&self) -> &str {
        &self.html
    }

    /// Document bytes for upload
    pub fn as_bytes(&self) -> &[u8] {
        self.html.as_bytes()
    }

    /// Consume into the markup string
    pub fn into_string(self) -> String {
        self.html
    }
}

const STYLE: &str = r#"
  body, table {
    font-family: Helvetica Neue, arial;
    font-size: 20px;
  }
  table {
    width: 100%;
    text-align: right;
    border-collapse: collapse;
  }
  th, td {
    border: 1px solid black;
    padding: 5px;
  }
  th {
    font-weight: 500;
  }
  .name {
    text-align: left;
  }
  .shrank, .removed {
    color: green;
  }
  .grew, .new {
    color: #e60606;
  }
"#;

const TABLE_HEAD: &str = r#"    <thead>
      <tr>
        <th class="name">Bundle file name</th>
        <th>Change</th>
        <th>Now</th>
        <th>Before</th>
      </tr>
    </thead>
"#;

/// Escape text for inclusion in HTML element content or attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Headline sentence for the total change (plain text, no markup)
pub fn headline(total_delta: i64) -> String {
    if total_delta > 0 {
        format!("The total size increased by {}", signed_size(total_delta))
    } else if total_delta < 0 {
        format!("The total size decreased by {}", human_size(total_delta))
    } else {
        "The total size stayed the same".to_string()
    }
}

fn headline_html(total_delta: i64) -> String {
    if total_delta > 0 {
        format!(
            "The total size increased by <span class=\"grew\">{}</span>",
            signed_size(total_delta)
        )
    } else if total_delta < 0 {
        format!(
            "The total size decreased by <span class=\"shrank\">{}</span>, great job!",
            human_size(total_delta)
        )
    } else {
        "The total size stayed the same.".to_string()
    }
}

fn size_row(entry: &DiffEntry) -> String {
    format!(
        "      <tr>\n        <td class=\"name\">{}</td>\n        <td class=\"{}\">{}</td>\n        <td>{}</td>\n        <td><del>{}</del></td>\n      </tr>\n",
        escape_html(&entry.name),
        entry.classification.as_str(),
        signed_size(entry.byte_delta),
        human_size_u64(entry.current_size),
        human_size_u64(entry.previous_size),
    )
}

fn size_table<'a>(entries: impl IntoIterator<Item = &'a DiffEntry>) -> String {
    let mut table = String::from("  <table>\n");
    table.push_str(TABLE_HEAD);
    table.push_str("    <tbody>\n");
    for entry in entries {
        table.push_str(&size_row(entry));
    }
    table.push_str("    </tbody>\n  </table>\n");
    table
}

fn details_list(branch: &str, links: &dyn LinkResolver, superseded: bool) -> String {
    let mut list = String::from("  <ul>\n");
    for kind in [FileKind::AnalyzerReport, FileKind::Manifest] {
        let label = if superseded {
            format!("<del>{}</del>", kind.label())
        } else {
            kind.label().to_string()
        };
        list.push_str(&format!(
            "    <li><a href=\"{}\">{}</a></li>\n",
            escape_html(&links.resolve(branch, kind)),
            label
        ));
    }
    list.push_str("  </ul>\n");
    list
}

/// Render the size report for `branch` compared against `baseline_branch`.
///
/// `total_delta` must equal `diff.total_delta()`; it is passed in so the
/// caller's verdict and the headline are computed from the same number.
///
/// # Examples
///
/// ```
/// use bundle_delta::diff::diff;
/// use bundle_delta::report::{render, FileKind};
/// use bundle_delta::snapshot::{ArtifactSize, ArtifactSizeSnapshot};
///
/// let baseline = ArtifactSizeSnapshot::new(vec![ArtifactSize::new("main.js", 1)]);
/// let current = ArtifactSizeSnapshot::new(vec![ArtifactSize::new("main.js", 4000)]);
/// let result = diff(&baseline, &current);
///
/// let links = |branch: &str, kind: FileKind| format!("/{}/{}", branch, kind.file_name());
/// let report = render(&result, "feature", "master", result.total_delta(), &links);
/// assert!(report.as_str().contains("+4kB"));
/// ```
pub fn render(
    diff: &DiffResult,
    branch: &str,
    baseline_branch: &str,
    total_delta: i64,
    links: &dyn LinkResolver,
) -> ReportDocument {
    let mut html = String::from("<!DOCTYPE html>\n<html>\n<head>\n  <meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "  <title>Bundle size report: {}</title>\n",
        escape_html(branch)
    ));
    html.push_str(&format!("  <style>{}</style>\n</head>\n<body>\n", STYLE));
    html.push_str(&format!(
        "  <h1>Bundle size report for the <em>{}</em> branch</h1>\n",
        escape_html(branch)
    ));
    html.push_str(&format!("  <p>{}</p>\n", headline_html(total_delta)));

    html.push_str("  <h3>Changed bundles</h3>\n");
    html.push_str(&size_table(diff.changed()));

    html.push_str("  <h3>All bundles</h3>\n");
    html.push_str(&size_table(diff.entries()));

    html.push_str("  <h3>Details</h3>\n");
    html.push_str(&details_list(branch, links, false));

    html.push_str(&format!(
        "  <h3><em>{}</em> branch details (for comparison)</h3>\n",
        escape_html(baseline_branch)
    ));
    html.push_str(&details_list(baseline_branch, links, true));

    html.push_str("</body>\n</html>\n");

    ReportDocument { html }
}
