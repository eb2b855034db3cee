//! Published file kinds and link resolution for reports

use serde::{Deserialize, Serialize};

/// Kind of file a pipeline run publishes for a branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileKind {
    /// Rendered size comparison report
    SizeReport,
    /// Raw artifact manifest emitted by the build
    Manifest,
    /// Bundle analyzer output (treemap) emitted by the build
    AnalyzerReport,
}

impl FileKind {
    /// File name under which this kind is published
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::SizeReport => "size-report.html",
            Self::Manifest => "stats.json",
            Self::AnalyzerReport => "report.html",
        }
    }

    /// MIME type used when uploading
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::SizeReport | Self::AnalyzerReport => "text/html; charset=utf-8",
            Self::Manifest => "application/json",
        }
    }

    /// Link text in the report's details section
    pub fn label(&self) -> &'static str {
        match self {
            Self::SizeReport => "Bundle size report",
            Self::Manifest => "Raw size manifest (stats.json)",
            Self::AnalyzerReport => "Bundle sizes treemap (analyzer report.html)",
        }
    }
}

/// Resolves the public URL of a branch's published file.
///
/// Supplied by the caller so rendering stays independent of storage.
/// Closures of the form `Fn(&str, FileKind) -> String` implement it.
pub trait LinkResolver {
    /// URL of `kind` published for `branch`
    fn resolve(&self, branch: &str, kind: FileKind) -> String;
}

impl<F> LinkResolver for F
where
    F: Fn(&str, FileKind) -> String,
{
    fn resolve(&self, branch: &str, kind: FileKind) -> String {
        self(branch, kind)
    }
}
