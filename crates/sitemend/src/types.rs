//! Core data types for asset references, documents, and fetch reports.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A normalized relative asset path found in an exported document.
///
/// Always relative, never empty, free of `.`/`..` segments and of any
/// cache-busting query suffix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(String);

impl AssetRef {
    /// Normalize a raw matched reference, dropping anything after `?`.
    ///
    /// Returns `None` when the remaining path cannot name a file under an
    /// export root.
    pub fn parse(raw: &str) -> Option<Self> {
        let path = raw.split('?').next().unwrap_or("");
        let path = path.split('#').next().unwrap_or("");

        if path.is_empty() || path.ends_with('/') || path.starts_with('/') {
            return None;
        }

        let escapes = Path::new(path)
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || path.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
            return None;
        }

        Some(Self(path.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Local destination of this reference under `root`.
    pub fn local_path(&self, root: &Path) -> PathBuf {
        root.join(&self.0)
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AssetRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A text document from the export (page markup or stylesheet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub content: String,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Lowercased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    /// File name component, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

/// Result of a single fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchOutcome {
    Fetched { bytes: u64 },
    Failed { reason: String },
    /// Dry run: the URL that would have been requested.
    Planned { url: String },
}

/// One line of the operator-facing fetch log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRecord {
    pub path: AssetRef,
    #[serde(flatten)]
    pub outcome: FetchOutcome,
}

impl FetchRecord {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, FetchOutcome::Fetched { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, FetchOutcome::Failed { .. })
    }
}

/// Per-item log and tally of a fetch batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchReport {
    pub records: Vec<FetchRecord>,
}

impl FetchReport {
    pub fn push(&mut self, record: FetchRecord) {
        self.records.push(record);
    }

    /// Number of files written.
    pub fn succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.is_success()).count()
    }

    /// Number of paths that could not be fetched.
    pub fn failed(&self) -> usize {
        self.records.iter().filter(|r| r.is_failure()).count()
    }

    /// `(success_count, failure_count)`.
    pub fn tally(&self) -> (usize, usize) {
        (self.succeeded(), self.failed())
    }

    pub fn failures(&self) -> impl Iterator<Item = &FetchRecord> {
        self.records.iter().filter(|r| r.is_failure())
    }

    pub(crate) fn sort(&mut self) {
        self.records.sort_by(|a, b| a.path.cmp(&b.path));
    }
}

/// Errors that can occur in the sitemend library.
#[derive(thiserror::Error, Debug)]
pub enum MendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Invalid origin: {0}")]
    InvalidOrigin(String),

    #[error("Invalid pattern in rule '{name}': {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("Rules error: {0}")]
    Rules(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience result type.
pub type MendResult<T> = Result<T, MendError>;
