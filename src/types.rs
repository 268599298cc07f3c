//! Public types shared across the live-review pipeline.
//!
//! The embedding editor constructs a [`WatchConfig`], receives [`Batch`]es
//! through the bus, and reads [`DiagnosticRecord`]s to render highlights,
//! list views, and fix actions.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::markup;

/// A 1-based (line, column) position as reported by the tool.
///
/// Ordering is lexicographic: line first, then column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// A (start, end) span of 1-based positions.
///
/// Well-formed regions have `start <= end`; inverted regions are rejected
/// at mapping time, not on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub start: Position,
    pub end: Position,
}

/// A suggested literal replacement for a sub-range of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPatch {
    pub range: Region,
    pub replacement: String,
}

/// One chunk of the tool's rich-text output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichChunk {
    pub text: String,
    pub color: Option<String>,
    pub link: Option<String>,
}

/// Rendering category for a diagnostic, derived from its rule id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Unused,
    Deprecated,
    Warning,
}

/// One reported issue tied to a file and an optional text region.
///
/// Fields are private; construction goes through [`DiagnosticRecord::new`]
/// and the `with_*` builders, and consumers read via accessors. Records
/// without a project-relative path never get this far (the decoder filters
/// them), so `file_path` carries no `Option`.
#[derive(Debug, Clone)]
pub struct DiagnosticRecord {
    /// Project-relative path of the offending file.
    file_path: PathBuf,
    rule_id: String,
    rule_link: String,
    message: String,
    details: Vec<String>,
    formatted: Vec<RichChunk>,
    region: Option<Region>,
    fixes: Vec<TextPatch>,
    suppressed: bool,
}

impl DiagnosticRecord {
    #[must_use]
    pub fn new(file_path: PathBuf, rule_id: String, rule_link: String, message: String) -> Self {
        Self {
            file_path,
            rule_id,
            rule_link,
            message,
            details: Vec::new(),
            formatted: Vec::new(),
            region: None,
            fixes: Vec::new(),
            suppressed: false,
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    pub fn with_formatted(mut self, formatted: Vec<RichChunk>) -> Self {
        self.formatted = formatted;
        self
    }

    pub fn with_region(mut self, region: Option<Region>) -> Self {
        self.region = region;
        self
    }

    pub fn with_fixes(mut self, fixes: Vec<TextPatch>) -> Self {
        self.fixes = fixes;
        self
    }

    pub fn with_suppressed(mut self, suppressed: bool) -> Self {
        self.suppressed = suppressed;
        self
    }

    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    #[must_use]
    pub fn rule_id(&self) -> &str {
        &self.rule_id
    }

    /// Link to the rule's documentation.
    #[must_use]
    pub fn rule_link(&self) -> &str {
        &self.rule_link
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn details(&self) -> &[String] {
        &self.details
    }

    #[must_use]
    pub fn formatted(&self) -> &[RichChunk] {
        &self.formatted
    }

    /// 1-based span of the diagnostic; `None` means file-scoped.
    #[must_use]
    pub fn region(&self) -> Option<&Region> {
        self.region.as_ref()
    }

    #[must_use]
    pub fn fixes(&self) -> &[TextPatch] {
        &self.fixes
    }

    #[must_use]
    pub fn suppressed(&self) -> bool {
        self.suppressed
    }

    /// Rendering category, derived from the rule id — never stored.
    #[must_use]
    pub fn category(&self) -> Category {
        if self.rule_id.starts_with("NoUnused.") {
            Category::Unused
        } else if self.rule_id == "NoDeprecated" {
            Category::Deprecated
        } else {
            Category::Warning
        }
    }

    /// The `formatted` chunks rendered as tooltip markup.
    #[must_use]
    pub fn markup(&self) -> String {
        markup::render(&self.formatted)
    }
}

/// One decoded report for a project, as delivered to subscribers.
///
/// Immutable once produced; clones share the underlying records, so a batch
/// is cheap to hand to every subscriber and safe to move across threads.
#[derive(Debug, Clone)]
pub struct Batch {
    base_dir: Arc<Path>,
    records: Arc<[DiagnosticRecord]>,
}

impl Batch {
    #[must_use]
    pub fn new(base_dir: impl Into<Arc<Path>>, records: Vec<DiagnosticRecord>) -> Self {
        Self {
            base_dir: base_dir.into(),
            records: records.into(),
        }
    }

    /// Project root the record paths are relative to.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[must_use]
    pub fn records(&self) -> &[DiagnosticRecord] {
        &self.records
    }
}

/// Configuration for one project's watch process.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// Value passed as `--namespace=<ns>` to the tool.
    pub namespace: String,
    /// Explicit executable path; when absent the [`crate::Toolchain`]
    /// resolves one.
    #[serde(default)]
    pub tool: Option<PathBuf>,
    /// Optional `--config=<path>` argument.
    #[serde(default)]
    pub config_path: Option<PathBuf>,
    /// Optional `--compiler=<path>` argument.
    #[serde(default)]
    pub compiler_path: Option<PathBuf>,
}
