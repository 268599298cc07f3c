//! Wire format for the tool's streaming JSON reports.
//!
//! In watch mode the tool emits one self-contained JSON document per stdout
//! line, re-emitted whenever it re-analyzes. [`decode`] turns one such line
//! into a flat list of [`DiagnosticRecord`]s.
//!
//! Decode policy: a line that is not a recognizable report is an error and
//! publishes nothing; a single malformed file group or error entry inside a
//! `review-errors` report is skipped with a debug log and never takes the
//! rest of the batch down with it.

use std::path::PathBuf;

use serde::Deserialize;

use crate::types::{DiagnosticRecord, Position, Region, RichChunk, TextPatch};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("report line is not a recognizable JSON report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tagged report envelope. `error` and `compile-errors` reports carry no
/// per-file regions and currently yield no editor diagnostics; their
/// payload fields are ignored.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum RawReport {
    ReviewErrors {
        #[serde(default)]
        errors: Vec<serde_json::Value>,
    },
    Error {},
    CompileErrors {},
}

/// One `{path, errors}` group. A null or absent path marks a global
/// message, which never becomes an editor diagnostic.
#[derive(Debug, Deserialize)]
struct RawFileGroup {
    #[serde(default)]
    path: Option<PathBuf>,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    rule: String,
    message: String,
    #[serde(default)]
    rule_link: String,
    #[serde(default)]
    details: Vec<String>,
    #[serde(default)]
    region: Option<RawRegion>,
    #[serde(default)]
    fix: Vec<RawPatch>,
    #[serde(default)]
    formatted: Vec<RawChunk>,
    #[serde(default)]
    suppressed: bool,
}

#[derive(Debug, Deserialize)]
struct RawRegion {
    start: RawPosition,
    end: RawPosition,
}

#[derive(Debug, Deserialize)]
struct RawPosition {
    line: u32,
    column: u32,
}

#[derive(Debug, Deserialize)]
struct RawPatch {
    range: RawRegion,
    string: String,
}

#[derive(Debug, Deserialize)]
struct RawChunk {
    string: String,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    href: Option<String>,
}

impl From<RawPosition> for Position {
    fn from(raw: RawPosition) -> Self {
        Self {
            line: raw.line,
            column: raw.column,
        }
    }
}

impl From<RawRegion> for Region {
    fn from(raw: RawRegion) -> Self {
        Self {
            start: raw.start.into(),
            end: raw.end.into(),
        }
    }
}

impl From<RawPatch> for TextPatch {
    fn from(raw: RawPatch) -> Self {
        Self {
            range: raw.range.into(),
            replacement: raw.string,
        }
    }
}

impl From<RawChunk> for RichChunk {
    fn from(raw: RawChunk) -> Self {
        Self {
            text: raw.string,
            color: raw.color,
            link: raw.href,
        }
    }
}

impl RawEntry {
    fn into_record(self, file_path: PathBuf) -> DiagnosticRecord {
        DiagnosticRecord::new(file_path, self.rule, self.rule_link, self.message)
            .with_details(self.details)
            .with_formatted(self.formatted.into_iter().map(Into::into).collect())
            .with_region(self.region.map(Into::into))
            .with_fixes(self.fix.into_iter().map(Into::into).collect())
            .with_suppressed(self.suppressed)
    }
}

/// Decode one report line into a flat list of diagnostic records.
///
/// `Ok(vec![])` is a valid outcome (a clean report, or a report type that
/// carries no per-file diagnostics) and should be published so consumers
/// clear stale state. `Err` means the line itself was unusable and nothing
/// should be published for it.
pub fn decode(line: &str) -> Result<Vec<DiagnosticRecord>, DecodeError> {
    let report: RawReport = serde_json::from_str(line)?;
    match report {
        RawReport::ReviewErrors { errors } => Ok(flatten_groups(errors)),
        RawReport::Error {} | RawReport::CompileErrors {} => Ok(Vec::new()),
    }
}

/// Flatten `{path, errors}` groups so every record inherits its group's
/// path. Malformed groups and entries are skipped individually.
fn flatten_groups(groups: Vec<serde_json::Value>) -> Vec<DiagnosticRecord> {
    let mut records = Vec::new();
    for group in groups {
        let group: RawFileGroup = match serde_json::from_value(group) {
            Ok(group) => group,
            Err(e) => {
                tracing::debug!("skipping malformed file group: {e}");
                continue;
            }
        };
        let Some(path) = group.path else {
            tracing::debug!("skipping global report group with no path");
            continue;
        };
        for entry in group.errors {
            let entry: RawEntry = match serde_json::from_value(entry) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!(
                        path = %path.display(),
                        "skipping malformed diagnostic entry: {e}"
                    );
                    continue;
                }
            };
            records.push(entry.into_record(path.clone()));
        }
    }
    records
}
