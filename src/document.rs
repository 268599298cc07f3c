//! Document text, snapshots, and position mapping.
//!
//! Diagnostics carry 1-based (line, column) regions computed against the
//! text the tool analyzed; by the time a consumer applies them the buffer
//! may have moved on. Mapping therefore always runs against the snapshot
//! current at application time, and a failed mapping is the normal "skip
//! this diagnostic this round" outcome, never an error.

use std::sync::Arc;

use crate::types::Region;

/// A consumer-owned text buffer.
///
/// Mutated only by its owning consumer; [`Document::replace`] is the single
/// mutation point and bumps the version, so one fix application is one
/// atomic, undoable edit.
#[derive(Debug)]
pub struct Document {
    text: String,
    version: u64,
}

impl Document {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            version: 0,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Replace the whole text as one edit.
    pub fn replace(&mut self, text: String) {
        self.text = text;
        self.version += 1;
    }

    /// An immutable view of the current text for one mapping pass.
    #[must_use]
    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot::with_version(&self.text, self.version)
    }
}

/// Immutable text view with a precomputed line-start table.
///
/// Cheap to clone; safe to hold across an edit (mappings against a stale
/// snapshot stay internally consistent, they just describe old text).
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    text: Arc<str>,
    line_starts: Arc<[usize]>,
    version: u64,
}

impl DocumentSnapshot {
    /// Snapshot free-standing text (version 0).
    #[must_use]
    pub fn of(text: &str) -> Self {
        Self::with_version(text, 0)
    }

    fn with_version(text: &str, version: u64) -> Self {
        let line_starts: Vec<usize> = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            text: Arc::from(text),
            line_starts: line_starts.into(),
            version,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Map a 1-based (line, column) to a 0-based byte offset.
    ///
    /// Columns count characters. `None` when line or column is 0, the line
    /// exceeds the snapshot's line count, or the position runs past the end
    /// of the text.
    #[must_use]
    pub fn map_point(&self, line: u32, column: u32) -> Option<usize> {
        if line == 0 || column == 0 {
            return None;
        }
        let mut offset = *self.line_starts.get(line as usize - 1)?;
        let mut chars = self.text[offset..].chars();
        for _ in 1..column {
            offset += chars.next()?.len_utf8();
        }
        Some(offset)
    }

    /// Map a region to a half-open byte range.
    ///
    /// `None` if either endpoint fails to map or the mapped range is
    /// degenerate or inverted (`start >= end`).
    #[must_use]
    pub fn map_region(&self, region: &Region) -> Option<(usize, usize)> {
        let start = self.map_point(region.start.line, region.start.column)?;
        let end = self.map_point(region.end.line, region.end.column)?;
        (start < end).then_some((start, end))
    }
}
