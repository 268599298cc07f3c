//! Applies a diagnostic's suggested patches as one atomic edit.
//!
//! Patches are literal replacements; this layer does no general text
//! editing. Patches on one record apply in listed order against the text
//! as it stands after the previous patch, so overlapping patches resolve
//! latest-wins. Overlap is not validated — callers must not assume
//! overlap-safety beyond that.

use crate::document::{Document, DocumentSnapshot};
use crate::types::DiagnosticRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FixError {
    #[error("diagnostic has no fix attached")]
    NoFixes,
    #[error("fix range no longer maps onto the document")]
    StaleRange,
}

/// Whether the record's fix can currently be offered.
///
/// False when there is no fix or any patch range fails to map against the
/// snapshot — the editor hides or disables the fix action then.
#[must_use]
pub fn is_available(record: &DiagnosticRecord, snapshot: &DocumentSnapshot) -> bool {
    !record.fixes().is_empty()
        && record
            .fixes()
            .iter()
            .all(|patch| snapshot.map_region(&patch.range).is_some())
}

/// Apply all of the record's patches as one atomic, undoable edit.
///
/// Each patch maps against the text current at its step; any mapping
/// failure aborts with the document untouched. On success the result lands
/// in a single [`Document::replace`].
pub fn apply(record: &DiagnosticRecord, document: &mut Document) -> Result<(), FixError> {
    if record.fixes().is_empty() {
        return Err(FixError::NoFixes);
    }

    let mut scratch = document.text().to_string();
    for patch in record.fixes() {
        let snapshot = DocumentSnapshot::of(&scratch);
        let (start, end) = snapshot
            .map_region(&patch.range)
            .ok_or(FixError::StaleRange)?;
        scratch.replace_range(start..end, &patch.replacement);
    }

    document.replace(scratch);
    Ok(())
}
