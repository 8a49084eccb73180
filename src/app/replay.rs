//! Replaying an edit script against a live document.
//!
//! Line numbers in a script refer to the old buffer. Applying an op shifts
//! every line after it but none before it, so walking the script from the
//! last op to the first keeps every address valid in the old numbering.

use crate::document::{Address, Document, DocumentError};
use crate::model::edit_script::{EditKind, EditOp};
use crate::model::span::extract_lines;

/// Result of one replay pass.
#[derive(Debug, Default)]
pub struct ReplayOutcome {
    /// Number of data writes that succeeded
    pub writes: usize,
    /// The op and error that stopped the pass early, if any
    pub aborted: Option<(EditOp, DocumentError)>,
}

impl ReplayOutcome {
    /// Whether the document was changed at all.
    pub fn applied(&self) -> bool {
        self.writes > 0
    }

    pub fn completed(&self) -> bool {
        self.aborted.is_none()
    }
}

/// Address and payload that carry out `op`.
pub fn op_target<'a>(op: &EditOp, new_content: &'a [u8]) -> (Address, &'a [u8]) {
    match op.kind {
        EditKind::Add => (
            Address::After(op.old.start),
            extract_lines(new_content, op.new.start, op.new.end),
        ),
        EditKind::Change => (
            Address::Range(op.old.start, op.old.end),
            extract_lines(new_content, op.new.start, op.new.end),
        ),
        EditKind::Delete => (Address::Range(op.old.start, op.old.end), &[]),
        EditKind::AppendNewline => (Address::End, b"\n"),
    }
}

/// Apply a single op to `doc`.
pub fn apply_op(
    doc: &mut dyn Document,
    op: &EditOp,
    new_content: &[u8],
) -> Result<(), DocumentError> {
    let (addr, payload) = op_target(op, new_content);
    doc.set_address(addr)?;
    tracing::debug!("{} -> {} ({} bytes)", op, addr, payload.len());
    doc.write_data(payload)
}

/// Apply `script` to `doc` in reverse order, taking replacement text from
/// `new_content`.
///
/// The first failing op stops the pass; ops already applied stay applied.
pub fn replay(doc: &mut dyn Document, script: &[EditOp], new_content: &[u8]) -> ReplayOutcome {
    let mut outcome = ReplayOutcome::default();

    for op in script.iter().rev() {
        if let Err(e) = apply_op(doc, op, new_content) {
            tracing::warn!("replay stopped at {}: {}", op, e);
            outcome.aborted = Some((*op, e));
            break;
        }
        outcome.writes += 1;
    }

    outcome
}
