//! One save event, end to end.
//!
//! ```text
//! file on disk ──read──▶ old ──format──▶ new
//!                          │               │
//!                          └─────diff──────┘
//!                                  │ parse
//!                                  ▼
//! window body ──guard(old)──▶ mark/nomark ──replay──▶ window body
//! ```

use super::guard::{Snapshot, StaleBuffer};
use super::replay::{replay, ReplayOutcome};
use crate::document::{Document, DocumentError, MemoryDocument};
use crate::model::edit_script::parse;
use crate::model::line_diff::diff;
use crate::services::formatter::{FormatError, Formatter};
use std::fmt;
use std::path::Path;

/// What happened to the window.
#[derive(Debug)]
pub enum ReformatOutcome {
    /// The formatter left the file as it was
    Unchanged,
    /// The window was edited after the save; nothing was written
    Skipped(StaleBuffer),
    /// The edit script was replayed against the window
    Applied(ReplayOutcome),
    /// Dry run: the script was replayed on a copy of the window body
    DryRun {
        ops: usize,
        /// Whether the copy ended up equal to the formatter output
        reproduces: bool,
    },
}

impl ReformatOutcome {
    /// Whether the window's content was changed.
    pub fn modified(&self) -> bool {
        matches!(self, ReformatOutcome::Applied(outcome) if outcome.applied())
    }
}

/// Failures that end the handling of one event.
#[derive(Debug)]
pub enum ReformatError {
    /// The saved file could not be read
    Read(std::io::Error),
    Format(FormatError),
    Document(DocumentError),
}

impl fmt::Display for ReformatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReformatError::Read(e) => write!(f, "reading saved file: {e}"),
            ReformatError::Format(e) => write!(f, "formatting: {e}"),
            ReformatError::Document(e) => write!(f, "window: {e}"),
        }
    }
}

impl std::error::Error for ReformatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReformatError::Read(e) => Some(e),
            ReformatError::Format(e) => Some(e),
            ReformatError::Document(e) => Some(e),
        }
    }
}

impl From<FormatError> for ReformatError {
    fn from(e: FormatError) -> Self {
        ReformatError::Format(e)
    }
}

impl From<DocumentError> for ReformatError {
    fn from(e: DocumentError) -> Self {
        ReformatError::Document(e)
    }
}

/// Format the saved file at `path` and carry the changes into `doc`.
///
/// The window body must still equal the file as saved; otherwise the update
/// is skipped. With `dry_run` the window is read but never written.
pub fn reformat(
    doc: &mut dyn Document,
    path: &Path,
    formatter: &dyn Formatter,
    dry_run: bool,
) -> Result<ReformatOutcome, ReformatError> {
    let old = std::fs::read(path).map_err(ReformatError::Read)?;
    let new = formatter.format(path)?;

    if old == new {
        tracing::debug!("{}: already formatted", path.display());
        return Ok(ReformatOutcome::Unchanged);
    }

    let diff_text = diff(&old, &new);
    tracing::debug!("{} diff:\n{}", path.display(), diff_text.trim_end());
    let script = parse(&diff_text);

    let snapshot = Snapshot::capture(old);
    let live = doc.read_body()?;
    if let Err(stale) = snapshot.check(&live) {
        tracing::warn!("skipped update to {}: {}", path.display(), stale);
        return Ok(ReformatOutcome::Skipped(stale));
    }

    if dry_run {
        let mut copy = MemoryDocument::new(live);
        let outcome = replay(&mut copy, &script, &new);
        let reproduces = outcome.completed() && copy.body() == new.as_slice();
        for op in &script {
            tracing::info!("{}: would apply {}", path.display(), op);
        }
        if !reproduces {
            tracing::warn!("{}: edit script does not reproduce formatter output", path.display());
        }
        return Ok(ReformatOutcome::DryRun {
            ops: script.len(),
            reproduces,
        });
    }

    doc.write_ctl("mark")?;
    doc.write_ctl("nomark")?;
    let outcome = replay(doc, &script, &new);
    match &outcome.aborted {
        None => tracing::info!("{}: applied {} edit(s)", path.display(), outcome.writes),
        Some((op, e)) => tracing::warn!(
            "{}: applied {} of {} edit(s), stopped at {}: {}",
            path.display(),
            outcome.writes,
            script.len(),
            op,
            e
        ),
    }
    Ok(ReformatOutcome::Applied(outcome))
}
