//! Edit scripts parsed from normal diff reports.
//!
//! Only hunk headers carry information; body lines are skipped. The one
//! exception is the missing-newline marker following a removed line, which
//! becomes an [`EditKind::AppendNewline`] op.

use super::line_diff::NO_NEWLINE_MARKER;
use std::fmt;

/// Inclusive, 1-based range of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(line: usize) -> Self {
        Self::new(line, line)
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{},{}", self.start, self.end)
        }
    }
}

/// What an [`EditOp`] does to the old buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    /// Insert new lines after `old.start` (0 inserts before the first line)
    Add,
    /// Replace old lines with new lines
    Change,
    /// Remove old lines
    Delete,
    /// Append a single newline at the end of the document
    AppendNewline,
}

/// A single change instruction.
///
/// `old` is in the old buffer's line numbering and `new` in the new buffer's.
/// Both are `(0, 0)` for [`EditKind::AppendNewline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditOp {
    pub kind: EditKind,
    pub old: LineRange,
    pub new: LineRange,
}

impl EditOp {
    pub fn add(after: usize, new: LineRange) -> Self {
        Self {
            kind: EditKind::Add,
            old: LineRange::single(after),
            new,
        }
    }

    pub fn change(old: LineRange, new: LineRange) -> Self {
        Self {
            kind: EditKind::Change,
            old,
            new,
        }
    }

    pub fn delete(old: LineRange, new_after: usize) -> Self {
        Self {
            kind: EditKind::Delete,
            old,
            new: LineRange::single(new_after),
        }
    }

    pub fn append_newline() -> Self {
        Self {
            kind: EditKind::AppendNewline,
            old: LineRange::default(),
            new: LineRange::default(),
        }
    }
}

impl fmt::Display for EditOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self.kind {
            EditKind::Add => 'a',
            EditKind::Change => 'c',
            EditKind::Delete => 'd',
            EditKind::AppendNewline => return f.write_str("$a\\n"),
        };
        write!(f, "{}{}{}", self.old, letter, self.new)
    }
}

/// Ordered list of ops, ascending in old-buffer coordinates.
pub type DiffScript = Vec<EditOp>;

/// A hunk header that could not be decomposed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No `a`, `c` or `d` operator in the line
    MissingOperator(String),
    /// A range side is not `N` or `N,M`
    BadRange { line: String, range: String },
    /// A line number is 0 where a real line is required
    ZeroLine(String),
    /// The range ends before it starts
    Reversed(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingOperator(line) => write!(f, "cannot parse diff line: {line:?}"),
            ParseError::BadRange { line, range } => {
                write!(f, "cannot parse span {range:?} in diff line {line:?}")
            }
            ParseError::ZeroLine(line) => write!(f, "line number 0 in diff line {line:?}"),
            ParseError::Reversed(line) => write!(f, "reversed range in diff line {line:?}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse a normal diff report into an edit script.
///
/// Headers that fail to parse are logged and skipped; the remaining hunks are
/// still returned.
pub fn parse(diff_text: &str) -> DiffScript {
    let mut script = DiffScript::new();
    let mut last_body: Option<u8> = None;

    for line in diff_text.lines() {
        if line.is_empty() {
            continue;
        }
        if line == NO_NEWLINE_MARKER {
            // Only a removed line needs the edit; added lines are copied
            // from the new content without their missing newline already.
            if last_body == Some(b'<') {
                script.push(EditOp::append_newline());
            }
            continue;
        }
        let first = line.as_bytes()[0];
        if matches!(first, b'<' | b'>' | b'-') {
            last_body = Some(first);
            continue;
        }
        last_body = None;

        match parse_header(line) {
            Ok(op) => script.push(op),
            Err(e) => tracing::warn!("{}", e),
        }
    }

    script
}

/// Parse one hunk header such as `12,14c10,11`.
pub fn parse_header(line: &str) -> Result<EditOp, ParseError> {
    let Some(at) = line.find(['a', 'c', 'd']) else {
        return Err(ParseError::MissingOperator(line.to_string()));
    };
    let old = parse_range(line, &line[..at])?;
    let new = parse_range(line, &line[at + 1..])?;

    let op = match line.as_bytes()[at] {
        b'a' => {
            check_nonzero(line, new.start)?;
            EditOp::add(old.end, new)
        }
        b'c' => {
            check_nonzero(line, old.start)?;
            check_nonzero(line, new.start)?;
            EditOp::change(old, new)
        }
        _ => {
            check_nonzero(line, old.start)?;
            EditOp::delete(old, new.end)
        }
    };
    Ok(op)
}

fn check_nonzero(line: &str, n: usize) -> Result<(), ParseError> {
    if n == 0 {
        return Err(ParseError::ZeroLine(line.to_string()));
    }
    Ok(())
}

fn parse_range(line: &str, text: &str) -> Result<LineRange, ParseError> {
    let bad = || ParseError::BadRange {
        line: line.to_string(),
        range: text.to_string(),
    };
    let range = match text.split_once(',') {
        None => LineRange::single(text.parse().map_err(|_| bad())?),
        Some((start, end)) => LineRange::new(
            start.parse().map_err(|_| bad())?,
            end.parse().map_err(|_| bad())?,
        ),
    };
    if range.end < range.start {
        return Err(ParseError::Reversed(line.to_string()));
    }
    Ok(range)
}
