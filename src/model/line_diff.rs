//! Line-based diff engine producing a classic "normal" diff report.
//!
//! The report is the same notation `diff(1)` prints without options: each hunk
//! starts with a header such as `12,14c10,11`, followed by the removed lines
//! (`< `), a `---` separator for changes, and the added lines (`> `). A body
//! line without a trailing newline is followed by the marker
//! `\ No newline at end of file`.
//!
//! Lines keep their terminators and are compared byte for byte, so a final
//! line lacking `\n` never matches the same text with `\n`.

use similar::{capture_diff_slices, Algorithm, DiffTag};
use std::ops::Range;

/// Marker line emitted after a body line that has no trailing newline.
pub const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

/// Type of change a hunk describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HunkKind {
    /// Lines only present in the new buffer
    Add,
    /// Lines replaced by other lines
    Change,
    /// Lines only present in the old buffer
    Delete,
}

impl HunkKind {
    /// Operator letter used in hunk headers.
    pub fn letter(self) -> char {
        match self {
            HunkKind::Add => 'a',
            HunkKind::Change => 'c',
            HunkKind::Delete => 'd',
        }
    }
}

/// A contiguous region that differs between the two buffers.
///
/// Ranges are 0-based, half-open line indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old: Range<usize>,
    pub new: Range<usize>,
}

impl Hunk {
    pub fn kind(&self) -> HunkKind {
        if self.old.is_empty() {
            HunkKind::Add
        } else if self.new.is_empty() {
            HunkKind::Delete
        } else {
            HunkKind::Change
        }
    }

    /// Header line for this hunk, e.g. `3,4c3`.
    pub fn header(&self) -> String {
        format!(
            "{}{}{}",
            header_range(&self.old),
            self.kind().letter(),
            header_range(&self.new)
        )
    }
}

/// Render one side of a hunk header.
///
/// An empty range is written as the number of lines preceding it, which is
/// the line an insertion goes after (or the deletion point on the new side).
fn header_range(range: &Range<usize>) -> String {
    if range.is_empty() {
        range.start.to_string()
    } else if range.len() == 1 {
        (range.start + 1).to_string()
    } else {
        format!("{},{}", range.start + 1, range.end)
    }
}

/// Split a buffer into lines, each keeping its trailing `\n` if it has one.
pub fn split_lines(buf: &[u8]) -> Vec<&[u8]> {
    buf.split_inclusive(|&b| b == b'\n').collect()
}

/// Compute the differing regions between `old` and `new`.
///
/// Adjacent non-equal operations are coalesced, so the returned hunks never
/// touch or overlap and are ordered by their position in `old`.
pub fn diff_hunks(old: &[u8], new: &[u8]) -> Vec<Hunk> {
    if old == new {
        return Vec::new();
    }

    // Lines end at `\n` only; a lone `\r` stays inside its line, matching
    // `extract_lines` and the document backends.
    let old_lines = split_lines(old);
    let new_lines = split_lines(new);
    let ops = capture_diff_slices(Algorithm::Myers, &old_lines, &new_lines);

    let mut hunks = Vec::new();
    let mut pending: Option<Hunk> = None;

    for op in &ops {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        if tag == DiffTag::Equal {
            if old_range.is_empty() {
                continue;
            }
            if let Some(hunk) = pending.take() {
                hunks.push(hunk);
            }
            continue;
        }
        match pending.as_mut() {
            Some(hunk) => {
                hunk.old.end = old_range.end;
                hunk.new.end = new_range.end;
            }
            None => {
                pending = Some(Hunk {
                    old: old_range,
                    new: new_range,
                });
            }
        }
    }
    if let Some(hunk) = pending {
        hunks.push(hunk);
    }

    hunks
}

/// Produce the normal diff report turning `old` into `new`.
///
/// Identical buffers produce an empty string.
pub fn diff(old: &[u8], new: &[u8]) -> String {
    let hunks = diff_hunks(old, new);
    if hunks.is_empty() {
        return String::new();
    }

    let old_lines = split_lines(old);
    let new_lines = split_lines(new);
    let mut out = String::new();

    for hunk in &hunks {
        out.push_str(&hunk.header());
        out.push('\n');
        for line in &old_lines[hunk.old.clone()] {
            push_body_line(&mut out, "< ", line);
        }
        if hunk.kind() == HunkKind::Change {
            out.push_str("---\n");
        }
        for line in &new_lines[hunk.new.clone()] {
            push_body_line(&mut out, "> ", line);
        }
    }

    out
}

fn push_body_line(out: &mut String, prefix: &str, line: &[u8]) {
    out.push_str(prefix);
    out.push_str(&String::from_utf8_lossy(line));
    if !line.ends_with(b"\n") {
        out.push('\n');
        out.push_str(NO_NEWLINE_MARKER);
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_content() {
        let content = b"line 1\nline 2\nline 3\n";
        assert_eq!(diff(content, content), "");
        assert!(diff_hunks(content, content).is_empty());
    }

    #[test]
    fn test_empty_files() {
        assert_eq!(diff(b"", b""), "");
    }

    #[test]
    fn test_single_line_modification() {
        let old = b"line1\nline2\nline3\n";
        let new = b"line1\nCHANGED\nline3\n";
        assert_eq!(diff(old, new), "2c2\n< line2\n---\n> CHANGED\n");
    }

    #[test]
    fn test_insert_line_at_end() {
        assert_eq!(diff(b"a\nb\n", b"a\nb\nc\n"), "2a3\n> c\n");
    }

    #[test]
    fn test_insert_line_at_beginning() {
        assert_eq!(diff(b"b\nc\n", b"a\nb\nc\n"), "0a1\n> a\n");
    }

    #[test]
    fn test_delete_line_from_middle() {
        assert_eq!(diff(b"a\nb\nc\n", b"a\nc\n"), "2d1\n< b\n");
    }

    #[test]
    fn test_delete_line_from_beginning() {
        assert_eq!(diff(b"a\nb\nc\n", b"b\nc\n"), "1d0\n< a\n");
    }

    #[test]
    fn test_multi_line_ranges() {
        let old = b"a\nb\nc\nd\n";
        let new = b"a\nX\nY\nZ\nd\n";
        assert_eq!(
            diff(old, new),
            "2,3c2,4\n< b\n< c\n---\n> X\n> Y\n> Z\n"
        );
    }

    #[test]
    fn test_interleaved_changes() {
        let old = b"a\nb\nc\nd\ne\n";
        let new = b"a\nB\nc\nD\ne\n";
        let hunks = diff_hunks(old, new);
        assert_eq!(
            hunks,
            vec![
                Hunk { old: 1..2, new: 1..2 },
                Hunk { old: 3..4, new: 3..4 },
            ]
        );
    }

    #[test]
    fn test_missing_newline_on_old_side() {
        let out = diff(b"a\nb", b"a\nb\n");
        assert_eq!(out, "2c2\n< b\n\\ No newline at end of file\n---\n> b\n");
    }

    #[test]
    fn test_missing_newline_on_new_side() {
        let out = diff(b"a\n", b"a");
        assert_eq!(out, "1c1\n< a\n---\n> a\n\\ No newline at end of file\n");
    }

    #[test]
    fn test_carriage_return_does_not_end_a_line() {
        assert_eq!(diff(b"a\rb\n", b"x\n"), "1c1\n< a\rb\n---\n> x\n");
        assert_eq!(
            diff_hunks(b"a\rb\nc\n", b"a\rB\nc\n"),
            vec![Hunk { old: 0..1, new: 0..1 }]
        );
    }

    #[test]
    fn test_split_lines_keeps_terminators() {
        assert_eq!(split_lines(b"a\nb"), vec![&b"a\n"[..], &b"b"[..]]);
        assert!(split_lines(b"").is_empty());
    }

    #[test]
    fn test_header_ranges() {
        let hunk = Hunk { old: 11..14, new: 9..11 };
        assert_eq!(hunk.header(), "12,14c10,11");
        let hunk = Hunk { old: 2..2, new: 2..3 };
        assert_eq!(hunk.header(), "2a3");
        let hunk = Hunk { old: 0..2, new: 0..0 };
        assert_eq!(hunk.header(), "1,2d0");
    }
}
