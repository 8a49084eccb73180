//! Byte spans covering whole lines of a buffer.

/// Return the bytes of lines `start..=end` (1-based) of `buf`, newlines included.
///
/// `start` of 1 begins at the first byte. If the buffer ends before line `end`
/// does, the span runs through the end of the buffer; callers rely on this for
/// hunks that cover the last lines of a file.
pub fn extract_lines(buf: &[u8], start: usize, end: usize) -> &[u8] {
    let mut skip = start.saturating_sub(1);
    let mut remaining = end;
    let mut i = 0;

    while i < buf.len() && skip > 0 {
        if buf[i] == b'\n' {
            skip -= 1;
            remaining = remaining.saturating_sub(1);
        }
        i += 1;
    }
    let begin = i;

    while i < buf.len() && remaining > 0 {
        if buf[i] == b'\n' {
            remaining -= 1;
        }
        i += 1;
    }

    &buf[begin..i]
}
