//! Stale-buffer detection.
//!
//! An edit script is only valid for the exact content it was computed from.
//! If the user kept typing after saving, the window no longer matches and
//! the whole update is dropped: their edits win, nothing is merged.

use std::fmt;

/// Immutable copy of a buffer's content at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    bytes: Vec<u8>,
}

/// The live buffer no longer matches the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleBuffer {
    pub snapshot_len: usize,
    pub live_len: usize,
}

impl fmt::Display for StaleBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "window modified since save ({} bytes saved, {} bytes now)",
            self.snapshot_len, self.live_len
        )
    }
}

impl std::error::Error for StaleBuffer {}

impl Snapshot {
    pub fn capture(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Byte-exact comparison against the buffer's current content.
    pub fn check(&self, live: &[u8]) -> Result<(), StaleBuffer> {
        if self.bytes == live {
            Ok(())
        } else {
            Err(StaleBuffer {
                snapshot_len: self.bytes.len(),
                live_len: live.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_content_passes() {
        let snapshot = Snapshot::capture(&b"fn main() {}\n"[..]);
        assert!(snapshot.check(b"fn main() {}\n").is_ok());
    }

    #[test]
    fn test_any_difference_fails() {
        let snapshot = Snapshot::capture("abc\n");
        assert_eq!(
            snapshot.check(b"abd\n"),
            Err(StaleBuffer {
                snapshot_len: 4,
                live_len: 4
            })
        );
        assert!(snapshot.check(b"abc").is_err());
        assert!(snapshot.check(b"").is_err());
    }

    #[test]
    fn test_stale_message() {
        let err = Snapshot::capture("ab").check(b"abc").unwrap_err();
        assert_eq!(
            err.to_string(),
            "window modified since save (2 bytes saved, 3 bytes now)"
        );
    }
}
