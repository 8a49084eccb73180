//! Document backends
//!
//! A [`Document`] is the live, possibly modified buffer of an editor window.
//! Edits are made the way acme's file interface makes them: select an
//! [`Address`], then write bytes that replace the addressed text.
//!
//! ```text
//! ┌──────────────┐  set_address("2,3")  ┌───────────────┐
//! │   Replayer   │ ───────────────────▶ │   Document    │
//! │              │  write_data(bytes)   │ (acme window, │
//! │              │ ───────────────────▶ │  or memory)   │
//! └──────────────┘                      └───────────────┘
//! ```

pub mod acme;
pub mod memory;

pub use acme::AcmeWindow;
pub use memory::MemoryDocument;

use std::fmt;

/// Line-based selection understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
    /// Empty selection at the end of the document (`$`)
    End,
    /// Empty selection just after line `n` (`n+#0`); line 0 is the start
    After(usize),
    /// Lines `start..=end` including the final newline (`start,end`)
    Range(usize, usize),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::End => f.write_str("$"),
            Address::After(line) => write!(f, "{line}+#0"),
            Address::Range(start, end) => write!(f, "{start},{end}"),
        }
    }
}

/// Errors reported by a document backend
#[derive(Debug)]
pub enum DocumentError {
    /// The backend rejected an address (out of range or malformed)
    Address { addr: String, reason: String },
    /// Talking to the backend failed
    Io(std::io::Error),
    /// The backend answered with an error message
    Backend(String),
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::Address { addr, reason } => {
                write!(f, "address {addr:?} rejected: {reason}")
            }
            DocumentError::Io(e) => write!(f, "IO error: {e}"),
            DocumentError::Backend(msg) => write!(f, "backend error: {msg}"),
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DocumentError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DocumentError {
    fn from(e: std::io::Error) -> Self {
        DocumentError::Io(e)
    }
}

/// Live editor buffer.
///
/// Implementations are used by one event at a time and need not be shared.
pub trait Document {
    /// Read the full current content of the buffer.
    fn read_body(&mut self) -> Result<Vec<u8>, DocumentError>;

    /// Select `addr`; later writes replace the selection.
    fn set_address(&mut self, addr: Address) -> Result<(), DocumentError>;

    /// Replace the current selection with `data` (empty data deletes it).
    fn write_data(&mut self, data: &[u8]) -> Result<(), DocumentError>;

    /// Send a control message such as `mark` or `nomark`.
    fn write_ctl(&mut self, msg: &str) -> Result<(), DocumentError>;
}
