//! In-memory document with acme address semantics.
//!
//! Used by tests and by `--dry-run` style tooling that wants to see what a
//! replay would do without a running editor.

use super::{Address, Document, DocumentError};
use std::ops::Range;

#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    body: Vec<u8>,
    selection: Range<usize>,
    /// Every address successfully set, in order
    pub addresses: Vec<Address>,
    /// Every control message written, in order
    pub ctl_messages: Vec<String>,
    /// Number of data writes performed
    pub writes: usize,
}

impl MemoryDocument {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Byte range of line `n` including its newline.
    ///
    /// Line 0 is the empty range at the start. The line just past a final
    /// newline is the empty range at the end; anything further is invalid.
    fn line(&self, n: usize) -> Option<Range<usize>> {
        if n == 0 {
            return Some(0..0);
        }
        let mut start = 0;
        for _ in 1..n {
            let newline = self.body[start..].iter().position(|&b| b == b'\n')?;
            start += newline + 1;
        }
        let end = match self.body[start..].iter().position(|&b| b == b'\n') {
            Some(newline) => start + newline + 1,
            None => self.body.len(),
        };
        Some(start..end)
    }

    fn resolve(&self, addr: Address) -> Result<Range<usize>, String> {
        match addr {
            Address::End => Ok(self.body.len()..self.body.len()),
            Address::After(n) => {
                let line = self.line(n).ok_or("address out of range")?;
                Ok(line.end..line.end)
            }
            Address::Range(start, end) => {
                if end < start {
                    return Err("addresses out of order".to_string());
                }
                let first = self.line(start).ok_or("address out of range")?;
                let last = self.line(end).ok_or("address out of range")?;
                Ok(first.start..last.end)
            }
        }
    }
}

impl Document for MemoryDocument {
    fn read_body(&mut self) -> Result<Vec<u8>, DocumentError> {
        Ok(self.body.clone())
    }

    fn set_address(&mut self, addr: Address) -> Result<(), DocumentError> {
        self.selection = self.resolve(addr).map_err(|reason| DocumentError::Address {
            addr: addr.to_string(),
            reason,
        })?;
        self.addresses.push(addr);
        Ok(())
    }

    fn write_data(&mut self, data: &[u8]) -> Result<(), DocumentError> {
        let start = self.selection.start;
        self.body.splice(self.selection.clone(), data.iter().copied());
        self.selection = start..start + data.len();
        self.writes += 1;
        Ok(())
    }

    fn write_ctl(&mut self, msg: &str) -> Result<(), DocumentError> {
        self.ctl_messages.push(msg.to_string());
        Ok(())
    }
}
