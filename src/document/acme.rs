//! acme windows reached through plan9port's `9p` tool.
//!
//! Each window is a directory `acme/<id>/` in the acme file server. The files
//! used here are `body` (read the whole text), `addr` (set the address),
//! `data` (replace the addressed text) and `ctl` (undo grouping).
//!
//! acme keeps a window's address between opens of `addr` and `data`, so
//! every operation can run as its own `9p` invocation.

use super::{Address, Document, DocumentError};
use std::io::Write;
use std::process::{Command, Stdio};

/// An open acme window.
#[derive(Debug, Clone)]
pub struct AcmeWindow {
    id: u32,
    nine_p: String,
}

impl AcmeWindow {
    /// Attach to window `id`, failing if acme does not know it.
    pub fn open(id: u32, nine_p: impl Into<String>) -> Result<Self, DocumentError> {
        let win = Self {
            id,
            nine_p: nine_p.into(),
        };
        win.read_file("tag")?;
        Ok(win)
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    fn path(&self, file: &str) -> String {
        format!("acme/{}/{}", self.id, file)
    }

    fn read_file(&self, file: &str) -> Result<Vec<u8>, DocumentError> {
        let output = Command::new(&self.nine_p)
            .args(["read", &self.path(file)])
            .stdin(Stdio::null())
            .output()?;
        if !output.status.success() {
            return Err(DocumentError::Backend(stderr_message(&output.stderr)));
        }
        Ok(output.stdout)
    }

    /// Write `data` to a window file. Returns the tool's error text on failure.
    fn write_file(&self, file: &str, data: &[u8]) -> Result<Result<(), String>, DocumentError> {
        let mut child = Command::new(&self.nine_p)
            .args(["write", &self.path(file)])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(data)?;
        }

        let output = child.wait_with_output()?;
        if output.status.success() {
            Ok(Ok(()))
        } else {
            Ok(Err(stderr_message(&output.stderr)))
        }
    }
}

fn stderr_message(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr).trim().to_string()
}

impl Document for AcmeWindow {
    fn read_body(&mut self) -> Result<Vec<u8>, DocumentError> {
        self.read_file("body")
    }

    fn set_address(&mut self, addr: Address) -> Result<(), DocumentError> {
        let expr = addr.to_string();
        self.write_file("addr", expr.as_bytes())?
            .map_err(|reason| DocumentError::Address { addr: expr, reason })
    }

    fn write_data(&mut self, data: &[u8]) -> Result<(), DocumentError> {
        self.write_file("data", data)?
            .map_err(DocumentError::Backend)
    }

    fn write_ctl(&mut self, msg: &str) -> Result<(), DocumentError> {
        self.write_file("ctl", msg.as_bytes())?
            .map_err(DocumentError::Backend)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_open_fails_without_tool() {
        let err = AcmeWindow::open(1, "/nonexistent/9p").unwrap_err();
        assert!(matches!(err, DocumentError::Io(_)));
    }

    #[test]
    fn test_window_paths() {
        let win = AcmeWindow {
            id: 7,
            nine_p: "9p".to_string(),
        };
        assert_eq!(win.path("addr"), "acme/7/addr");
        assert_eq!(win.id(), 7);
    }
}
