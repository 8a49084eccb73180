//! Window events from acme's log file.
//!
//! Each line of `acme/log` reads `<window id> <op> <file name>`; the name is
//! empty for windows without one and may contain spaces.

use std::fmt;
use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, Stdio};

/// Operation named in a log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOp {
    New,
    Zerox,
    Get,
    Put,
    Del,
    Focus,
    Other(String),
}

impl LogOp {
    pub fn parse(s: &str) -> Self {
        match s {
            "new" => LogOp::New,
            "zerox" => LogOp::Zerox,
            "get" => LogOp::Get,
            "put" => LogOp::Put,
            "del" => LogOp::Del,
            "focus" => LogOp::Focus,
            other => LogOp::Other(other.to_string()),
        }
    }
}

/// One window event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub window_id: u32,
    pub op: LogOp,
    pub name: String,
}

impl LogEvent {
    /// Parse one log line, without its trailing newline.
    pub fn parse(line: &str) -> Result<Self, EventError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut parts = line.splitn(3, ' ');
        let id = parts.next().unwrap_or_default();
        let window_id = id
            .parse()
            .map_err(|_| EventError::Malformed(line.to_string()))?;
        let op = match parts.next() {
            Some(op) if !op.is_empty() => LogOp::parse(op),
            _ => return Err(EventError::Malformed(line.to_string())),
        };
        let name = parts.next().unwrap_or_default().to_string();
        Ok(Self {
            window_id,
            op,
            name,
        })
    }

    /// A named window was written to disk.
    pub fn is_save(&self) -> bool {
        self.op == LogOp::Put && !self.name.is_empty()
    }
}

#[derive(Debug)]
pub enum EventError {
    /// A line that does not follow the log format
    Malformed(String),
    Io(std::io::Error),
    /// The log stream ended
    Closed,
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventError::Malformed(line) => write!(f, "malformed log line: {line:?}"),
            EventError::Io(e) => write!(f, "reading acme log: {e}"),
            EventError::Closed => write!(f, "acme log closed"),
        }
    }
}

impl std::error::Error for EventError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EventError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EventError {
    fn from(e: std::io::Error) -> Self {
        EventError::Io(e)
    }
}

/// Source of window events, read one at a time.
pub trait EventSource {
    /// Block until the next event. `Err(EventError::Closed)` ends the stream.
    fn next_event(&mut self) -> Result<LogEvent, EventError>;
}

/// Events parsed from any line-oriented reader.
pub struct LineEvents<R> {
    reader: R,
    line: Vec<u8>,
}

impl<R: BufRead> LineEvents<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
        }
    }
}

impl<R: BufRead> EventSource for LineEvents<R> {
    fn next_event(&mut self) -> Result<LogEvent, EventError> {
        self.line.clear();
        if self.reader.read_until(b'\n', &mut self.line)? == 0 {
            return Err(EventError::Closed);
        }
        // A name that is not UTF-8 cannot be opened by path; skip the line
        // rather than ending the stream.
        match std::str::from_utf8(&self.line) {
            Ok(line) => LogEvent::parse(line),
            Err(_) => Err(EventError::Malformed(
                String::from_utf8_lossy(&self.line).trim_end().to_string(),
            )),
        }
    }
}

/// The live acme log, streamed through `9p read acme/log`.
pub struct AcmeLog {
    child: Child,
    events: LineEvents<BufReader<ChildStdout>>,
}

impl AcmeLog {
    pub fn open(nine_p: &str) -> Result<Self, EventError> {
        let mut child = Command::new(nine_p)
            .args(["read", "acme/log"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;
        let stdout = child.stdout.take().ok_or(EventError::Closed)?;
        tracing::debug!("reading acme/log via {} (pid {})", nine_p, child.id());
        Ok(Self {
            child,
            events: LineEvents::new(BufReader::new(stdout)),
        })
    }
}

impl EventSource for AcmeLog {
    fn next_event(&mut self) -> Result<LogEvent, EventError> {
        self.events.next_event()
    }
}

impl Drop for AcmeLog {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_put() {
        let event = LogEvent::parse("12 put /home/u/src/main.go\n").unwrap();
        assert_eq!(event.window_id, 12);
        assert_eq!(event.op, LogOp::Put);
        assert_eq!(event.name, "/home/u/src/main.go");
        assert!(event.is_save());
    }

    #[test]
    fn test_name_with_spaces() {
        let event = LogEvent::parse("3 put /tmp/my notes.txt").unwrap();
        assert_eq!(event.name, "/tmp/my notes.txt");
    }

    #[test]
    fn test_unnamed_and_other_ops_are_not_saves() {
        assert!(!LogEvent::parse("4 put ").unwrap().is_save());
        assert!(!LogEvent::parse("4 put").unwrap().is_save());
        assert!(!LogEvent::parse("4 focus /a.go").unwrap().is_save());
        assert_eq!(
            LogEvent::parse("4 resize /a.go").unwrap().op,
            LogOp::Other("resize".to_string())
        );
    }

    #[test]
    fn test_malformed_lines() {
        assert!(matches!(
            LogEvent::parse("put /a.go"),
            Err(EventError::Malformed(_))
        ));
        assert!(matches!(LogEvent::parse("7"), Err(EventError::Malformed(_))));
        assert!(matches!(LogEvent::parse(""), Err(EventError::Malformed(_))));
    }

    #[test]
    fn test_line_events_stream() {
        let log = "1 new /a.go\n1 put /a.go\nbogus\n";
        let mut events = LineEvents::new(Cursor::new(log));

        assert_eq!(events.next_event().unwrap().op, LogOp::New);
        assert!(events.next_event().unwrap().is_save());
        assert!(matches!(events.next_event(), Err(EventError::Malformed(_))));
        assert!(matches!(events.next_event(), Err(EventError::Closed)));
    }

    #[test]
    fn test_non_utf8_line_is_skipped() {
        let log: &[u8] = b"1 put /tmp/\xff.txt\n2 put /tmp/b.txt\n";
        let mut events = LineEvents::new(Cursor::new(log));

        assert!(matches!(events.next_event(), Err(EventError::Malformed(_))));
        let event = events.next_event().unwrap();
        assert_eq!(event.window_id, 2);
        assert_eq!(event.name, "/tmp/b.txt");
        assert!(matches!(events.next_event(), Err(EventError::Closed)));
    }

    #[test]
    fn test_open_missing_tool() {
        assert!(matches!(
            AcmeLog::open("/nonexistent/9p"),
            Err(EventError::Io(_))
        ));
    }
}
