//! Formatters and the extension registry that selects them.
//!
//! A formatter takes the path of a saved file and returns the formatted
//! content; it never writes the file. The registry is built once from the
//! configuration and handed to the watcher.

use crate::config::{CommandSpec, Config, FormatterConfig, ANY_EXTENSION};
use crate::services::command::{build_command, failure_text};
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::process::Stdio;

/// Why a formatter produced no usable output
#[derive(Debug)]
pub enum FormatError {
    /// The file could not be read
    Read(std::io::Error),
    /// The command could not be started
    Spawn {
        command: String,
        source: std::io::Error,
    },
    /// The command exited unsuccessfully
    Failed {
        command: String,
        code: Option<i32>,
        message: String,
    },
    /// The command succeeded but printed nothing for a non-empty file
    EmptyOutput { command: String },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Read(e) => write!(f, "cannot read file: {e}"),
            FormatError::Spawn { command, source } => {
                write!(f, "cannot run {command}: {source}")
            }
            FormatError::Failed {
                command,
                code,
                message,
            } => match code {
                Some(code) => write!(f, "{command} exited with status {code}: {message}"),
                None => write!(f, "{command} was terminated: {message}"),
            },
            FormatError::EmptyOutput { command } => {
                write!(f, "{command} produced no output")
            }
        }
    }
}

impl std::error::Error for FormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FormatError::Read(e) => Some(e),
            FormatError::Spawn { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Produces the formatted content of a file.
pub trait Formatter: Send + Sync {
    fn format(&self, path: &Path) -> Result<Vec<u8>, FormatError>;
}

impl<F> Formatter for F
where
    F: Fn(&Path) -> Result<Vec<u8>, FormatError> + Send + Sync,
{
    fn format(&self, path: &Path) -> Result<Vec<u8>, FormatError> {
        self(path)
    }
}

/// Runs an external program and takes its stdout as the formatted file.
#[derive(Debug, Clone)]
pub struct CommandFormatter {
    config: FormatterConfig,
}

impl CommandFormatter {
    pub fn new(config: FormatterConfig) -> Self {
        Self { config }
    }

    /// Run the diagnostic command, if any, and log what it printed.
    fn diagnose(&self, path: &Path) {
        let Some(spec) = &self.config.diagnostic else {
            return;
        };
        match run_for_output(spec, path) {
            Ok(output) if !output.trim().is_empty() => {
                tracing::warn!("{} {}:\n{}", spec.command, path.display(), output.trim_end());
            }
            Ok(_) => {}
            Err(e) => tracing::debug!("diagnostic {} failed to start: {}", spec.command, e),
        }
    }
}

impl Formatter for CommandFormatter {
    fn format(&self, path: &Path) -> Result<Vec<u8>, FormatError> {
        let config = &self.config;
        let input = if config.stdin {
            Some(std::fs::read(path).map_err(FormatError::Read)?)
        } else {
            None
        };

        let mut cmd = build_command(
            &config.command,
            &config.args,
            config.working_dir.as_deref(),
            path,
            !config.stdin,
        );
        cmd.stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

        let spawn_err = |source| FormatError::Spawn {
            command: config.command.clone(),
            source,
        };
        let mut child = cmd.spawn().map_err(spawn_err)?;
        // stdin is fed from its own thread so a formatter that streams
        // output while reading never blocks on a full stdout pipe.
        let output = std::thread::scope(|scope| {
            if let (Some(mut stdin), Some(input)) = (child.stdin.take(), input.as_deref()) {
                scope.spawn(move || {
                    // A formatter that exits early closes its stdin; its
                    // exit status reports the real problem.
                    if let Err(e) = stdin.write_all(input) {
                        tracing::debug!("writing to {} stdin: {}", config.command, e);
                    }
                });
            }
            child.wait_with_output()
        })
        .map_err(spawn_err)?;

        if !output.status.success() {
            let err = FormatError::Failed {
                command: config.command.clone(),
                code: output.status.code(),
                message: failure_text(&output.stdout, &output.stderr),
            };
            tracing::warn!("{} {}: {}", config.command, path.display(), err);
            self.diagnose(path);
            return Err(err);
        }

        if !output.stderr.is_empty() {
            tracing::debug!(
                "{} stderr: {}",
                config.command,
                String::from_utf8_lossy(&output.stderr).trim_end()
            );
        }

        let input_empty = match &input {
            Some(input) => input.is_empty(),
            None => std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(false),
        };
        if output.stdout.is_empty() && !input_empty {
            return Err(FormatError::EmptyOutput {
                command: config.command.clone(),
            });
        }

        Ok(output.stdout)
    }
}

/// Run `spec` for `path` and return everything it printed.
pub fn run_for_output(spec: &CommandSpec, path: &Path) -> std::io::Result<String> {
    let output = build_command(
        &spec.command,
        &spec.args,
        spec.working_dir.as_deref(),
        path,
        true,
    )
    .stdin(Stdio::null())
    .output()?;
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok(text)
}

/// Built-in fallback: the file unchanged except for a guaranteed final newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnsureTrailingNewline;

impl Formatter for EnsureTrailingNewline {
    fn format(&self, path: &Path) -> Result<Vec<u8>, FormatError> {
        let mut content = std::fs::read(path).map_err(FormatError::Read)?;
        if !content.is_empty() && !content.ends_with(b"\n") {
            content.push(b'\n');
        }
        Ok(content)
    }
}

/// The formatter chosen for one file.
pub struct Selection<'a> {
    pub formatter: &'a dyn Formatter,
    /// Name used in log messages
    pub name: &'a str,
    /// True when no extension-specific formatter was registered
    pub fallback: bool,
}

/// Formatters keyed by file extension, plus the fallback for everything else.
pub struct FormatterRegistry {
    by_extension: HashMap<String, (String, Box<dyn Formatter>)>,
    fallback: (String, Box<dyn Formatter>),
}

impl FormatterRegistry {
    /// Registry with no extension formatters and the built-in fallback.
    pub fn new() -> Self {
        Self {
            by_extension: HashMap::new(),
            fallback: ("eol".to_string(), Box::new(EnsureTrailingNewline)),
        }
    }

    /// Build the registry described by `config`.
    ///
    /// Disabled formatters are left out, so their files use the fallback.
    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self::new();
        for (ext, formatter_config) in &config.formatters {
            if !formatter_config.enabled {
                tracing::debug!("formatter for .{} is disabled", ext);
                continue;
            }
            let name = formatter_config.command.clone();
            let formatter = Box::new(CommandFormatter::new(formatter_config.clone()));
            if ext == ANY_EXTENSION {
                registry.set_fallback(name, formatter);
            } else {
                registry.insert(ext.clone(), name, formatter);
            }
        }
        registry
    }

    pub fn insert(
        &mut self,
        ext: impl Into<String>,
        name: impl Into<String>,
        formatter: Box<dyn Formatter>,
    ) {
        self.by_extension.insert(ext.into(), (name.into(), formatter));
    }

    pub fn set_fallback(&mut self, name: impl Into<String>, formatter: Box<dyn Formatter>) {
        self.fallback = (name.into(), formatter);
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.by_extension.keys().map(String::as_str)
    }

    /// Pick the formatter for `path` by its extension.
    pub fn select(&self, path: &Path) -> Selection<'_> {
        let registered = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.by_extension.get(ext));
        match registered {
            Some((name, formatter)) => Selection {
                formatter: formatter.as_ref(),
                name,
                fallback: false,
            },
            None => Selection {
                formatter: self.fallback.1.as_ref(),
                name: &self.fallback.0,
                fallback: true,
            },
        }
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_temp(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_ensure_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let missing = write_temp(&dir, "a.txt", "no newline");
        assert_eq!(EnsureTrailingNewline.format(&missing).unwrap(), b"no newline\n");

        let present = write_temp(&dir, "b.txt", "fine\n");
        assert_eq!(EnsureTrailingNewline.format(&present).unwrap(), b"fine\n");

        let empty = write_temp(&dir, "c.txt", "");
        assert_eq!(EnsureTrailingNewline.format(&empty).unwrap(), b"");
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = EnsureTrailingNewline
            .format(Path::new("/nonexistent/file.txt"))
            .unwrap_err();
        assert!(matches!(err, FormatError::Read(_)));
    }

    #[test]
    fn test_registry_selects_by_extension() {
        let mut registry = FormatterRegistry::new();
        let upper = |path: &Path| -> Result<Vec<u8>, FormatError> {
            Ok(std::fs::read(path).map_err(FormatError::Read)?.to_ascii_uppercase())
        };
        registry.insert("go", "upper", Box::new(upper));

        let go = registry.select(Path::new("/src/main.go"));
        assert_eq!(go.name, "upper");
        assert!(!go.fallback);

        let other = registry.select(Path::new("/src/README"));
        assert_eq!(other.name, "eol");
        assert!(other.fallback);

        let dotted_dir = registry.select(Path::new("/src/v1.go/notes"));
        assert!(dotted_dir.fallback);
    }

    #[test]
    fn test_registry_from_config() {
        let mut config = Config::default();
        config
            .formatters
            .insert(ANY_EXTENSION.to_string(), FormatterConfig::new("aeol"));
        config.formatters.get_mut("py").unwrap().enabled = false;

        let registry = FormatterRegistry::from_config(&config);
        assert_eq!(registry.select(Path::new("x.go")).name, "goimports");
        assert!(registry.select(Path::new("x.py")).fallback);
        assert_eq!(registry.select(Path::new("x.txt")).name, "aeol");
        assert!(!registry.extensions().any(|ext| ext == ANY_EXTENSION));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_formatter_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "words.txt", "cherry\napple\nbanana\n");
        let formatter = CommandFormatter::new(FormatterConfig {
            stdin: true,
            ..FormatterConfig::new("sort")
        });
        assert_eq!(formatter.format(&path).unwrap(), b"apple\nbanana\ncherry\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_formatter_large_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let content = "0123456789abcdef\n".repeat(128 * 1024);
        let path = write_temp(&dir, "big.txt", &content);
        let formatter = CommandFormatter::new(FormatterConfig {
            stdin: true,
            ..FormatterConfig::new("cat")
        });
        let output = formatter.format(&path).unwrap();
        assert_eq!(output.len(), 2 * 1024 * 1024);
        assert_eq!(output, content.as_bytes());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_formatter_path_argument() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "words.txt", "b\na\n");
        let formatter = CommandFormatter::new(FormatterConfig::new("sort"));
        assert_eq!(formatter.format(&path).unwrap(), b"a\nb\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_formatter_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "a.txt", "x\n");
        let formatter = CommandFormatter::new(FormatterConfig::new("false"));
        let err = formatter.format(&path).unwrap_err();
        assert!(matches!(err, FormatError::Failed { code: Some(1), .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_formatter_empty_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "a.txt", "x\n");
        let formatter = CommandFormatter::new(FormatterConfig::new("true"));
        assert!(matches!(
            formatter.format(&path),
            Err(FormatError::EmptyOutput { .. })
        ));
    }

    #[test]
    fn test_command_formatter_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "a.txt", "x\n");
        let formatter = CommandFormatter::new(FormatterConfig::new("/nonexistent/formatter"));
        assert!(matches!(
            formatter.format(&path),
            Err(FormatError::Spawn { .. })
        ));
    }
}
