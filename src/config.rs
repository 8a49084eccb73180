use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Extension key whose formatter handles files with no registered extension
pub const ANY_EXTENSION: &str = "anyext";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Formatters keyed by file extension (without the dot).
    /// The `anyext` entry, if present, replaces the built-in fallback
    /// that only ensures a trailing newline.
    #[serde(default = "default_formatters")]
    pub formatters: HashMap<String, FormatterConfig>,

    /// Command run after a save that did not change the window,
    /// or that only went through the fallback formatter
    #[serde(default)]
    pub after_save: Option<HookConfig>,

    #[serde(default)]
    pub acme: AcmeConfig,
}

/// External formatter invocation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormatterConfig {
    /// Program to run
    pub command: String,

    /// Arguments; `$FILE` is replaced by the file path. If no argument
    /// contains `$FILE` and `stdin` is false, the path is appended.
    #[serde(default)]
    pub args: Vec<String>,

    /// Pass the file content on stdin instead of the path
    #[serde(default = "default_false")]
    pub stdin: bool,

    /// Directory to run in (default: the file's directory)
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Command whose output is logged when the formatter fails,
    /// typically a compiler that gives a better error message
    #[serde(default)]
    pub diagnostic: Option<CommandSpec>,
}

impl FormatterConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            stdin: false,
            working_dir: None,
            enabled: true,
            diagnostic: None,
        }
    }
}

/// A plain external command
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandSpec {
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

/// Command run after the formatter pass
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HookConfig {
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Run after every save, not only when the window was left unchanged
    #[serde(default = "default_false")]
    pub always: bool,
}

impl HookConfig {
    pub fn command_spec(&self) -> CommandSpec {
        CommandSpec {
            command: self.command.clone(),
            args: self.args.clone(),
            working_dir: self.working_dir.clone(),
        }
    }
}

/// How to reach acme
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcmeConfig {
    /// plan9port `9p` program used to talk to the acme file server
    #[serde(default = "default_nine_p")]
    pub nine_p: String,
}

fn default_nine_p() -> String {
    "9p".to_string()
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

impl Default for AcmeConfig {
    fn default() -> Self {
        Self {
            nine_p: default_nine_p(),
        }
    }
}

fn default_formatters() -> HashMap<String, FormatterConfig> {
    let mut formatters = HashMap::new();

    formatters.insert(
        "go".to_string(),
        FormatterConfig {
            diagnostic: Some(CommandSpec {
                command: "go".to_string(),
                args: vec![
                    "build".to_string(),
                    "-o".to_string(),
                    os_null().to_string(),
                    "$FILE".to_string(),
                ],
                working_dir: None,
            }),
            ..FormatterConfig::new("goimports")
        },
    );

    formatters.insert("py".to_string(), FormatterConfig::new("yapf"));

    formatters.insert(
        "rs".to_string(),
        FormatterConfig {
            args: vec![
                "--edition".to_string(),
                "2021".to_string(),
                "--emit".to_string(),
                "stdout".to_string(),
            ],
            stdin: true,
            ..FormatterConfig::new("rustfmt")
        },
    );

    formatters.insert(
        "elm".to_string(),
        FormatterConfig {
            args: vec!["--stdin".to_string()],
            stdin: true,
            ..FormatterConfig::new("elm-format")
        },
    );

    formatters
}

fn os_null() -> &'static str {
    if cfg!(windows) {
        "NUL"
    } else {
        "/dev/null"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            formatters: default_formatters(),
            after_save: None,
            acme: AcmeConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config: Config =
            serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path.as_ref(), contents).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Default location: `<config dir>/savefmt/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("savefmt").join("config.json"))
    }

    /// Load `explicit` if given, else the default file if it exists, else defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => {
                tracing::debug!("Loading config from {}", path.display());
                Self::load_from_file(path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (ext, formatter) in &self.formatters {
            if ext.is_empty() || ext.starts_with('.') {
                return Err(ConfigError::ValidationError(format!(
                    "formatter extension {ext:?} must be non-empty and without a leading dot"
                )));
            }
            if formatter.command.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "formatter for {ext:?} has an empty command"
                )));
            }
            if let Some(diagnostic) = &formatter.diagnostic {
                if diagnostic.command.is_empty() {
                    return Err(ConfigError::ValidationError(format!(
                        "diagnostic command for {ext:?} is empty"
                    )));
                }
            }
        }

        if let Some(hook) = &self.after_save {
            if hook.command.is_empty() {
                return Err(ConfigError::ValidationError(
                    "after_save command cannot be empty".to_string(),
                ));
            }
        }

        if self.acme.nine_p.is_empty() {
            return Err(ConfigError::ValidationError(
                "acme.nine_p cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(msg) => write!(f, "IO error: {msg}"),
            ConfigError::ParseError(msg) => write!(f, "Parse error: {msg}"),
            ConfigError::SerializeError(msg) => write!(f, "Serialize error: {msg}"),
            ConfigError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.formatters["go"].command, "goimports");
        assert_eq!(config.formatters["py"].command, "yapf");
        assert!(config.formatters["rs"].stdin);
        assert!(!config.formatters.contains_key(ANY_EXTENSION));
        assert!(config.after_save.is_none());
        assert_eq!(config.acme.nine_p, "9p");
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config
            .formatters
            .insert(".md".to_string(), FormatterConfig::new("mdfmt"));
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config
            .formatters
            .insert("md".to_string(), FormatterConfig::new(""));
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.acme.nine_p.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let config = Config::default();
        config.save_to_file(&config_path).unwrap();

        let loaded = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.formatters, loaded.formatters);
        assert_eq!(config.acme.nine_p, loaded.acme.nine_p);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{
            "formatters": {
                "c": { "command": "clang-format", "stdin": true },
                "anyext": { "command": "aeol" }
            },
            "after_save": { "command": "bl2plus" }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.formatters.len(), 2);
        assert!(config.formatters["c"].enabled);
        assert!(config.formatters["anyext"].args.is_empty());
        assert_eq!(config.after_save.as_ref().unwrap().command, "bl2plus");
        assert!(!config.after_save.unwrap().always);
        assert_eq!(config.acme.nine_p, "9p");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("nope.json");
        let err = Config::load_or_default(Some(missing.as_path())).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "{ formatters: ").unwrap();
        assert!(matches!(
            Config::load_from_file(&path),
            Err(ConfigError::ParseError(_))
        ));
    }
}
