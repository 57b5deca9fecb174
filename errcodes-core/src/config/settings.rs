//! Service configuration: schema, file loading, env overrides, validation.

use super::env::{EnvError, EnvParser, parse_log_level};
use crate::publisher::DEFAULT_BUFFER;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Largest accepted per-subscriber event buffer.
pub const MAX_EVENT_BUFFER: usize = 65_536;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid environment overrides: {}", join_env_errors(.0))]
    Env(Vec<EnvError>),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn join_env_errors(errors: &[EnvError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Event publishing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventsConfig {
    /// Events buffered per subscriber before it starts to lag.
    #[serde(default = "default_buffer")]
    pub buffer: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            buffer: DEFAULT_BUFFER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error, off).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_buffer() -> usize {
    DEFAULT_BUFFER
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `<config dir>/errcodes/config.toml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("errcodes").join("config.toml"))
}

impl ServiceConfig {
    /// Parse a TOML document. Missing sections and fields take defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load defaults, then the config file, then environment overrides.
    ///
    /// The file is `path` if given, else `ERRCODES_CONFIG`, else
    /// [`default_config_path`]. An explicitly named file must exist; the
    /// default one is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut parser = EnvParser::new();
        let from_env = parser.get_optional_path("CONFIG");

        let explicit = path.map(Path::to_path_buf).or(from_env.value);
        let mut config = match explicit {
            Some(path) => {
                debug!(path = %path.display(), "loading config file");
                Self::load_file(&path)?
            }
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => {
                    debug!(path = %path.display(), "loading default config file");
                    Self::load_file(&path)?
                }
                None => Self::default(),
            },
        };

        config.apply_env(&mut parser);
        if parser.has_errors() {
            return Err(ConfigError::Env(parser.take_errors()));
        }

        config.validate()?;
        Ok(config)
    }

    /// Override fields from `ERRCODES_*` variables.
    ///
    /// Invalid values are recorded on `parser` and leave the field unchanged.
    pub fn apply_env(&mut self, parser: &mut EnvParser) {
        let buffer = parser.get_usize_range("EVENT_BUFFER", self.events.buffer, 1, MAX_EVENT_BUFFER);
        self.events.buffer = buffer.value;

        let level = parser.get_log_level("LOG_LEVEL", &self.logging.level);
        self.logging.level = level.value;

        let json = parser.get_bool("LOG_JSON", self.logging.json);
        self.logging.json = json.value;
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_EVENT_BUFFER).contains(&self.events.buffer) {
            return Err(ConfigError::Invalid {
                field: "events.buffer",
                reason: format!(
                    "{} is outside 1..={MAX_EVENT_BUFFER}",
                    self.events.buffer
                ),
            });
        }
        if parse_log_level(&self.logging.level).is_none() {
            return Err(ConfigError::Invalid {
                field: "logging.level",
                reason: format!("unknown level '{}'", self.logging.level),
            });
        }
        Ok(())
    }
}
