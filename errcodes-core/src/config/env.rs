//! Environment variable parsing with type safety.
//!
//! Parses `ERRCODES_*` overrides, collecting every problem instead of
//! stopping at the first one, and tracking which variable set each value.

use super::source::Sourced;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during environment variable parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    /// Invalid value for a variable.
    #[error("Invalid value for {var}: expected {expected}, got '{value}'")]
    InvalidValue {
        var: String,
        expected: String,
        value: String,
    },

    /// Value out of valid range.
    #[error("Value out of range for {var}: {value} (valid: {min}..={max})")]
    OutOfRange {
        var: String,
        value: String,
        min: String,
        max: String,
    },

    /// Invalid log level.
    #[error("Invalid log level for {var}: {value}")]
    InvalidLogLevel { var: String, value: String },
}

/// Log levels accepted by [`parse_log_level`].
const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Type-safe environment variable parser.
///
/// Collects errors during parsing so all issues can be reported at once.
pub struct EnvParser {
    prefix: &'static str,
    errors: Vec<EnvError>,
}

impl EnvParser {
    /// Create a new parser with the ERRCODES_ prefix.
    pub fn new() -> Self {
        Self {
            prefix: "ERRCODES_",
            errors: Vec::new(),
        }
    }

    /// Get all accumulated errors.
    pub fn errors(&self) -> &[EnvError] {
        &self.errors
    }

    /// Check if any errors occurred.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Take ownership of errors.
    pub fn take_errors(&mut self) -> Vec<EnvError> {
        std::mem::take(&mut self.errors)
    }

    /// Get the full variable name with prefix.
    fn var_name(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// Get a boolean value with default.
    ///
    /// Accepts: 1, true, yes, on (for true)
    ///          0, false, no, off, "" (for false)
    pub fn get_bool(&mut self, name: &str, default: bool) -> Sourced<bool> {
        let var_name = self.var_name(name);
        match env::var(&var_name) {
            Ok(value) => match parse_bool(&value) {
                Some(parsed) => Sourced::from_env(parsed, var_name),
                None => {
                    self.errors.push(EnvError::InvalidValue {
                        var: var_name.clone(),
                        expected: "boolean (true/false/1/0/yes/no)".to_string(),
                        value,
                    });
                    Sourced::from_env(default, var_name)
                }
            },
            Err(_) => Sourced::default_value(default),
        }
    }

    /// Get a usize value with default and range validation.
    pub fn get_usize_range(
        &mut self,
        name: &str,
        default: usize,
        min: usize,
        max: usize,
    ) -> Sourced<usize> {
        let var_name = self.var_name(name);
        match env::var(&var_name) {
            Ok(value) => match value.trim().parse::<usize>() {
                Ok(n) if n >= min && n <= max => Sourced::from_env(n, var_name),
                Ok(n) => {
                    self.errors.push(EnvError::OutOfRange {
                        var: var_name.clone(),
                        value: n.to_string(),
                        min: min.to_string(),
                        max: max.to_string(),
                    });
                    Sourced::from_env(default, var_name)
                }
                Err(_) => {
                    self.errors.push(EnvError::InvalidValue {
                        var: var_name.clone(),
                        expected: "unsigned integer".to_string(),
                        value,
                    });
                    Sourced::default_value(default)
                }
            },
            Err(_) => Sourced::default_value(default),
        }
    }

    /// Get a log level value with validation.
    pub fn get_log_level(&mut self, name: &str, default: &str) -> Sourced<String> {
        let var_name = self.var_name(name);
        match env::var(&var_name) {
            Ok(value) => match parse_log_level(&value) {
                Some(level) => Sourced::from_env(level, var_name),
                None => {
                    self.errors.push(EnvError::InvalidLogLevel {
                        var: var_name.clone(),
                        value,
                    });
                    Sourced::from_env(default.to_string(), var_name)
                }
            },
            Err(_) => Sourced::default_value(default.to_string()),
        }
    }

    /// Get an optional path with ~ expansion (None if not set or empty).
    pub fn get_optional_path(&mut self, name: &str) -> Sourced<Option<PathBuf>> {
        let var_name = self.var_name(name);
        match env::var(&var_name) {
            Ok(value) if value.is_empty() => Sourced::from_env(None, var_name),
            Ok(value) => Sourced::from_env(Some(expand_home(&value)), var_name),
            Err(_) => Sourced::default_value(None),
        }
    }
}

impl Default for EnvParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Lowercased level if `value` names one of [`LOG_LEVELS`].
pub fn parse_log_level(value: &str) -> Option<String> {
    let lower = value.to_lowercase();
    LOG_LEVELS.contains(&lower.as_str()).then_some(lower)
}

fn expand_home(value: &str) -> PathBuf {
    match value.strip_prefix("~/") {
        Some(stripped) => dirs::home_dir()
            .map(|home| home.join(stripped))
            .unwrap_or_else(|| PathBuf::from(value)),
        None => PathBuf::from(value),
    }
}
