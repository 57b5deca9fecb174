//! Source tracking for configuration values.

use serde::Serialize;
use std::fmt;

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Built-in default.
    Default,
    /// Environment variable.
    Environment,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Environment => write!(f, "environment"),
        }
    }
}

/// A value together with its source.
#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub value: T,
    pub source: ConfigSource,
    /// Variable name when the value came from the environment.
    pub env_var: Option<String>,
}

impl<T> Sourced<T> {
    pub fn default_value(value: T) -> Self {
        Self {
            value,
            source: ConfigSource::Default,
            env_var: None,
        }
    }

    pub fn from_env(value: T, var: impl Into<String>) -> Self {
        Self {
            value,
            source: ConfigSource::Environment,
            env_var: Some(var.into()),
        }
    }

    pub fn is_from_env(&self) -> bool {
        self.source == ConfigSource::Environment
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}
