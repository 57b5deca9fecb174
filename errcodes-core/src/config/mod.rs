//! Configuration for the error description resolver.
//!
//! Values are layered, later sources winning:
//! - built-in defaults
//! - an optional TOML file
//! - `ERRCODES_*` environment variables
//!
//! Each environment lookup records where its value came from so startup
//! problems can be traced to the variable that caused them.

pub mod env;
pub mod settings;
pub mod source;

pub use env::{EnvError, EnvParser};
pub use settings::{
    ConfigError, EventsConfig, LoggingConfig, ServiceConfig, default_config_path,
};
pub use source::{ConfigSource, Sourced};

#[cfg(test)]
pub(crate) fn env_test_lock() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock, PoisonError};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}
