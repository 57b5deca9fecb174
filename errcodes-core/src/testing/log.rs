//! Tracing output for tests.
//!
//! Call [`init_test_logging`] at the top of a test; repeated calls are no-ops.
//! Output goes through the test writer so `cargo test` captures it per test.
//!
//! # Environment Variables
//!
//! - `ERRCODES_TEST_LOG_LEVEL`: log level filter (default: `info`)
//! - `ERRCODES_TEST_LOG_JSON`: emit JSON lines instead of compact text

use std::sync::Once;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

static TEST_LOGGING_INIT: Once = Once::new();

pub fn init_test_logging() {
    TEST_LOGGING_INIT.call_once(|| {
        let level =
            std::env::var("ERRCODES_TEST_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let filter = EnvFilter::try_new(format!("errcodes_core={level}"))
            .unwrap_or_else(|_| EnvFilter::new("info"));
        let json = std::env::var("ERRCODES_TEST_LOG_JSON").is_ok_and(|v| v == "1" || v == "true");

        let registry = tracing_subscriber::registry().with(filter);
        // Another harness may already own the global subscriber.
        let _ = if json {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_test_writer(),
                )
                .try_init()
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_test_writer()
                        .with_target(true)
                        .compact(),
                )
                .try_init()
        };
    });
}
