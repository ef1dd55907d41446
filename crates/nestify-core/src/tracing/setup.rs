//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::constants::LOG_ENV_VAR;

static INIT: Once = Once::new();

/// Initialize the nestify tracing/logging system.
///
/// Reads the `NESTIFY_LOG` environment variable for per-subsystem log levels.
/// Format: `NESTIFY_LOG=nestify_engine::rewrite=debug,nestify_engine::routes=info`
///
/// Falls back to `info` for the nestify crates (`debug` when `debug` is set)
/// if `NESTIFY_LOG` is not set or is invalid.
///
/// Idempotent: only the first call installs a subscriber.
pub fn init_tracing(debug: bool) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(default_directives(debug)));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .init();
    });
}

/// Default filter directives for the nestify crates.
pub fn default_directives(debug: bool) -> String {
    let level = if debug { "debug" } else { "info" };
    ["nestify_core", "nestify_engine", "nestify"]
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}
