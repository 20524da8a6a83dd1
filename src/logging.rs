//! Logging setup.
//!
//! All output goes to **stderr** so that stdout stays free for whatever the
//! binary prints (the `devcycle-token` tool prints the token there).
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Controls log levels (e.g., `info`, `debug`, `devcycle_provider=debug`)
//!
//! # Examples
//!
//! ```bash
//! # Show debug logs for the provider only, including API request URLs
//! RUST_LOG=devcycle_provider=debug devcycle-token
//! ```

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Level used when `RUST_LOG` is not set.
pub const DEFAULT_LEVEL: &str = "info";

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}

/// Initialize the global subscriber, defaulting to `info`.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default(DEFAULT_LEVEL);
}

/// Initialize the global subscriber with a custom default level.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_level: &str) {
    tracing_subscriber::registry()
        .with(filter(default_level))
        .with(layer())
        .init();
}

/// Try to initialize logging, returning false if a subscriber is already set.
///
/// Safe to call from several tests in one process.
pub fn try_init_logging() -> bool {
    tracing_subscriber::registry()
        .with(filter(DEFAULT_LEVEL))
        .with(layer())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    // The global subscriber can only be set once per process, so only the
    // filter parsing and the non-panicking initializer are exercised here.

    use super::*;

    #[test]
    fn test_env_filter_parsing() {
        assert!(EnvFilter::try_new(DEFAULT_LEVEL).is_ok());
        assert!(EnvFilter::try_new("devcycle_provider=debug").is_ok());
        assert!(EnvFilter::try_new("warn,devcycle_provider::api=debug").is_ok());
    }

    #[test]
    fn test_try_init_twice_does_not_panic() {
        let _ = try_init_logging();
        assert!(!try_init_logging());
    }
}
