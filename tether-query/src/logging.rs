//! Logging setup for Tether.
//!
//! Everything in this crate logs through `tracing`; this module only decides
//! whether and how a subscriber is installed.
//!
//! # Environment Variables
//!
//! - `TETHER_DEBUG=true|1|yes` - Enable debug logging
//! - `TETHER_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `TETHER_LOG_FORMAT=json|pretty|compact` - Output format (default: json)
//!
//! Installing a subscriber requires the `tracing-subscriber` feature. Without
//! it the calls below are no-ops and events reach whatever subscriber the
//! application installed itself.
//!
//! ```rust,no_run
//! use tether_query::logging;
//!
//! logging::init();
//! // or, ignoring TETHER_LOG_LEVEL:
//! logging::init_with_level("trace");
//! ```
//!
//! Events emitted by the loader:
//!
//! - `debug`: one per include call and per dispatched step
//! - `trace`: key grouping and merge counters
//! - `warn`: failed steps and fetches slower than the configured threshold

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line human readable output.
    Pretty,
    /// Single-line human readable output.
    Compact,
}

impl LogFormat {
    /// Parse a format name; unknown names fall back to JSON.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "compact" => Self::Compact,
            _ => Self::Json,
        }
    }

    /// The format name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        }
    }
}

/// Check if debug logging is enabled via `TETHER_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("TETHER_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

fn normalize_level(level: &str) -> Option<&'static str> {
    match level.to_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}

/// The log level from `TETHER_LOG_LEVEL`.
///
/// Defaults to "debug" when `TETHER_DEBUG` is enabled, otherwise "warn".
pub fn get_log_level() -> &'static str {
    env::var("TETHER_LOG_LEVEL")
        .ok()
        .and_then(|level| normalize_level(&level))
        .unwrap_or(if is_debug_enabled() { "debug" } else { "warn" })
}

/// The log format from `TETHER_LOG_FORMAT`.
pub fn get_log_format() -> LogFormat {
    env::var("TETHER_LOG_FORMAT")
        .map(|f| LogFormat::parse(&f))
        .unwrap_or_default()
}

/// Install the subscriber described by the environment.
///
/// Does nothing unless `TETHER_DEBUG` or `TETHER_LOG_LEVEL` is set. Only the
/// first initialization in a process has an effect.
pub fn init() {
    if !is_debug_enabled() && env::var("TETHER_LOG_LEVEL").is_err() {
        return;
    }
    install(get_log_level(), get_log_format());
}

/// Install a subscriber at `level`, using the format from the environment.
///
/// Unknown level names fall back to "warn".
pub fn init_with_level(level: &str) {
    install(normalize_level(level).unwrap_or("warn"), get_log_format());
}

/// Install a debug-level subscriber.
pub fn init_debug() {
    install("debug", get_log_format());
}

#[cfg_attr(not(feature = "tracing-subscriber"), allow(unused_variables))]
fn install(level: &'static str, format: LogFormat) {
    INIT.call_once(|| {
        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let filter = EnvFilter::try_new(format!(
                "tether={},tether_query={},tether_memory={}",
                level, level, level
            ))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

            let registry = tracing_subscriber::registry().with(filter);
            let installed = match format {
                LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
                LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
                LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
            };

            if installed.is_ok() {
                tracing::info!(level = level, format = format.as_str(), "Tether logging initialized");
            }
        }
    });
}

/// Debug log that is only emitted when `TETHER_DEBUG` is enabled.
#[macro_export]
macro_rules! tether_debug {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            tracing::debug!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("PRETTY"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("compact"), LogFormat::Compact);
        assert_eq!(LogFormat::parse("xml"), LogFormat::Json);
    }

    #[test]
    fn test_normalize_level() {
        assert_eq!(normalize_level("TRACE"), Some("trace"));
        assert_eq!(normalize_level("verbose"), None);
    }

    #[test]
    fn test_init_is_idempotent() {
        init_with_level("warn");
        init_debug();
    }
}
