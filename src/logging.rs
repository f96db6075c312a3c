//! Structured logging setup via tracing-subscriber
//!
//! Configurable through the environment:
//! - `RTCPLAY_LOG`: filter directive (trace/debug/info/warn/error or a full
//!   EnvFilter string), overrides the configured level
//! - `RTCPLAY_LOG_FORMAT`: text or json, overrides the configured format

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "RTCPLAY_LOG";
pub const LOG_FORMAT_ENV: &str = "RTCPLAY_LOG_FORMAT";

/// Install the global subscriber.
///
/// Returns `false` if a subscriber was already installed, in which case the
/// existing one is left alone.
pub fn init_logging(level: &str, format: &str) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let format = std::env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| format.to_string());

    let installed = match format.as_str() {
        "json" => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_current_span(true)
            .try_init(),
        _ => fmt().with_env_filter(filter).with_target(true).try_init(),
    };
    installed.is_ok()
}

/// Whether a level string is one of the plain levels
pub fn is_valid_level(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

/// Whether a format string is supported
pub fn is_valid_format(format: &str) -> bool {
    matches!(format, "text" | "json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_levels() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            assert!(is_valid_level(level));
        }
        assert!(!is_valid_level("verbose"));
        assert!(!is_valid_level("INFO"));
    }

    #[test]
    fn test_valid_formats() {
        assert!(is_valid_format("text"));
        assert!(is_valid_format("json"));
        assert!(!is_valid_format("xml"));
    }

    #[test]
    fn test_second_init_is_harmless() {
        init_logging("debug", "text");
        assert!(!init_logging("debug", "text"));
    }
}
