//! Process-wide logging for gunzip-relay
//!
//! Usage:
//! - Set RELAY_LOG=info (default) - transfer summaries (byte counts, locations)
//! - Set RELAY_LOG=debug - per-transfer progress and store resolution
//! - Set RELAY_LOG=warn / error - failures only
//! - Set RELAY_LOG=off - no logs

use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

/// Environment variable selecting the minimum log level
pub const LOG_ENV_VAR: &str = "RELAY_LOG";

static INIT: Once = Once::new();

/// Minimum level named by a `RELAY_LOG` value.
///
/// Returns `None` for "off". Unknown values fall back to info and are
/// reported by [`init_diagnostics`].
#[must_use]
pub fn parse_level(value: &str) -> Option<emit::Level> {
    match value.trim().to_ascii_lowercase().as_str() {
        "off" => None,
        "debug" => Some(emit::Level::Debug),
        "warn" => Some(emit::Level::Warn),
        "error" => Some(emit::Level::Error),
        _ => Some(emit::Level::Info),
    }
}

fn is_known_level(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "off" | "debug" | "info" | "warn" | "error"
    )
}

/// Initialize diagnostics based on the RELAY_LOG environment variable
///
/// Called once at startup. Subsequent calls are ignored.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let log_level = std::env::var(LOG_ENV_VAR).unwrap_or_else(|_| "info".to_string());

        let Some(level) = parse_level(&log_level) else {
            return;
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(level))
            .init();

        if !is_known_level(&log_level) {
            emit::warn!(
                "Unknown {var} value '{value}', using 'info'",
                var: LOG_ENV_VAR,
                value: log_level.as_str(),
            );
        }

        // The runtime lives for the whole process.
        std::mem::forget(rt);
    });
}

/// Log transfer-level events users expect in normal operation.
///
/// Examples: "Downloaded 1024 bytes", "Successfully uploaded to s3://bucket/key"
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Log detailed progress (store resolution, pipe sizing, per-record steps).
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Log recoverable problems (failed aborts, skipped records under a continue policy).
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Log failed transfers and aborted batches.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

/// Re-export the init function for convenience
pub use init_diagnostics as init;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_safe_to_call_multiple_times() {
        init_diagnostics();
        init_diagnostics();
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("off"), None);
        assert_eq!(parse_level("DEBUG"), Some(emit::Level::Debug));
        assert_eq!(parse_level(" warn "), Some(emit::Level::Warn));
        assert_eq!(parse_level("error"), Some(emit::Level::Error));
        assert_eq!(parse_level("info"), Some(emit::Level::Info));
        assert_eq!(parse_level("chatty"), Some(emit::Level::Info));
        assert!(!is_known_level("chatty"));
    }

    #[test]
    fn test_macros_compile() {
        info!("Test message");
        debug!("Debug message with {value}", value: 42);
        warn!("Warning message");
        error!("Error message");
    }
}
