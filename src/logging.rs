//! # Logging Setup
//!
//! Console logging through `tracing-subscriber`, plus an optional daily
//! rotated log file through `tracing-appender`.
//!
//! `--log-level` only sets the default; any `RUST_LOG` directives replace it.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Log file name prefix inside the configured directory
pub const LOG_FILE_PREFIX: &str = "fmspic-bridge.log";

/// Build the event filter from `RUST_LOG`-style directives
///
/// `level` applies only when `directives` is empty. Invalid directives are
/// reported on stderr and skipped.
pub fn build_filter(level: LogLevel, directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.as_filter().into())
        .parse_lossy(directives)
}

/// Install the global subscriber
///
/// The returned guard flushes the log file on drop and must be kept alive
/// for the lifetime of the program.
pub fn init_logging(level: LogLevel, directory: Option<&str>) -> Option<WorkerGuard> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    let filter = build_filter(level, &directives);

    match directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();

            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_log_level_is_default_without_directives() {
        let filter = build_filter(LogLevel::Warn, "");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn test_env_directive_overrides_log_level() {
        let filter = build_filter(LogLevel::Info, "debug");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));

        let filter = build_filter(LogLevel::Debug, "error");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::ERROR));
    }

    #[test]
    fn test_target_directives_are_kept() {
        let filter = build_filter(LogLevel::Info, "fmspic_bridge::session=trace");
        assert!(filter.to_string().contains("fmspic_bridge::session=trace"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
    }

    #[test]
    fn test_invalid_directives_fall_back_to_log_level() {
        let filter = build_filter(LogLevel::Error, "=not a level=");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::ERROR));
    }
}
