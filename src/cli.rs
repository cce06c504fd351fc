//! # Command Line Interface
//!
//! `fmspic-bridge [-s N] [-t] [-c FILE] [--log-level LEVEL] <DEVICE>`
//!
//! Usage errors exit with code 2 (clap's default).

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::Config;
use crate::error::Result;

#[derive(Parser, Debug)]
#[command(
    name = "fmspic-bridge",
    version,
    about = "Expose an FMSPIC RC receiver as a Linux virtual joystick"
)]
pub struct Cli {
    /// Print a received frame to stdout once every N frames (0: don't print any)
    #[arg(short = 's', long, value_name = "N")]
    pub sample_period: Option<u32>,

    /// Test mode: parse the serial stream but don't create the joystick device
    #[arg(short = 't', long)]
    pub test_mode: bool,

    /// TOML configuration file
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Default log level (RUST_LOG directives replace it when set)
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Serial device the receiver is attached to (e.g. /dev/ttyUSB0)
    pub device: String,
}

impl Cli {
    /// Load the configuration file, if any, and apply command line overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or fails validation.
    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(period) = self.sample_period {
            config.diagnostics.sample_period = period;
        }

        Ok(config)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> tracing::level_filters::LevelFilter {
        match self {
            LogLevel::Error => tracing::level_filters::LevelFilter::ERROR,
            LogLevel::Warn => tracing::level_filters::LevelFilter::WARN,
            LogLevel::Info => tracing::level_filters::LevelFilter::INFO,
            LogLevel::Debug => tracing::level_filters::LevelFilter::DEBUG,
            LogLevel::Trace => tracing::level_filters::LevelFilter::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_device_only() {
        let cli = Cli::try_parse_from(["fmspic-bridge", "/dev/ttyUSB0"]).unwrap();
        assert_eq!(cli.device, "/dev/ttyUSB0");
        assert_eq!(cli.sample_period, None);
        assert!(!cli.test_mode);
        assert_eq!(cli.log_level, LogLevel::Info);
    }

    #[test]
    fn test_parses_short_flags() {
        let cli = Cli::try_parse_from(["fmspic-bridge", "-s", "50", "-t", "/dev/ttyS0"]).unwrap();
        assert_eq!(cli.sample_period, Some(50));
        assert!(cli.test_mode);
        assert_eq!(cli.device, "/dev/ttyS0");
    }

    #[test]
    fn test_device_is_required() {
        let err = Cli::try_parse_from(["fmspic-bridge", "-t"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_negative_sample_period_is_rejected() {
        let err = Cli::try_parse_from(["fmspic-bridge", "-s", "-1", "/dev/ttyUSB0"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_extra_positional_is_rejected() {
        assert!(Cli::try_parse_from(["fmspic-bridge", "/dev/ttyUSB0", "/dev/ttyUSB1"]).is_err());
    }

    #[test]
    fn test_sample_period_overrides_config() {
        let cli = Cli::try_parse_from(["fmspic-bridge", "-s", "7", "/dev/ttyUSB0"]).unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.diagnostics.sample_period, 7);
    }

    #[test]
    fn test_defaults_without_config_file() {
        let cli = Cli::try_parse_from(["fmspic-bridge", "/dev/ttyUSB0"]).unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.diagnostics.sample_period, 0);
        assert_eq!(config.sync.bootstrap_window, 32);
    }

    #[test]
    fn test_log_level_filters() {
        assert_eq!(
            LogLevel::Debug.as_filter(),
            tracing::level_filters::LevelFilter::DEBUG
        );
    }
}
