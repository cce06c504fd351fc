//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and field has a default, so the bridge runs without a
//! configuration file and a file only needs the values it changes.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{FmspicError, Result};
use crate::fmspic::bootstrap::DEFAULT_BOOTSTRAP_WINDOW;
use crate::fmspic::protocol::{FMSPIC_CHANNEL_VALUE_MAX, FMSPIC_MAX_FRAME_LEN};
use crate::fmspic::sync::DEFAULT_BUFFER_CAPACITY;
use crate::serial::FMSPIC_BAUD_RATE;

/// Baud rates accepted for the receiver link
const VALID_BAUD_RATES: &[u32] = &[1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200];

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// How long a read may wait before the stall is reported
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

/// Frame synchronization configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    #[serde(default = "default_bootstrap_window")]
    pub bootstrap_window: usize,

    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
}

/// Diagnostics configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DiagnosticsConfig {
    /// Dump every Nth frame; 0 disables dumps
    #[serde(default)]
    pub sample_period: u32,
}

/// Virtual joystick configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DeviceConfig {
    #[serde(default = "default_device_name")]
    pub name: String,

    #[serde(default = "default_vendor")]
    pub vendor: u16,

    #[serde(default = "default_product")]
    pub product: u16,

    #[serde(default = "default_version")]
    pub version: u16,

    #[serde(default)]
    pub axis_min: i32,

    #[serde(default = "default_axis_max")]
    pub axis_max: i32,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Also write logs to daily rotated files in this directory
    #[serde(default)]
    pub directory: Option<String>,
}

// Default value functions
fn default_baud_rate() -> u32 { FMSPIC_BAUD_RATE }
fn default_read_timeout_ms() -> u64 { 1000 }

fn default_bootstrap_window() -> usize { DEFAULT_BOOTSTRAP_WINDOW }
fn default_buffer_capacity() -> usize { DEFAULT_BUFFER_CAPACITY }

fn default_device_name() -> String { "FMSPIC".to_string() }
fn default_vendor() -> u16 { 0x3 }
fn default_product() -> u16 { 0x3 }
fn default_version() -> u16 { 2 }
fn default_axis_max() -> i32 { i32::from(FMSPIC_CHANNEL_VALUE_MAX) }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            bootstrap_window: default_bootstrap_window(),
            buffer_capacity: default_buffer_capacity(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: default_device_name(),
            vendor: default_vendor(),
            product: default_product(),
            version: default_version(),
            axis_min: 0,
            axis_max: default_axis_max(),
        }
    }
}

fn invalid(msg: impl std::fmt::Display) -> FmspicError {
    FmspicError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use fmspic_bridge::config::Config;
    ///
    /// let config = Config::load("config/fmspic.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if !VALID_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(invalid(format!(
                "baud_rate must be one of: {:?}",
                VALID_BAUD_RATES
            )));
        }

        if self.serial.read_timeout_ms == 0 || self.serial.read_timeout_ms > 60000 {
            return Err(invalid("read_timeout_ms must be between 1 and 60000"));
        }

        if self.sync.bootstrap_window == 0 || self.sync.bootstrap_window > 1024 {
            return Err(invalid("bootstrap_window must be between 1 and 1024"));
        }

        // Must hold two of the largest possible frames for the overflow policy
        let min_capacity = 2 * FMSPIC_MAX_FRAME_LEN;
        if self.sync.buffer_capacity < min_capacity || self.sync.buffer_capacity > 65536 {
            return Err(invalid(format!(
                "buffer_capacity must be between {} and 65536",
                min_capacity
            )));
        }

        if self.device.name.is_empty() {
            return Err(invalid("device name cannot be empty"));
        }

        if self.device.axis_min >= self.device.axis_max {
            return Err(invalid("axis_min must be less than axis_max"));
        }

        if let Some(dir) = &self.logging.directory {
            if dir.is_empty() {
                return Err(invalid("logging directory cannot be empty when set"));
            }
        }

        Ok(())
    }
}
