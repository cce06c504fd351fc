//! # Error Types
//!
//! Custom error types for FMSPIC Bridge using `thiserror`.
//!
//! Every variant is fatal: callers propagate it to process termination.
//! Loss of frame synchronization is deliberately absent, since the
//! synchronizer recovers from it by rescanning.

use thiserror::Error;

/// Main error type for FMSPIC Bridge
#[derive(Debug, Error)]
pub enum FmspicError {
    /// Serial device could not be opened
    #[error("Failed to open transport {path}: {reason}")]
    TransportOpen { path: String, reason: String },

    /// Serial device opened but could not be configured
    #[error("Transport configuration error: {0}")]
    TransportConfig(String),

    /// Bootstrap window did not yield a usable channel count
    #[error("Sync not found: {0}")]
    SyncNotFound(String),

    /// Reading from the byte source failed
    #[error("Read error: {0}")]
    Read(#[source] std::io::Error),

    /// Publishing a channel batch to the event sink failed
    #[error("Sink write error: {0}")]
    SinkWrite(String),

    /// Virtual input device could not be created
    #[error("Device setup error: {0}")]
    DeviceSetup(String),

    /// Malformed FMSPIC frame or batch
    #[error("FMSPIC protocol error: {0}")]
    Protocol(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for FMSPIC Bridge
pub type Result<T> = std::result::Result<T, FmspicError>;
