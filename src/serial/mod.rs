//! # Serial Communication Module
//!
//! Handles the receive side of the FMSPIC serial link.
//!
//! This module handles:
//! - Opening the receiver's serial port (9600 baud, 8N1 by default)
//! - Flushing stale driver buffers after open
//! - Timed reads from any async byte source

use std::io::ErrorKind;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_serial::{SerialPort, SerialPortBuilderExt};
use tracing::{debug, info};

use crate::config::SerialConfig;
use crate::error::{FmspicError, Result};

/// FMSPIC receivers talk at 9600 baud
pub const FMSPIC_BAUD_RATE: u32 = 9600;

/// Result of a single timed read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n` bytes were read into the buffer
    Data(usize),
    /// No bytes arrived before the timeout elapsed
    TimedOut,
    /// The source reported end of stream
    Closed,
}

/// Read once from `source`, giving up after `timeout`
///
/// `Interrupted` errors are retried; any other I/O error is fatal and
/// returned as `FmspicError::Read`. An empty `buf` reads nothing and
/// reports `Data(0)`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use fmspic_bridge::serial::{read_with_timeout, ReadOutcome};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> fmspic_bridge::error::Result<()> {
/// let mut source: &[u8] = &[0xF9, 0x10];
/// let mut buf = [0u8; 8];
/// let outcome = read_with_timeout(&mut source, &mut buf, Duration::from_millis(10)).await?;
/// assert_eq!(outcome, ReadOutcome::Data(2));
/// # Ok(())
/// # }
/// ```
pub async fn read_with_timeout<R>(
    source: &mut R,
    buf: &mut [u8],
    timeout: Duration,
) -> Result<ReadOutcome>
where
    R: AsyncRead + Unpin + ?Sized,
{
    if buf.is_empty() {
        return Ok(ReadOutcome::Data(0));
    }

    loop {
        match tokio::time::timeout(timeout, source.read(buf)).await {
            Err(_elapsed) => return Ok(ReadOutcome::TimedOut),
            Ok(Ok(0)) => return Ok(ReadOutcome::Closed),
            Ok(Ok(n)) => return Ok(ReadOutcome::Data(n)),
            Ok(Err(e)) if e.kind() == ErrorKind::Interrupted => continue,
            Ok(Err(e)) => return Err(FmspicError::Read(e)),
        }
    }
}

/// FMSPIC receiver serial port
///
/// Owns the opened port; the port itself is the byte source handed to the
/// session.
pub struct RxSerial {
    /// Serial port handle
    port: tokio_serial::SerialStream,
    /// Device path (e.g., /dev/ttyUSB0)
    device_path: String,
}

impl std::fmt::Debug for RxSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RxSerial")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl RxSerial {
    /// Open and configure the receiver's serial port
    ///
    /// # Arguments
    ///
    /// * `path` - Device path (e.g., "/dev/ttyUSB0")
    /// * `config` - Serial settings (baud rate)
    ///
    /// # Errors
    ///
    /// - `TransportOpen` if the device cannot be opened
    /// - `TransportConfig` if its buffers cannot be flushed
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use fmspic_bridge::config::SerialConfig;
    /// use fmspic_bridge::serial::RxSerial;
    ///
    /// let serial = RxSerial::open("/dev/ttyUSB0", &SerialConfig::default())?;
    /// println!("Listening on {}", serial.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(path: &str, config: &SerialConfig) -> Result<Self> {
        debug!("Opening serial port {} at {} baud", path, config.baud_rate);

        let port = Self::open_port(path, config.baud_rate)?;

        // Drop whatever the driver buffered before we configured the port
        port.clear(tokio_serial::ClearBuffer::All)
            .map_err(|e| FmspicError::TransportConfig(format!("Failed to flush {}: {}", path, e)))?;

        info!("Opened FMSPIC receiver at {}", path);
        Ok(Self {
            port,
            device_path: path.to_string(),
        })
    }

    /// Open a specific serial port with raw 8N1 settings
    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| FmspicError::TransportOpen {
                path: path.to_string(),
                reason: e.to_string(),
            })
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Hand over the port as a byte source
    pub fn into_stream(self) -> tokio_serial::SerialStream {
        self.port
    }
}
