//! # Bootstrap Scanner
//!
//! Discovers the channel count from the first bytes of the stream.
//!
//! Any byte in the window with an upper nibble of 0xF is a candidate marker
//! and implies `(byte & 0x0F) - 1` channels. The last candidate in the window
//! wins. A window without candidates, or whose last candidate implies zero
//! or fewer channels, is fatal: it points at wiring or a protocol mismatch.

use std::io;
use std::time::Duration;

use tokio::io::AsyncRead;
use tracing::{debug, warn};

use super::protocol::{candidate_channel_count, FrameLayout};
use crate::error::{FmspicError, Result};
use crate::serial::{read_with_timeout, ReadOutcome};

/// Number of leading stream bytes inspected at startup
pub const DEFAULT_BOOTSTRAP_WINDOW: usize = 32;

/// Derive the frame layout from a window of raw stream bytes
///
/// # Errors
///
/// Returns `SyncNotFound` if no candidate marker is present, or if the last
/// candidate implies a channel count outside the valid range.
///
/// # Examples
///
/// ```
/// use fmspic_bridge::fmspic::bootstrap::scan_window;
///
/// let layout = scan_window(&[0x12, 0xF9, 0x40, 0x41]).unwrap();
/// assert_eq!(layout.channels(), 8);
/// assert_eq!(layout.marker(), 0xF9);
/// ```
pub fn scan_window(window: &[u8]) -> Result<FrameLayout> {
    let candidate = window
        .iter()
        .rev()
        .find_map(|&byte| candidate_channel_count(byte).map(|count| (byte, count)));

    let (byte, count) = candidate.ok_or_else(|| {
        FmspicError::SyncNotFound(format!(
            "no marker candidate in the first {} bytes",
            window.len()
        ))
    })?;

    if count <= 0 {
        return Err(FmspicError::SyncNotFound(format!(
            "marker candidate 0x{:02X} implies {} channels",
            byte, count
        )));
    }

    debug!("Bootstrap picked marker candidate 0x{:02X}", byte);
    FrameLayout::new(count as usize)
}

/// Read the bootstrap window from `source` and derive the frame layout
///
/// Reads exactly `window_len` bytes, so nothing past the window is consumed.
/// Read timeouts are logged and the read is retried.
///
/// # Errors
///
/// - `Read` if the source fails or closes before the window is full
/// - `SyncNotFound` if the window does not identify a channel count
pub async fn discover<R>(
    source: &mut R,
    window_len: usize,
    read_timeout: Duration,
) -> Result<FrameLayout>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut window = vec![0u8; window_len];
    let mut filled = 0;

    while filled < window_len {
        match read_with_timeout(source, &mut window[filled..], read_timeout).await? {
            ReadOutcome::Data(n) => filled += n,
            ReadOutcome::TimedOut => {
                warn!(
                    "No data from receiver after {:?} ({} of {} bootstrap bytes)",
                    read_timeout, filled, window_len
                );
            }
            ReadOutcome::Closed => {
                return Err(FmspicError::Read(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("stream closed after {} of {} bootstrap bytes", filled, window_len),
                )));
            }
        }
    }

    scan_window(&window)
}
