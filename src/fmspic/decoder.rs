//! # FMSPIC Frame Decoder
//!
//! Turns a located frame into an ordered batch of raw channel values.

use super::protocol::FrameLayout;
use crate::error::{FmspicError, Result};

/// Raw channel values decoded from one frame, in channel order
///
/// A batch is always forwarded to the sink as a whole, so consumers never
/// see a mix of values from different frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelBatch {
    values: Vec<u8>,
}

impl ChannelBatch {
    /// Wrap raw channel values
    pub fn new(values: Vec<u8>) -> Self {
        Self { values }
    }

    /// Number of channels in the batch
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw values in channel order
    pub fn values(&self) -> &[u8] {
        &self.values
    }

    /// Value of a single channel
    pub fn get(&self, channel: usize) -> Option<u8> {
        self.values.get(channel).copied()
    }

    /// `(channel index, value)` pairs in channel order
    pub fn axis_updates(&self) -> impl Iterator<Item = (u16, u8)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(index, &value)| (index as u16, value))
    }
}

/// Decode a complete FMSPIC frame
///
/// # Arguments
///
/// * `frame` - Frame bytes (marker followed by one byte per channel)
/// * `layout` - Frame geometry discovered at bootstrap
///
/// # Returns
///
/// * `Result<ChannelBatch>` - Payload bytes taken verbatim, or error if invalid
///
/// # Errors
///
/// Returns error if:
/// - Frame length is not `channels + 1`
/// - First byte is not the synchronization marker
pub fn decode_frame(frame: &[u8], layout: &FrameLayout) -> Result<ChannelBatch> {
    if frame.len() != layout.frame_len() {
        return Err(FmspicError::Protocol(format!(
            "Frame length mismatch: expected {} bytes, got {}",
            layout.frame_len(),
            frame.len()
        )));
    }

    if frame[0] != layout.marker() {
        return Err(FmspicError::Protocol(format!(
            "Invalid marker byte: expected 0x{:02X}, got 0x{:02X}",
            layout.marker(),
            frame[0]
        )));
    }

    Ok(ChannelBatch::new(frame[1..].to_vec()))
}
