//! # FMSPIC Frame Encoder
//!
//! Encodes a channel batch back into wire form. The bridge itself only
//! receives, but the encoder is used to build known-good streams.

use super::decoder::ChannelBatch;
use super::protocol::*;
use crate::error::{FmspicError, Result};

/// Encode a channel batch into a complete FMSPIC frame
///
/// # Arguments
///
/// * `batch` - Channel values (one per channel, 0-254)
/// * `layout` - Frame geometry
///
/// # Returns
///
/// * `Result<Vec<u8>>` - Marker followed by the channel values
///
/// # Errors
///
/// Returns error if the batch size differs from the layout's channel count,
/// or if any value is outside 0-254.
///
/// # Examples
///
/// ```
/// use fmspic_bridge::fmspic::decoder::ChannelBatch;
/// use fmspic_bridge::fmspic::encoder::encode_frame;
/// use fmspic_bridge::fmspic::protocol::FrameLayout;
///
/// let layout = FrameLayout::new(4).unwrap();
/// let frame = encode_frame(&ChannelBatch::new(vec![127; 4]), &layout).unwrap();
/// assert_eq!(frame, vec![0xF5, 127, 127, 127, 127]);
/// ```
pub fn encode_frame(batch: &ChannelBatch, layout: &FrameLayout) -> Result<Vec<u8>> {
    if batch.len() != layout.channels() {
        return Err(FmspicError::Protocol(format!(
            "Batch has {} channels, layout expects {}",
            batch.len(),
            layout.channels()
        )));
    }

    if let Some(value) = batch
        .values()
        .iter()
        .find(|&&v| v > FMSPIC_CHANNEL_VALUE_MAX)
    {
        return Err(FmspicError::Protocol(format!(
            "Channel value 0x{:02X} is reserved for markers",
            value
        )));
    }

    let mut frame = Vec::with_capacity(layout.frame_len());
    frame.push(layout.marker());
    frame.extend_from_slice(batch.values());

    Ok(frame)
}
