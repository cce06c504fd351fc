//! # FMSPIC Protocol Constants and Types
//!
//! Core protocol definitions for the FMSPIC receiver stream.
//!
//! A frame is one marker byte followed by one payload byte per channel.
//! The marker encodes the channel count in its low nibble:
//! `marker = 0xF0 + channels + 1`.

use crate::error::{FmspicError, Result};

/// High nibble shared by every marker byte
pub const FMSPIC_MARKER_NIBBLE: u8 = 0xF0;

/// Mask selecting the high nibble of a byte
pub const FMSPIC_NIBBLE_MASK: u8 = 0xF0;

/// Smallest channel count a marker can describe (marker 0xF2)
pub const FMSPIC_MIN_CHANNELS: usize = 1;

/// Largest channel count a marker can describe (marker 0xFF)
pub const FMSPIC_MAX_CHANNELS: usize = 14;

/// Largest possible frame (marker + 14 payload bytes)
pub const FMSPIC_MAX_FRAME_LEN: usize = FMSPIC_MAX_CHANNELS + 1;

/// Channel value range (8-bit, 0xFF is reserved for markers)
pub const FMSPIC_CHANNEL_VALUE_MIN: u8 = 0x00;
pub const FMSPIC_CHANNEL_VALUE_MAX: u8 = 0xFE;

/// Returns true if `byte` could be a marker (upper nibble is 0xF)
pub fn is_marker_candidate(byte: u8) -> bool {
    byte & FMSPIC_NIBBLE_MASK == FMSPIC_MARKER_NIBBLE
}

/// Channel count implied by a marker candidate
///
/// Returns `None` for bytes that are not candidates. The result may be zero
/// or negative (0xF1, 0xF0), which callers must reject.
pub fn candidate_channel_count(byte: u8) -> Option<i32> {
    if !is_marker_candidate(byte) {
        return None;
    }
    Some(i32::from(byte & 0x0F) - 1)
}

/// Frame geometry derived from the channel count discovered at startup
///
/// Immutable for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    channels: usize,
    marker: u8,
}

impl FrameLayout {
    /// Build the layout for `channels` channels
    ///
    /// # Errors
    ///
    /// Returns `SyncNotFound` if the count is outside 1..=14, since no marker
    /// byte can describe such a stream.
    pub fn new(channels: usize) -> Result<Self> {
        if !(FMSPIC_MIN_CHANNELS..=FMSPIC_MAX_CHANNELS).contains(&channels) {
            return Err(FmspicError::SyncNotFound(format!(
                "channel count {} is outside {}..={}",
                channels, FMSPIC_MIN_CHANNELS, FMSPIC_MAX_CHANNELS
            )));
        }

        Ok(Self {
            channels,
            marker: FMSPIC_MARKER_NIBBLE + channels as u8 + 1,
        })
    }

    /// Number of channels carried by each frame
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Synchronization marker value
    pub fn marker(&self) -> u8 {
        self.marker
    }

    /// Total frame length (marker + payload)
    pub fn frame_len(&self) -> usize {
        self.channels + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_derivation() {
        let layout = FrameLayout::new(8).unwrap();
        assert_eq!(layout.channels(), 8);
        assert_eq!(layout.marker(), 0xF9);
        assert_eq!(layout.frame_len(), 9);
    }

    #[test]
    fn test_layout_bounds() {
        assert!(FrameLayout::new(0).is_err());
        assert!(FrameLayout::new(15).is_err());
        assert_eq!(FrameLayout::new(1).unwrap().marker(), 0xF2);
        assert_eq!(FrameLayout::new(14).unwrap().marker(), 0xFF);
        assert_eq!(FrameLayout::new(14).unwrap().frame_len(), FMSPIC_MAX_FRAME_LEN);
    }

    #[test]
    fn test_marker_candidates() {
        assert!(is_marker_candidate(0xF0));
        assert!(is_marker_candidate(0xFF));
        assert!(!is_marker_candidate(0xEF));
        assert!(!is_marker_candidate(0x0F));
    }

    #[test]
    fn test_candidate_channel_count() {
        assert_eq!(candidate_channel_count(0xF9), Some(8));
        assert_eq!(candidate_channel_count(0xF1), Some(0));
        assert_eq!(candidate_channel_count(0xF0), Some(-1));
        assert_eq!(candidate_channel_count(0x7F), None);
    }

    #[test]
    fn test_candidate_round_trips_through_layout() {
        for byte in 0xF2..=0xFFu8 {
            let channels = candidate_channel_count(byte).unwrap() as usize;
            assert_eq!(FrameLayout::new(channels).unwrap().marker(), byte);
        }
    }
}
