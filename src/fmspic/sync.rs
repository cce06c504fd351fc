//! # Frame Synchronizer
//!
//! Recovers frame boundaries from an unframed FMSPIC byte stream.
//!
//! Bytes accumulate in a capacity-bounded buffer. After each read the buffer
//! is scanned from the end toward the start for a marker followed by a full
//! payload, so a backlog of several frames collapses to the most recent one.
//! Everything up to and including that frame is then discarded; trailing
//! bytes that cannot yet form a frame stay at the buffer head.
//!
//! Losing synchronization is not an error. If the buffer fills up without a
//! usable marker, the oldest half is dropped and scanning continues.

use bytes::{Buf, Bytes, BytesMut};
use tracing::debug;

use super::protocol::FrameLayout;
use crate::error::{FmspicError, Result};

/// Default accumulation buffer size in bytes
pub const DEFAULT_BUFFER_CAPACITY: usize = 128;

/// Counters describing synchronizer behaviour since start
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Frames returned by `next_frame`
    pub frames: u64,
    /// Complete frames dropped because a later frame superseded them
    pub superseded_frames: u64,
    /// Times the overflow policy discarded the oldest half of the buffer
    pub overflow_discards: u64,
    /// Bytes thrown away by the overflow policy
    pub discarded_bytes: u64,
}

/// Bounded-buffer frame synchronizer
#[derive(Debug)]
pub struct FrameSynchronizer {
    layout: FrameLayout,
    buf: BytesMut,
    capacity: usize,
    stats: SyncStats,
}

impl FrameSynchronizer {
    /// Create a synchronizer for `layout` with a buffer of `capacity` bytes
    ///
    /// # Errors
    ///
    /// Returns `Protocol` if the capacity cannot hold two frames. The overflow
    /// policy relies on the newer half of a full buffer holding any partial
    /// frame intact.
    pub fn new(layout: FrameLayout, capacity: usize) -> Result<Self> {
        if capacity < 2 * layout.frame_len() {
            return Err(FmspicError::Protocol(format!(
                "Buffer capacity {} is too small for {}-byte frames",
                capacity,
                layout.frame_len()
            )));
        }

        Ok(Self {
            layout,
            buf: BytesMut::with_capacity(capacity),
            capacity,
            stats: SyncStats::default(),
        })
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes currently buffered
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Room left before the buffer reaches capacity
    pub fn free_capacity(&self) -> usize {
        self.capacity - self.buf.len()
    }

    /// Currently buffered bytes, oldest first
    pub fn buffered_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    /// Append received bytes to the buffer tail
    ///
    /// Accepts at most `free_capacity()` bytes and returns how many were
    /// taken. Callers size their reads with `free_capacity()` so nothing is
    /// refused in practice.
    pub fn push(&mut self, bytes: &[u8]) -> usize {
        let accepted = bytes.len().min(self.free_capacity());
        self.buf.extend_from_slice(&bytes[..accepted]);
        accepted
    }

    /// Take the most recent complete frame out of the buffer
    ///
    /// Returns `None` when no marker with a full payload behind it is
    /// buffered yet. In that case a full buffer is halved so the next read
    /// has room.
    pub fn next_frame(&mut self) -> Option<Bytes> {
        match self.find_latest_frame() {
            Some(start) => {
                self.stats.superseded_frames += self.count_frames_before(start);
                self.stats.frames += 1;

                self.buf.advance(start);
                Some(self.buf.split_to(self.layout.frame_len()).freeze())
            }
            None => {
                if self.buf.len() >= self.capacity {
                    self.discard_oldest_half();
                }
                None
            }
        }
    }

    /// Offset of the last marker that has a full payload after it
    fn find_latest_frame(&self) -> Option<usize> {
        let last_start = self.buf.len().checked_sub(self.layout.frame_len())?;
        let marker = self.layout.marker();

        (0..=last_start).rev().find(|&i| self.buf[i] == marker)
    }

    /// Non-overlapping complete frames that end at or before `end`
    fn count_frames_before(&self, end: usize) -> u64 {
        let marker = self.layout.marker();
        let frame_len = self.layout.frame_len();
        let mut count = 0;
        let mut i = 0;

        while i + frame_len <= end {
            if self.buf[i] == marker {
                count += 1;
                i += frame_len;
            } else {
                i += 1;
            }
        }
        count
    }

    fn discard_oldest_half(&mut self) {
        let discard = self.capacity / 2;
        self.buf.advance(discard);

        self.stats.overflow_discards += 1;
        self.stats.discarded_bytes += discard as u64;
        debug!(
            "Buffer full without a frame marker, discarded {} oldest bytes",
            discard
        );
    }
}
