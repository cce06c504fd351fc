//! # Frame Sampler
//!
//! Reports every Nth decoded frame verbatim, marker byte included.
//!
//! ```
//! use fmspic_bridge::diagnostics::sampler::FrameSampler;
//!
//! let mut sampler = FrameSampler::new(2);
//! assert_eq!(sampler.record(&[0xF3, 0x10, 0x20]), None);
//! assert_eq!(
//!     sampler.record(&[0xF3, 0x11, 0x21]).as_deref(),
//!     Some("     2:  f3 11 21")
//! );
//! ```

/// Samples decoded frames for periodic dumps
#[derive(Debug, Clone)]
pub struct FrameSampler {
    /// Report every `period`th frame; 0 disables reporting
    period: u32,
    /// Frames decoded since start
    count: u64,
}

impl FrameSampler {
    pub fn new(period: u32) -> Self {
        Self { period, count: 0 }
    }

    /// Frames recorded so far
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_enabled(&self) -> bool {
        self.period > 0
    }

    /// Count a decoded frame and return its dump line if it is due
    pub fn record(&mut self, frame: &[u8]) -> Option<String> {
        self.count += 1;

        if !self.is_enabled() || self.count % u64::from(self.period) != 0 {
            return None;
        }

        Some(format_frame(self.count, frame))
    }
}

/// Format a frame as `"{seq:>6}: "` followed by ` xx` per byte
pub fn format_frame(sequence: u64, frame: &[u8]) -> String {
    let bytes: String = frame.iter().map(|byte| format!(" {:02x}", byte)).collect();
    format!("{:6}: {}", sequence, bytes)
}
