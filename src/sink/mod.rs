//! # Event Sink Module
//!
//! Destinations for decoded channel batches.
//!
//! This module handles:
//! - The `EventSink` seam used by the session
//! - Publishing batches to a Linux uinput joystick (`UinputSink`)
//! - Discarding batches in test mode (`NullSink`)

pub mod uinput;

use tracing::trace;

use crate::error::Result;
use crate::fmspic::decoder::ChannelBatch;

pub use uinput::UinputSink;

/// Consumer of decoded channel batches
///
/// Implementations must publish the whole batch followed by a completion
/// signal, so readers never observe a partial update.
#[cfg_attr(test, mockall::automock)]
pub trait EventSink {
    /// Publish one batch
    ///
    /// # Errors
    ///
    /// Returns `SinkWrite` if the batch could not be delivered. The session
    /// treats this as fatal.
    fn publish(&mut self, batch: &ChannelBatch) -> Result<()>;
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn publish(&mut self, batch: &ChannelBatch) -> Result<()> {
        (**self).publish(batch)
    }
}

/// Sink used in test mode: the stream is parsed but nothing is published
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&mut self, batch: &ChannelBatch) -> Result<()> {
        trace!("Test mode, dropping batch {:02x?}", batch.values());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sink_accepts_batches() {
        let mut sink = NullSink;
        assert!(sink.publish(&ChannelBatch::new(vec![1, 2, 3])).is_ok());
    }

    #[test]
    fn test_boxed_sink_forwards() {
        let mut mock = MockEventSink::new();
        mock.expect_publish()
            .withf(|batch| batch.values() == [4, 5])
            .times(1)
            .returning(|_| Ok(()));

        let mut boxed: Box<dyn EventSink> = Box::new(mock);
        boxed.publish(&ChannelBatch::new(vec![4, 5])).unwrap();
    }
}
