//! # Bridge Session
//!
//! Owns every piece of runtime state and drives the decode loop:
//! read → synchronize → decode → sample → publish.
//!
//! The loop is strictly sequential. The only suspension point is the timed
//! read; a timeout is counted and logged, then the loop carries on.

use std::time::Duration;

use tokio::io::AsyncRead;
use tracing::{debug, info, warn};

use crate::diagnostics::sampler::FrameSampler;
use crate::error::Result;
use crate::fmspic::decoder::{decode_frame, ChannelBatch};
use crate::fmspic::protocol::FrameLayout;
use crate::fmspic::sync::{FrameSynchronizer, SyncStats};
use crate::serial::{read_with_timeout, ReadOutcome};
use crate::sink::EventSink;

/// Counters reported when a session ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Bytes received from the source
    pub bytes_read: u64,
    /// Batches handed to the sink
    pub batches_published: u64,
    /// Reads that timed out without data
    pub read_timeouts: u64,
    /// Frames dumped to stdout by the sampler
    pub frames_sampled: u64,
    /// Synchronizer counters
    pub sync: SyncStats,
}

/// Runtime state for one receiver
pub struct Session<R, S> {
    source: R,
    sync: FrameSynchronizer,
    sampler: FrameSampler,
    sink: S,
    read_timeout: Duration,
    scratch: Vec<u8>,
    stats: SessionStats,
    /// Consecutive timeouts in the current stall
    stalled_reads: u64,
}

impl<R, S> Session<R, S>
where
    R: AsyncRead + Unpin,
    S: EventSink,
{
    /// Build a session for a stream whose layout was found at bootstrap
    ///
    /// # Errors
    ///
    /// Returns `Protocol` if `buffer_capacity` cannot hold two frames.
    pub fn new(
        source: R,
        layout: FrameLayout,
        buffer_capacity: usize,
        sink: S,
        sample_period: u32,
        read_timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            source,
            sync: FrameSynchronizer::new(layout, buffer_capacity)?,
            sampler: FrameSampler::new(sample_period),
            sink,
            read_timeout,
            scratch: vec![0u8; buffer_capacity],
            stats: SessionStats::default(),
            stalled_reads: 0,
        })
    }

    pub fn layout(&self) -> &FrameLayout {
        self.sync.layout()
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            sync: self.sync.stats(),
            ..self.stats
        }
    }

    /// Run until the source closes
    ///
    /// # Errors
    ///
    /// Stops at the first read or sink failure.
    pub async fn run(&mut self) -> Result<SessionStats> {
        info!(
            "Decoding {}-channel frames (marker 0x{:02X})",
            self.layout().channels(),
            self.layout().marker()
        );

        while self.step().await? {}

        warn!("Byte source closed, stopping");
        Ok(self.stats())
    }

    /// Perform one read cycle
    ///
    /// Returns `false` once the source has closed.
    pub async fn step(&mut self) -> Result<bool> {
        let free = self.sync.free_capacity();
        let outcome =
            read_with_timeout(&mut self.source, &mut self.scratch[..free], self.read_timeout)
                .await?;

        match outcome {
            ReadOutcome::Closed => return Ok(false),
            ReadOutcome::TimedOut => {
                self.stats.read_timeouts += 1;
                self.stalled_reads += 1;
                if self.stalled_reads == 1 {
                    warn!("No data from receiver for {:?}", self.read_timeout);
                } else {
                    debug!("Still no data from receiver ({} timeouts)", self.stalled_reads);
                }
                return Ok(true);
            }
            ReadOutcome::Data(n) => {
                if self.stalled_reads > 0 {
                    info!("Receiver data resumed after {} timeouts", self.stalled_reads);
                    self.stalled_reads = 0;
                }
                self.stats.bytes_read += n as u64;
                self.sync.push(&self.scratch[..n]);
            }
        }

        self.process()?;
        Ok(true)
    }

    /// Decode and publish the latest buffered frame, if there is one
    ///
    /// Returns the published batch.
    pub fn process(&mut self) -> Result<Option<ChannelBatch>> {
        let frame = match self.sync.next_frame() {
            Some(frame) => frame,
            None => return Ok(None),
        };

        let batch = decode_frame(&frame, self.sync.layout())?;

        // Dumps were asked for with -s, so they bypass the log filter
        if let Some(line) = self.sampler.record(&frame) {
            println!("{}", line);
            self.stats.frames_sampled += 1;
        }

        self.sink.publish(&batch)?;
        self.stats.batches_published += 1;

        Ok(Some(batch))
    }

    /// Give back the sink, e.g. to inspect what it received
    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FmspicError;
    use crate::fmspic::encoder::encode_frame;
    use crate::sink::MockEventSink;
    use tokio_test::io::Builder;

    const CHANNELS: usize = 4;
    const TIMEOUT: Duration = Duration::from_millis(100);

    /// Records every published batch
    #[derive(Default)]
    struct RecordingSink {
        batches: Vec<ChannelBatch>,
    }

    impl EventSink for RecordingSink {
        fn publish(&mut self, batch: &ChannelBatch) -> Result<()> {
            self.batches.push(batch.clone());
            Ok(())
        }
    }

    fn layout() -> FrameLayout {
        FrameLayout::new(CHANNELS).unwrap()
    }

    fn frame(values: [u8; CHANNELS]) -> Vec<u8> {
        encode_frame(&ChannelBatch::new(values.to_vec()), &layout()).unwrap()
    }

    fn session<R: AsyncRead + Unpin>(source: R) -> Session<R, RecordingSink> {
        Session::new(source, layout(), 128, RecordingSink::default(), 0, TIMEOUT).unwrap()
    }

    #[tokio::test]
    async fn test_publishes_one_batch_per_frame_read() {
        let mut source = Builder::new();
        source.read(&[0x01, 0x02]);
        source.read(&frame([10, 20, 30, 40]));
        source.read(&frame([11, 21, 31, 41]));

        let mut session = session(source.build());
        let stats = session.run().await.unwrap();

        assert_eq!(stats.batches_published, 2);
        assert_eq!(stats.bytes_read, 12);
        let sink = session.into_sink();
        assert_eq!(sink.batches[0].values(), &[10, 20, 30, 40]);
        assert_eq!(sink.batches[1].values(), &[11, 21, 31, 41]);
    }

    #[tokio::test]
    async fn test_backlog_publishes_latest_frame_only() {
        let mut backlog = frame([1; CHANNELS]);
        backlog.extend(frame([2; CHANNELS]));
        backlog.extend(frame([3; CHANNELS]));

        let mut session = session(Builder::new().read(&backlog).build());
        let stats = session.run().await.unwrap();

        assert_eq!(stats.batches_published, 1);
        assert_eq!(stats.sync.superseded_frames, 2);
        assert_eq!(session.into_sink().batches[0].values(), &[3; CHANNELS]);
    }

    #[tokio::test]
    async fn test_frame_split_across_reads() {
        let bytes = frame([5, 6, 7, 8]);
        let mut session = session(
            Builder::new()
                .read(&bytes[..1])
                .read(&bytes[1..3])
                .read(&bytes[3..])
                .build(),
        );

        assert!(session.step().await.unwrap());
        assert!(session.step().await.unwrap());
        assert_eq!(session.stats().batches_published, 0);

        assert!(session.step().await.unwrap());
        assert_eq!(session.stats().batches_published, 1);

        assert!(!session.step().await.unwrap());
    }

    #[tokio::test]
    async fn test_marker_free_stream_keeps_running() {
        let noise = vec![0x55u8; 1000];
        let mut source = Builder::new();
        for chunk in noise.chunks(100) {
            source.read(chunk);
        }
        source.read(&frame([9, 9, 9, 9]));

        let mut session = session(source.build());
        let stats = session.run().await.unwrap();

        assert!(stats.sync.overflow_discards > 0);
        assert_eq!(stats.batches_published, 1);
        assert_eq!(session.into_sink().batches[0].values(), &[9; CHANNELS]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_timeouts_are_counted() {
        let mut session = session(
            Builder::new()
                .wait(Duration::from_millis(350))
                .read(&frame([1, 2, 3, 4]))
                .build(),
        );

        let stats = session.run().await.unwrap();
        assert_eq!(stats.read_timeouts, 3);
        assert_eq!(stats.batches_published, 1);
    }

    #[tokio::test]
    async fn test_sink_failure_is_fatal() {
        let mut sink = MockEventSink::new();
        sink.expect_publish()
            .times(1)
            .returning(|_| Err(FmspicError::SinkWrite("device gone".to_string())));

        let source = Builder::new().read(&frame([1, 2, 3, 4])).build();
        let mut session = Session::new(source, layout(), 128, sink, 0, TIMEOUT).unwrap();

        match session.run().await {
            Err(FmspicError::SinkWrite(msg)) => assert!(msg.contains("device gone")),
            other => panic!("Expected SinkWrite error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_failure_is_fatal() {
        let source = Builder::new()
            .read(&[0x01])
            .read_error(std::io::Error::new(std::io::ErrorKind::Other, "usb reset"))
            .build();
        let mut session = session(source);

        assert!(matches!(session.run().await, Err(FmspicError::Read(_))));
    }

    #[tokio::test]
    async fn test_sink_receives_batches_in_order() {
        let mut sink = MockEventSink::new();
        let mut seq = mockall::Sequence::new();
        for value in [1u8, 2, 3] {
            sink.expect_publish()
                .withf(move |batch| batch.values() == [value; CHANNELS])
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(()));
        }

        let mut source = Builder::new();
        for value in [1u8, 2, 3] {
            source.read(&frame([value; CHANNELS]));
        }
        let mut session = Session::new(source.build(), layout(), 128, sink, 0, TIMEOUT).unwrap();

        let stats = session.run().await.unwrap();
        assert_eq!(stats.batches_published, 3);
    }

    #[tokio::test]
    async fn test_sampled_frames_are_counted() {
        let mut source = Builder::new();
        for value in 1u8..=5 {
            source.read(&frame([value; CHANNELS]));
        }
        let mut session =
            Session::new(source.build(), layout(), 128, RecordingSink::default(), 2, TIMEOUT)
                .unwrap();

        let stats = session.run().await.unwrap();
        assert_eq!(stats.batches_published, 5);
        assert_eq!(stats.frames_sampled, 2);
    }

    #[tokio::test]
    async fn test_sampling_disabled_dumps_nothing() {
        let mut source = Builder::new();
        for value in 1u8..=3 {
            source.read(&frame([value; CHANNELS]));
        }

        let stats = session(source.build()).run().await.unwrap();
        assert_eq!(stats.batches_published, 3);
        assert_eq!(stats.frames_sampled, 0);
    }

    #[test]
    fn test_capacity_too_small_is_rejected() {
        let result = Session::new(
            Builder::new().build(),
            layout(),
            4,
            RecordingSink::default(),
            0,
            TIMEOUT,
        );
        assert!(result.is_err());
    }
}
