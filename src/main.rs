//! # FMSPIC Bridge
//!
//! Expose an FMSPIC RC receiver as a Linux virtual joystick.
//!
//! This application reads the receiver's serial stream, recovers frame
//! boundaries, and publishes each frame's channel values as joystick axes.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use fmspic_bridge::cli::Cli;
use fmspic_bridge::config::Config;
use fmspic_bridge::fmspic::bootstrap;
use fmspic_bridge::logging::init_logging;
use fmspic_bridge::serial::RxSerial;
use fmspic_bridge::session::{Session, SessionStats};
use fmspic_bridge::sink::{EventSink, NullSink, UinputSink};

/// Main entry point for FMSPIC Bridge
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Parse the command line and load configuration
///    - Set up logging with tracing subscriber
///    - Open the receiver's serial port
///
/// 2. **Bootstrap**
///    - Read the first bytes of the stream to discover the channel count
///    - Create the virtual joystick (skipped in test mode)
///
/// 3. **Main Loop**
///    - Read, synchronize, decode and publish until the port closes
///    - Handle Ctrl+C for graceful shutdown
///
/// # Exit Codes
///
/// - 0: Ctrl+C or the serial port closed
/// - 1: Transport, bootstrap, read or device failure
/// - 2: Invalid usage
///
/// # Examples
///
/// ```bash
/// fmspic-bridge -s 100 /dev/ttyUSB0
/// ```
///
/// Expected output (the channel count and frame dumps go to stdout and do
/// not depend on the log level):
/// ```text
/// INFO fmspic_bridge: FMSPIC Bridge v0.1.0 starting...
/// INFO fmspic_bridge::serial: Opened FMSPIC receiver at /dev/ttyUSB0
/// 8 channels
/// INFO fmspic_bridge::sink::uinput: Created virtual joystick 'FMSPIC' with 8 axes
///    100:  f9 7f 7f 00 7f 00 00 00 00
/// ```
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config().context("Failed to load configuration")?;

    let _log_guard = init_logging(cli.log_level, config.logging.directory.as_deref());

    info!("FMSPIC Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    run(&cli, &config).await
}

async fn run(cli: &Cli, config: &Config) -> Result<()> {
    let read_timeout = Duration::from_millis(config.serial.read_timeout_ms);

    let serial = RxSerial::open(&cli.device, &config.serial)
        .with_context(|| format!("Failed to set up serial port {}", cli.device))?;
    let mut port = serial.into_stream();

    let layout = bootstrap::discover(&mut port, config.sync.bootstrap_window, read_timeout)
        .await
        .context("Failed to find FMSPIC sync")?;
    println!("{} channels", layout.channels());

    let sink: Box<dyn EventSink> = if cli.test_mode {
        info!("Test mode: not creating a virtual joystick");
        Box::new(NullSink)
    } else {
        Box::new(
            UinputSink::create(layout.channels(), &config.device)
                .context("Failed to create virtual joystick")?,
        )
    };

    let mut session = Session::new(
        port,
        layout,
        config.sync.buffer_capacity,
        sink,
        config.diagnostics.sample_period,
        read_timeout,
    )?;

    info!("Press Ctrl+C to exit");

    tokio::select! {
        result = session.run() => {
            result.context("Receiver stream failed")?;
        }

        // Handle Ctrl+C for graceful shutdown
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    log_summary(&session.stats());
    Ok(())
}

fn log_summary(stats: &SessionStats) {
    info!(
        "Published {} batches from {} bytes ({} superseded frames, {} overflow discards, \
         {} read timeouts, {} frames sampled)",
        stats.batches_published,
        stats.bytes_read,
        stats.sync.superseded_frames,
        stats.sync.overflow_discards,
        stats.read_timeouts,
        stats.frames_sampled
    );
}
