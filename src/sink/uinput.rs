//! # Uinput Joystick Sink
//!
//! Publishes channel batches through a Linux uinput virtual device, so any
//! program reading joysticks sees the receiver as one.
//!
//! ## Device Layout
//!
//! - One absolute axis per channel, codes 0..N-1 (ABS_X, ABS_Y, ABS_Z, ...)
//! - Axis range 0-254 by default (raw FMSPIC values)
//! - Name "FMSPIC", USB bus, vendor 0x0003, product 0x0003, version 2

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{
    AbsInfo, AbsoluteAxisType, BusType, EventType, InputEvent, InputId, UinputAbsSetup,
};
use tracing::{debug, info};

use super::EventSink;
use crate::config::DeviceConfig;
use crate::error::{FmspicError, Result};
use crate::fmspic::decoder::ChannelBatch;

/// Virtual joystick backed by /dev/uinput
///
/// The kernel device is destroyed when this value is dropped.
pub struct UinputSink {
    device: VirtualDevice,
    channels: usize,
}

impl std::fmt::Debug for UinputSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UinputSink")
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}

impl UinputSink {
    /// Create a virtual joystick with one absolute axis per channel
    ///
    /// # Errors
    ///
    /// Returns `DeviceSetup` if /dev/uinput cannot be opened (usually a
    /// permissions problem) or the kernel rejects the device description.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use fmspic_bridge::config::DeviceConfig;
    /// use fmspic_bridge::sink::UinputSink;
    ///
    /// let sink = UinputSink::create(8, &DeviceConfig::default())?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn create(channels: usize, config: &DeviceConfig) -> Result<Self> {
        let setup_err = |what: &str, e: std::io::Error| {
            FmspicError::DeviceSetup(format!("{}: {}", what, e))
        };

        let mut builder = VirtualDeviceBuilder::new()
            .map_err(|e| setup_err("Failed to open /dev/uinput", e))?
            .name(config.name.as_str())
            .input_id(InputId::new(
                BusType::BUS_USB,
                config.vendor,
                config.product,
                config.version,
            ));

        for axis in axis_setups(channels, config) {
            builder = builder
                .with_absolute_axis(&axis)
                .map_err(|e| setup_err("Failed to register axis", e))?;
        }

        let mut device = builder
            .build()
            .map_err(|e| setup_err("Failed to create virtual device", e))?;

        match device.enumerate_dev_nodes_blocking() {
            Ok(nodes) => {
                for node in nodes.flatten() {
                    debug!("Virtual device node: {}", node.display());
                }
            }
            Err(e) => debug!("Could not list virtual device nodes: {}", e),
        }

        info!(
            "Created virtual joystick '{}' with {} axes",
            config.name, channels
        );
        Ok(Self { device, channels })
    }

    pub fn channels(&self) -> usize {
        self.channels
    }
}

impl EventSink for UinputSink {
    fn publish(&mut self, batch: &ChannelBatch) -> Result<()> {
        // `emit` terminates the batch with SYN_REPORT
        self.device
            .emit(&batch_events(batch))
            .map_err(|e| FmspicError::SinkWrite(format!("Failed to write events: {}", e)))
    }
}

/// Absolute axis descriptions for channels 0..N-1
fn axis_setups(channels: usize, config: &DeviceConfig) -> Vec<UinputAbsSetup> {
    (0..channels)
        .map(|channel| {
            UinputAbsSetup::new(
                AbsoluteAxisType(channel as u16),
                AbsInfo::new(0, config.axis_min, config.axis_max, 0, 0, 0),
            )
        })
        .collect()
}

/// One EV_ABS event per channel, in channel order
fn batch_events(batch: &ChannelBatch) -> Vec<InputEvent> {
    batch
        .axis_updates()
        .map(|(code, value)| InputEvent::new(EventType::ABSOLUTE, code, i32::from(value)))
        .collect()
}
