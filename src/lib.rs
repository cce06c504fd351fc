//! # FMSPIC Bridge Library
//!
//! Expose an FMSPIC RC receiver as a Linux virtual joystick.
//!
//! This library provides the frame synchronization and decode engine that
//! turns the receiver's unframed serial stream into batches of channel
//! values, and the sinks that publish those batches as joystick axes.

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fmspic;
pub mod logging;
pub mod serial;
pub mod session;
pub mod sink;
