//! # FMSPIC Protocol Module
//!
//! Implementation of the FMSPIC receiver stream format.
//!
//! This module handles:
//! - Channel count discovery from the first bytes of the stream
//! - Frame synchronization over a bounded buffer
//! - Decoding frames into channel batches (and encoding them back)

pub mod bootstrap;
pub mod decoder;
pub mod encoder;
pub mod protocol;
pub mod sync;
