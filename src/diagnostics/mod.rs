//! # Diagnostics Module
//!
//! Observability for the decode pipeline.
//!
//! This module handles:
//! - Sampling every Nth decoded frame as a raw hex dump
//! - Counting decoded frames since start

pub mod sampler;
