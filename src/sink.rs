//! Outbound notifications from the acquisition routines
//!
//! The driver calls a [`SampleSink`] from timer context after each committed
//! sample. Every method defaults to a no-op so implementations only override
//! what they consume. `()` is the sink that consumes nothing.

use crate::Channel;
use crate::diagnostics::DiagnosticRecord;
use crate::sensors::{AccelSample, MagSample};

/// Receiver for reader wake-ups, published samples and diagnostic records
pub trait SampleSink {
    /// A sample was queued on `channel`; blocked readers may wake
    fn notify(&mut self, _channel: Channel) {}

    /// Publish an accelerometer sample to the system
    fn publish_accel(&mut self, _sample: &AccelSample) {}

    /// Publish a magnetometer sample to the system
    fn publish_mag(&mut self, _sample: &MagSample) {}

    /// Diagnostic record for an accelerometer sample while logging is enabled
    fn diagnostic(&mut self, _record: &DiagnosticRecord) {}
}

impl SampleSink for () {}
