#![no_std]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod buffer;
pub mod config;
pub mod device;
pub mod diagnostics;
pub mod filter;
pub mod interface;
pub mod registers;
pub mod scheduler;
pub mod sensors;
pub mod sink;

// Re-export main types
pub use buffer::{DEFAULT_QUEUE_DEPTH, DepthOutOfRange, MAX_QUEUE_DEPTH, SampleQueue};
pub use config::{AccelConfig, ExpectedConfig, MagConfig, RegisterUpdate};
pub use device::{Lsm303d, Measurement, Stats};
pub use diagnostics::{
    AlarmTone, DiagnosticRecord, EXTREME_THRESHOLD_M_S2, ExtremeMonitor, LogActions, LogCadence,
    RegisterDump,
};
pub use filter::{AxisFilter, LowPassFilter2p};
pub use interface::SpiInterface;
pub use registers::{Register, Registers};
pub use scheduler::{HrtTimer, PollRate, Reschedule, Scheduler};
pub use sensors::{
    AccelAntiAlias, AccelCalibration, AccelRange, AccelRate, AccelSample, MagCalibration,
    MagRange, MagRate, MagSample, RawBurst, Setting,
};
pub use sink::SampleSink;

/// Expected value of the `WHO_AM_I` register
pub const WHO_AM_I_VALUE: u8 = 0x49;

/// Standard gravity in m/s², used to express accelerometer data in SI units
pub const ONE_G: f32 = 9.806_65;

/// Acquisition channels of the LSM303D
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// Accelerometer
    Accel,
    /// Magnetometer
    Mag,
}

/// Driver errors
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Communication error with the device
    Bus(E),
    /// Invalid `WHO_AM_I` register value (contains the actual value read)
    InvalidDevice(u8),
    /// Requested range, rate or bandwidth exceeds what the device supports
    OutOfRange,
    /// Invalid configuration parameter (poll rate, queue depth, calibration)
    InvalidConfig,
    /// Caller's buffer cannot hold a single sample
    BufferTooSmall,
    /// Automatic polling is active but no sample is queued yet
    WouldBlock,
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Self::Bus(error)
    }
}
