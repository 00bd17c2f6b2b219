//! Sensor modules for the LSM303D
//!
//! This module provides types, enums, and calibration structures for each
//! channel of the LSM303D:
//! - Accelerometer (3-axis)
//! - Magnetometer (3-axis)
//!
//! Every hardware setting is a typed enum implementing [`Setting`], which
//! carries the bit pattern table for its control register field.

pub mod accelerometer;
pub mod magnetometer;

use crate::registers::Register;

// Re-export main types
pub use accelerometer::{AccelAntiAlias, AccelCalibration, AccelRange, AccelRate, AccelSample};
pub use magnetometer::{MagCalibration, MagRange, MagRate, MagSample};

/// An enumerated hardware setting living in one control register bit field
pub trait Setting: Copy + Sized + 'static {
    /// Every supported setting, in ascending order of [`value`](Self::value)
    const ALL: &'static [Self];
    /// Control register holding the field
    const REGISTER: Register;
    /// Bits of the field, cleared before [`bits`](Self::bits) is applied
    const MASK: u8;

    /// Value in engineering units (g, Ga, Hz)
    fn value(self) -> u32;

    /// Bit pattern within [`MASK`](Self::MASK)
    fn bits(self) -> u8;

    /// Pick the smallest supported setting covering `request`
    ///
    /// A request of zero selects the largest setting. Returns `None` when the
    /// request exceeds the largest setting.
    #[must_use]
    fn select(request: u32) -> Option<Self> {
        if request == 0 {
            return Self::ALL.last().copied();
        }
        Self::ALL.iter().copied().find(|s| s.value() >= request)
    }
}

/// Status byte and axis values from one burst read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawBurst {
    /// Channel status register
    pub status: u8,
    /// X-axis (raw)
    pub x: i16,
    /// Y-axis (raw)
    pub y: i16,
    /// Z-axis (raw)
    pub z: i16,
}

impl RawBurst {
    /// Bytes in one burst: status followed by three little-endian axes
    pub const LEN: usize = 7;

    /// Decode a burst read starting at a status register
    #[must_use]
    pub const fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self {
            status: bytes[0],
            x: i16::from_le_bytes([bytes[1], bytes[2]]),
            y: i16::from_le_bytes([bytes[3], bytes[4]]),
            z: i16::from_le_bytes([bytes[5], bytes[6]]),
        }
    }
}

/// `(raw * lsb_scale - offset) * scale` for one axis
#[inline]
pub(crate) fn calibrate_axis(raw: i16, lsb_scale: f32, offset: f32, scale: f32) -> f32 {
    (f32::from(raw) * lsb_scale - offset) * scale
}
