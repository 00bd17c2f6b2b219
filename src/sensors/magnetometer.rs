//! Magnetometer sensor types and configuration
//!
//! Provides types, enums, and utility functions for the LSM303D's 3-axis
//! magnetometer.

use super::{Setting, calibrate_axis};
use crate::registers::Register;

/// Magnetometer full-scale range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MagRange {
    /// ±2 gauss
    Ga2,
    /// ±4 gauss
    Ga4,
    /// ±8 gauss
    Ga8,
    /// ±12 gauss
    Ga12,
}

impl MagRange {
    /// Sensitivity in mGa per LSB
    #[must_use]
    pub const fn mga_per_lsb(self) -> f32 {
        match self {
            Self::Ga2 => 0.080,
            Self::Ga4 => 0.160,
            Self::Ga8 => 0.320,
            Self::Ga12 => 0.479,
        }
    }

    /// Scale from one LSB to gauss
    #[must_use]
    pub fn scale_ga(self) -> f32 {
        self.mga_per_lsb() * 1e-3
    }

    /// Full-scale magnitude in gauss
    #[must_use]
    pub const fn ga(self) -> u8 {
        match self {
            Self::Ga2 => 2,
            Self::Ga4 => 4,
            Self::Ga8 => 8,
            Self::Ga12 => 12,
        }
    }
}

impl Setting for MagRange {
    const ALL: &'static [Self] = &[Self::Ga2, Self::Ga4, Self::Ga8, Self::Ga12];
    const REGISTER: Register = Register::Ctrl6;
    const MASK: u8 = 0b0110_0000;

    fn value(self) -> u32 {
        u32::from(self.ga())
    }

    fn bits(self) -> u8 {
        match self {
            Self::Ga2 => 0b0000_0000,
            Self::Ga4 => 0b0010_0000,
            Self::Ga8 => 0b0100_0000,
            Self::Ga12 => 0b0110_0000,
        }
    }
}

/// Magnetometer output data rate
///
/// The device also offers 3.125, 6.25 and 12.5 Hz; requests below 25 Hz
/// still select 25 Hz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MagRate {
    /// 25 Hz
    Hz25,
    /// 50 Hz
    Hz50,
    /// 100 Hz
    Hz100,
}

impl MagRate {
    /// Output data rate in Hz
    #[must_use]
    pub const fn hz(self) -> u32 {
        match self {
            Self::Hz25 => 25,
            Self::Hz50 => 50,
            Self::Hz100 => 100,
        }
    }
}

impl Setting for MagRate {
    const ALL: &'static [Self] = &[Self::Hz25, Self::Hz50, Self::Hz100];
    const REGISTER: Register = Register::Ctrl5;
    const MASK: u8 = 0b0001_1100;

    fn value(self) -> u32 {
        self.hz()
    }

    fn bits(self) -> u8 {
        match self {
            Self::Hz25 => 0b0000_1100,
            Self::Hz50 => 0b0001_0000,
            Self::Hz100 => 0b0001_0100,
        }
    }
}

/// Magnetometer calibration data
///
/// Compensates for hard-iron (offset, gauss) and soft-iron (scale) effects.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MagCalibration {
    /// Offset for X-axis (hard-iron bias)
    pub offset_x: f32,
    /// Scale factor for X-axis (soft-iron correction)
    pub scale_x: f32,
    /// Offset for Y-axis (hard-iron bias)
    pub offset_y: f32,
    /// Scale factor for Y-axis (soft-iron correction)
    pub scale_y: f32,
    /// Offset for Z-axis (hard-iron bias)
    pub offset_z: f32,
    /// Scale factor for Z-axis (soft-iron correction)
    pub scale_z: f32,
}

impl Default for MagCalibration {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            scale_x: 1.0,
            offset_y: 0.0,
            scale_y: 1.0,
            offset_z: 0.0,
            scale_z: 1.0,
        }
    }
}

impl MagCalibration {
    /// Convert raw axes to calibrated gauss using `lsb_scale` (Ga per LSB)
    #[must_use]
    pub fn apply(&self, raw: [i16; 3], lsb_scale: f32) -> [f32; 3] {
        [
            calibrate_axis(raw[0], lsb_scale, self.offset_x, self.scale_x),
            calibrate_axis(raw[1], lsb_scale, self.offset_y, self.scale_y),
            calibrate_axis(raw[2], lsb_scale, self.offset_z, self.scale_z),
        ]
    }
}

/// One magnetometer measurement
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MagSample {
    /// Time of the measurement in microseconds
    pub timestamp_us: u64,
    /// Transfer errors attributed to this sample
    pub error_count: u32,
    /// X-axis (raw)
    pub x_raw: i16,
    /// Y-axis (raw)
    pub y_raw: i16,
    /// Z-axis (raw)
    pub z_raw: i16,
    /// X-axis field in gauss
    pub x: f32,
    /// Y-axis field in gauss
    pub y: f32,
    /// Z-axis field in gauss
    pub z: f32,
    /// Gauss per LSB at the time of the measurement
    pub scaling: f32,
    /// Full-scale range in gauss at the time of the measurement
    pub range_ga: f32,
}

impl MagSample {
    /// Calculate the magnitude of the magnetic field vector in gauss
    #[must_use]
    pub fn magnitude(&self) -> f32 {
        libm::sqrtf(self.x * self.x + self.y * self.y + self.z * self.z)
    }
}
