//! Accelerometer sensor types and configuration
//!
//! Provides types, enums, and utility functions for the LSM303D's 3-axis
//! accelerometer.

use super::{Setting, calibrate_axis};
use crate::ONE_G;
use crate::registers::Register;

/// Accelerometer full-scale range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccelRange {
    /// ±2g range (most sensitive, least range)
    G2,
    /// ±4g range
    G4,
    /// ±6g range
    G6,
    /// ±8g range
    G8,
    /// ±16g range (least sensitive, most range)
    G16,
}

impl AccelRange {
    /// Sensitivity in mg per LSB
    #[must_use]
    pub const fn mg_per_lsb(self) -> f32 {
        match self {
            Self::G2 => 0.061,
            Self::G4 => 0.122,
            Self::G6 => 0.183,
            Self::G8 => 0.244,
            Self::G16 => 0.732,
        }
    }

    /// Scale from one LSB to m/s²
    #[must_use]
    pub fn scale_m_s2(self) -> f32 {
        self.mg_per_lsb() * 1e-3 * ONE_G
    }

    /// Full-scale magnitude in m/s²
    #[must_use]
    pub fn range_m_s2(self) -> f32 {
        f32::from(self.g()) * ONE_G
    }

    /// Full-scale magnitude in g
    #[must_use]
    pub const fn g(self) -> u8 {
        match self {
            Self::G2 => 2,
            Self::G4 => 4,
            Self::G6 => 6,
            Self::G8 => 8,
            Self::G16 => 16,
        }
    }
}

impl Setting for AccelRange {
    const ALL: &'static [Self] = &[Self::G2, Self::G4, Self::G6, Self::G8, Self::G16];
    const REGISTER: Register = Register::Ctrl2;
    const MASK: u8 = 0b0011_1000;

    fn value(self) -> u32 {
        u32::from(self.g())
    }

    fn bits(self) -> u8 {
        match self {
            Self::G2 => 0b0000_0000,
            Self::G4 => 0b0000_1000,
            Self::G6 => 0b0001_0000,
            Self::G8 => 0b0001_1000,
            Self::G16 => 0b0010_0000,
        }
    }
}

/// Accelerometer output data rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccelRate {
    /// 100 Hz
    Hz100,
    /// 200 Hz
    Hz200,
    /// 400 Hz
    Hz400,
    /// 800 Hz
    Hz800,
    /// 1600 Hz
    Hz1600,
}

impl AccelRate {
    /// Output data rate in Hz
    #[must_use]
    pub const fn hz(self) -> u32 {
        match self {
            Self::Hz100 => 100,
            Self::Hz200 => 200,
            Self::Hz400 => 400,
            Self::Hz800 => 800,
            Self::Hz1600 => 1600,
        }
    }
}

impl Setting for AccelRate {
    const ALL: &'static [Self] = &[
        Self::Hz100,
        Self::Hz200,
        Self::Hz400,
        Self::Hz800,
        Self::Hz1600,
    ];
    const REGISTER: Register = Register::Ctrl1;
    const MASK: u8 = 0b1111_0000;

    fn value(self) -> u32 {
        self.hz()
    }

    fn bits(self) -> u8 {
        match self {
            Self::Hz100 => 0b0110_0000,
            Self::Hz200 => 0b0111_0000,
            Self::Hz400 => 0b1000_0000,
            Self::Hz800 => 0b1001_0000,
            Self::Hz1600 => 0b1010_0000,
        }
    }
}

/// Accelerometer on-chip anti-alias filter bandwidth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccelAntiAlias {
    /// 50 Hz bandwidth
    Hz50,
    /// 194 Hz bandwidth
    Hz194,
    /// 362 Hz bandwidth
    Hz362,
    /// 773 Hz bandwidth
    Hz773,
}

impl AccelAntiAlias {
    /// Get the bandwidth in Hz
    #[must_use]
    pub const fn bandwidth_hz(self) -> u32 {
        match self {
            Self::Hz50 => 50,
            Self::Hz194 => 194,
            Self::Hz362 => 362,
            Self::Hz773 => 773,
        }
    }
}

impl Setting for AccelAntiAlias {
    const ALL: &'static [Self] = &[Self::Hz50, Self::Hz194, Self::Hz362, Self::Hz773];
    const REGISTER: Register = Register::Ctrl2;
    const MASK: u8 = 0b1100_0000;

    fn value(self) -> u32 {
        self.bandwidth_hz()
    }

    fn bits(self) -> u8 {
        match self {
            Self::Hz773 => 0b0000_0000,
            Self::Hz194 => 0b0100_0000,
            Self::Hz362 => 0b1000_0000,
            Self::Hz50 => 0b1100_0000,
        }
    }
}

/// Accelerometer calibration data
///
/// Offsets are in m/s² and subtracted after scaling the raw value; the
/// per-axis scale multiplies the result.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AccelCalibration {
    /// Offset for X-axis
    pub offset_x: f32,
    /// Scale factor for X-axis
    pub scale_x: f32,
    /// Offset for Y-axis
    pub offset_y: f32,
    /// Scale factor for Y-axis
    pub scale_y: f32,
    /// Offset for Z-axis
    pub offset_z: f32,
    /// Scale factor for Z-axis
    pub scale_z: f32,
}

impl Default for AccelCalibration {
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

impl AccelCalibration {
    /// Whether the scale factors are close enough to unity to be accepted
    ///
    /// The three scales must sum to a value strictly between 2.0 and 4.0.
    #[must_use]
    pub fn is_plausible(&self) -> bool {
        let sum = self.scale_x + self.scale_y + self.scale_z;
        sum > 2.0 && sum < 4.0
    }

    /// Convert raw axes to calibrated m/s² using `lsb_scale` (m/s² per LSB)
    #[must_use]
    pub fn apply(&self, raw: [i16; 3], lsb_scale: f32) -> [f32; 3] {
        [
            calibrate_axis(raw[0], lsb_scale, self.offset_x, self.scale_x),
            calibrate_axis(raw[1], lsb_scale, self.offset_y, self.scale_y),
            calibrate_axis(raw[2], lsb_scale, self.offset_z, self.scale_z),
        ]
    }
}

/// One accelerometer measurement
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AccelSample {
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
    /// X-axis acceleration in m/s², calibrated and filtered
    pub x: f32,
    /// Y-axis acceleration in m/s², calibrated and filtered
    pub y: f32,
    /// Z-axis acceleration in m/s², calibrated and filtered
    pub z: f32,
    /// m/s² per LSB at the time of the measurement
    pub scaling: f32,
    /// Full-scale range in m/s² at the time of the measurement
    pub range_m_s2: f32,
}

impl AccelSample {
    /// Get the magnitude of the acceleration vector
    #[must_use]
    pub fn magnitude(&self) -> f32 {
        libm::sqrtf(self.x * self.x + self.y * self.y + self.z * self.z)
    }
}
