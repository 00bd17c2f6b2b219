//! Channel configuration state
//!
//! Turns engineering-unit requests into [`RegisterUpdate`]s and keeps the
//! settings that a re-initialization reapplies. Nothing here touches the bus;
//! the driver writes each returned update through immediately.

use crate::registers::{CTRL1_DEFAULT_ENABLE, CTRL7_MAG_CONTINUOUS, Register};
use crate::sensors::{
    AccelAntiAlias, AccelCalibration, AccelRange, AccelRate, MagCalibration, MagRange, MagRate,
    Setting,
};

/// Default accelerometer range in g
pub const ACCEL_DEFAULT_RANGE_G: u32 = 8;
/// Default accelerometer output data rate in Hz
pub const ACCEL_DEFAULT_RATE_HZ: u32 = 800;
/// Default on-chip anti-alias bandwidth in Hz
pub const ACCEL_DEFAULT_ONCHIP_FILTER_HZ: u32 = 50;
/// Default driver-side low-pass cutoff in Hz
pub const ACCEL_DEFAULT_DRIVER_FILTER_HZ: f32 = 30.0;
/// Default magnetometer range in gauss
pub const MAG_DEFAULT_RANGE_GA: u32 = 2;
/// Default magnetometer output data rate in Hz
pub const MAG_DEFAULT_RATE_HZ: u32 = 100;

/// A read-modify-write of one control register field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterUpdate {
    /// Register to modify
    pub register: Register,
    /// Bits cleared first
    pub clear: u8,
    /// Bits set afterwards
    pub set: u8,
}

impl RegisterUpdate {
    /// The update that programs `setting` into its field
    #[must_use]
    pub fn of<S: Setting>(setting: S) -> Self {
        Self {
            register: S::REGISTER,
            clear: S::MASK,
            set: setting.bits(),
        }
    }

    /// Apply the update to a register value
    #[must_use]
    pub const fn apply(&self, value: u8) -> u8 {
        (value & !self.clear) | self.set
    }
}

/// Register values the health check expects to read back
///
/// CTRL1 carries the accelerometer enable and rate bits, CTRL7 the
/// magnetometer mode. A brownout resets both to power-on defaults, which is
/// how the driver notices it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExpectedConfig {
    /// Expected CTRL1 value
    pub ctrl1: u8,
    /// Expected CTRL7 value
    pub ctrl7: u8,
}

impl Default for ExpectedConfig {
    fn default() -> Self {
        Self {
            ctrl1: CTRL1_DEFAULT_ENABLE,
            ctrl7: CTRL7_MAG_CONTINUOUS,
        }
    }
}

impl ExpectedConfig {
    /// Track an update written to one of the watched registers
    pub fn track(&mut self, update: &RegisterUpdate) {
        match update.register {
            Register::Ctrl1 => self.ctrl1 = update.apply(self.ctrl1),
            Register::Ctrl7 => self.ctrl7 = update.apply(self.ctrl7),
            _ => {}
        }
    }
}

/// Accelerometer settings
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AccelConfig {
    /// Full-scale range
    pub range: AccelRange,
    /// Output data rate
    pub rate: AccelRate,
    /// On-chip anti-alias bandwidth
    pub anti_alias: AccelAntiAlias,
    /// Per-axis offset and scale
    pub calibration: AccelCalibration,
}

impl Default for AccelConfig {
    fn default() -> Self {
        Self {
            range: AccelRange::G8,
            rate: AccelRate::Hz800,
            anti_alias: AccelAntiAlias::Hz50,
            calibration: AccelCalibration::default(),
        }
    }
}

impl AccelConfig {
    /// Select the range covering `max_g` (0 selects the largest)
    ///
    /// Returns `None` and leaves the configuration untouched when `max_g`
    /// exceeds 16 g.
    pub fn set_range(&mut self, max_g: u32) -> Option<RegisterUpdate> {
        let range = AccelRange::select(max_g)?;
        self.range = range;
        Some(RegisterUpdate::of(range))
    }

    /// Select the output data rate covering `hz` (0 selects the fastest)
    pub fn set_rate(&mut self, hz: u32) -> Option<RegisterUpdate> {
        let rate = AccelRate::select(hz)?;
        self.rate = rate;
        Some(RegisterUpdate::of(rate))
    }

    /// Select the anti-alias bandwidth covering `hz` (0 selects the widest)
    pub fn set_anti_alias(&mut self, hz: u32) -> Option<RegisterUpdate> {
        let bandwidth = AccelAntiAlias::select(hz)?;
        self.anti_alias = bandwidth;
        Some(RegisterUpdate::of(bandwidth))
    }

    /// Replace the calibration if its scales are plausible
    ///
    /// Returns `false` and keeps the previous calibration otherwise.
    pub fn set_calibration(&mut self, calibration: AccelCalibration) -> bool {
        if !calibration.is_plausible() {
            return false;
        }
        self.calibration = calibration;
        true
    }

    /// Every register update needed to program the current settings
    #[must_use]
    pub fn updates(&self) -> [RegisterUpdate; 3] {
        [
            RegisterUpdate::of(self.range),
            RegisterUpdate::of(self.rate),
            RegisterUpdate::of(self.anti_alias),
        ]
    }

    /// m/s² per LSB for the active range
    #[must_use]
    pub fn range_scale(&self) -> f32 {
        self.range.scale_m_s2()
    }
}

/// Magnetometer settings
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MagConfig {
    /// Full-scale range
    pub range: MagRange,
    /// Output data rate
    pub rate: MagRate,
    /// Per-axis offset and scale
    pub calibration: MagCalibration,
}

impl Default for MagConfig {
    fn default() -> Self {
        Self {
            range: MagRange::Ga2,
            rate: MagRate::Hz100,
            calibration: MagCalibration::default(),
        }
    }
}

impl MagConfig {
    /// Select the range covering `max_ga` (0 selects the largest)
    pub fn set_range(&mut self, max_ga: u32) -> Option<RegisterUpdate> {
        let range = MagRange::select(max_ga)?;
        self.range = range;
        Some(RegisterUpdate::of(range))
    }

    /// Select the output data rate covering `hz` (0 selects the fastest)
    pub fn set_rate(&mut self, hz: u32) -> Option<RegisterUpdate> {
        let rate = MagRate::select(hz)?;
        self.rate = rate;
        Some(RegisterUpdate::of(rate))
    }

    /// Every register update needed to program the current settings
    #[must_use]
    pub fn updates(&self) -> [RegisterUpdate; 2] {
        [RegisterUpdate::of(self.range), RegisterUpdate::of(self.rate)]
    }

    /// Gauss per LSB for the active range
    #[must_use]
    pub fn range_scale(&self) -> f32 {
        self.range.scale_ga()
    }
}
