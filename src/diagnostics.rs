//! Extreme-value watchdog and diagnostic logging policy
//!
//! Every accelerometer sample is checked against [`EXTREME_THRESHOLD_M_S2`].
//! A sample beyond it on all three axes usually means the sensor has
//! browned out into a bogus state, so the monitor forces diagnostic logging
//! on and counts it. While logging is enabled each sample produces a
//! [`DiagnosticRecord`] for the sink, annotated by [`LogCadence`] with what
//! the sink should write this time.

use device_driver::RegisterInterface;

use crate::config::ExpectedConfig;
use crate::registers::{DIAGNOSTIC_REGISTERS, Register, Registers};
use crate::sensors::AccelSample;

/// Acceleration magnitude (m/s²) every axis must exceed to count as extreme
pub const EXTREME_THRESHOLD_M_S2: f32 = 30.0;

const SAMPLE_LOG_INTERVAL_US: u64 = 1_000_000;
const EXTREME_REGISTER_LOG_INTERVAL_US: u64 = 250_000;
const REGISTER_LOG_INTERVAL_US: u64 = 10_000_000;
const SYNC_INTERVAL_US: u64 = 10_000_000;
const ALARM_INTERVAL_US: u64 = 10_000_000;

/// Whether all three axes of `sample` exceed the extreme threshold
#[must_use]
pub fn is_extreme(sample: &AccelSample) -> bool {
    [sample.x, sample.y, sample.z]
        .iter()
        .all(|axis| libm::fabsf(*axis) > EXTREME_THRESHOLD_M_S2)
}

/// Tone the sink should sound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmTone {
    /// Extreme values were seen earlier but the current sample is sane
    Recovered,
    /// Extreme now, after at least one sane sample since boot
    Extreme,
    /// Extreme now, and no sane sample since boot
    ExtremeSinceBoot,
}

impl AlarmTone {
    /// Tone number understood by the tone alarm
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Recovered => 3,
            Self::Extreme => 4,
            Self::ExtremeSinceBoot => 5,
        }
    }
}

/// What the sink should write for one diagnostic record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LogActions {
    /// Write a sample line
    pub log_sample: bool,
    /// Write the register dump attached to the record
    pub log_registers: bool,
    /// Flush the log to storage
    pub sync: bool,
    /// Sound the alarm
    pub alarm: Option<AlarmTone>,
}

/// Rate limiter for diagnostic log output
///
/// Sample lines at 1 Hz; register dumps every 250 ms while extreme and every
/// 10 s otherwise; a sync every 10 s; an alarm every 10 s once any extreme
/// value has been seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LogCadence {
    last_sample_us: u64,
    last_registers_us: u64,
    last_sync_us: u64,
    last_alarm_us: u64,
}

impl LogCadence {
    /// Decide the actions for a record at `now_us` and advance the timers
    pub fn step(
        &mut self,
        now_us: u64,
        extreme: bool,
        boot_ok: bool,
        extreme_count: u32,
    ) -> LogActions {
        let mut actions = LogActions::default();

        if self.last_sample_us == 0
            || now_us.saturating_sub(self.last_sample_us) > SAMPLE_LOG_INTERVAL_US
        {
            self.last_sample_us = now_us;
            actions.log_sample = true;
        }

        let since_registers = now_us.saturating_sub(self.last_registers_us);
        if self.last_registers_us == 0
            || (extreme && since_registers > EXTREME_REGISTER_LOG_INTERVAL_US)
            || since_registers > REGISTER_LOG_INTERVAL_US
        {
            self.last_registers_us = now_us;
            actions.log_registers = true;
        }

        if now_us.saturating_sub(self.last_sync_us) > SYNC_INTERVAL_US {
            self.last_sync_us = now_us;
            actions.sync = true;
        }

        if extreme_count != 0 && now_us.saturating_sub(self.last_alarm_us) > ALARM_INTERVAL_US {
            self.last_alarm_us = now_us;
            actions.alarm = Some(if !extreme {
                AlarmTone::Recovered
            } else if boot_ok {
                AlarmTone::Extreme
            } else {
                AlarmTone::ExtremeSinceBoot
            });
        }

        actions
    }
}

/// Snapshot of the diagnostic register list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterDump {
    /// Time of the snapshot in microseconds
    pub timestamp_us: u64,
    /// Register and the value read from it, in dump order
    pub entries: [(Register, u8); DIAGNOSTIC_REGISTERS.len()],
    /// CTRL1 value the driver expects
    pub expected_ctrl1: u8,
    /// CTRL7 value the driver expects
    pub expected_ctrl7: u8,
}

impl RegisterDump {
    /// Read every diagnostic register
    ///
    /// # Errors
    ///
    /// Returns the transport error of the first failed read.
    pub fn capture<I>(
        registers: &mut Registers<I>,
        expected: &ExpectedConfig,
        timestamp_us: u64,
    ) -> Result<Self, I::Error>
    where
        I: RegisterInterface<AddressType = u8>,
    {
        let mut entries = DIAGNOSTIC_REGISTERS.map(|register| (register, 0));
        for (register, value) in &mut entries {
            *value = registers.read(*register)?;
        }
        Ok(Self {
            timestamp_us,
            entries,
            expected_ctrl1: expected.ctrl1,
            expected_ctrl7: expected.ctrl7,
        })
    }

    /// Value captured for `register`, if it is on the list
    #[must_use]
    pub fn get(&self, register: Register) -> Option<u8> {
        self.entries
            .iter()
            .find(|(r, _)| *r == register)
            .map(|(_, value)| *value)
    }

    /// Whether CTRL1 or CTRL7 differed from the expected configuration
    #[must_use]
    pub fn has_mismatch(&self) -> bool {
        self.get(Register::Ctrl1) != Some(self.expected_ctrl1)
            || self.get(Register::Ctrl7) != Some(self.expected_ctrl7)
    }
}

/// Everything the sink receives for one logged accelerometer sample
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DiagnosticRecord {
    /// The sample
    pub sample: AccelSample,
    /// Whether the sample was extreme
    pub extreme: bool,
    /// Whether a sane sample has been seen since boot
    pub boot_ok: bool,
    /// Extreme samples seen so far
    pub extreme_count: u32,
    /// What to write for this record
    pub actions: LogActions,
    /// Register snapshot, present when `actions.log_registers` is set and
    /// the registers could be read
    pub registers: Option<RegisterDump>,
}

/// Watches accelerometer samples for extreme values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExtremeMonitor {
    logging_enabled: bool,
    boot_ok: bool,
    extreme_count: u32,
    cadence: LogCadence,
}

impl ExtremeMonitor {
    /// Logging disabled, nothing seen yet
    #[must_use]
    pub const fn new() -> Self {
        Self {
            logging_enabled: false,
            boot_ok: false,
            extreme_count: 0,
            cadence: LogCadence {
                last_sample_us: 0,
                last_registers_us: 0,
                last_sync_us: 0,
                last_alarm_us: 0,
            },
        }
    }

    /// Check one sample
    ///
    /// Returns a record without registers when logging is enabled, which an
    /// extreme sample forces.
    pub fn observe(&mut self, sample: &AccelSample, now_us: u64) -> Option<DiagnosticRecord> {
        let extreme = is_extreme(sample);
        if extreme {
            self.extreme_count = self.extreme_count.saturating_add(1);
            self.logging_enabled = true;
        } else {
            self.boot_ok = true;
        }

        if !self.logging_enabled {
            return None;
        }

        let actions = self
            .cadence
            .step(now_us, extreme, self.boot_ok, self.extreme_count);
        Some(DiagnosticRecord {
            sample: *sample,
            extreme,
            boot_ok: self.boot_ok,
            extreme_count: self.extreme_count,
            actions,
            registers: None,
        })
    }

    /// Flip diagnostic logging, returning the new state
    pub fn toggle(&mut self) -> bool {
        self.logging_enabled = !self.logging_enabled;
        self.logging_enabled
    }

    /// Whether diagnostic records are being produced
    #[must_use]
    pub const fn logging_enabled(&self) -> bool {
        self.logging_enabled
    }

    /// Whether a sane sample has been seen
    #[must_use]
    pub const fn boot_ok(&self) -> bool {
        self.boot_ok
    }

    /// Extreme samples seen so far
    #[must_use]
    pub const fn extreme_count(&self) -> u32 {
        self.extreme_count
    }
}
