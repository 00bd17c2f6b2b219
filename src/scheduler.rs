//! Periodic acquisition triggers
//!
//! The platform supplies a high-resolution timer through [`HrtTimer`]; its
//! interrupt handler calls back into the driver for whichever channel fired.
//! [`Scheduler`] keeps the per-channel interval and translates poll-rate
//! requests into timer operations. An interval of zero means the channel is
//! in manual mode and is only measured on demand. A stopped scheduler keeps
//! its intervals but treats every channel as manual until the next start.

use crate::Channel;

/// Delay before the first triggered measurement after a start, in µs
pub const START_DELAY_US: u32 = 1000;
/// Shortest accelerometer poll interval, in µs
pub const ACCEL_MIN_INTERVAL_US: u32 = 500;
/// Shortest magnetometer poll interval, in µs
pub const MAG_MIN_INTERVAL_US: u32 = 1000;
/// Accelerometer poll rate used for [`PollRate::Max`]
pub const ACCEL_MAX_POLL_HZ: u32 = 1600;
/// Accelerometer poll rate used for [`PollRate::Default`]
pub const ACCEL_DEFAULT_POLL_HZ: u32 = 800;
/// Magnetometer poll rate used for [`PollRate::Max`] and [`PollRate::Default`]
pub const MAG_MAX_POLL_HZ: u32 = 100;

/// Platform timer driving the acquisition routines
///
/// Each channel has one trigger. Implementations call
/// [`Lsm303d::on_timer`](crate::Lsm303d::on_timer) for the channel when it
/// fires.
pub trait HrtTimer {
    /// Monotonic time in microseconds
    fn now_us(&self) -> u64;

    /// Fire after `delay_us`, then every `interval_us`
    fn call_every(&mut self, channel: Channel, delay_us: u32, interval_us: u32);

    /// Push the next firing out to `delay_us` from now, keeping the period
    fn call_delay(&mut self, channel: Channel, delay_us: u32);

    /// Change the period of a running trigger
    fn set_interval(&mut self, channel: Channel, interval_us: u32);

    /// Cancel the trigger; no callback for it may run once this returns
    fn cancel(&mut self, channel: Channel);
}

/// Requested poll rate for one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollRate {
    /// No periodic trigger; measure on read
    Manual,
    /// Fastest rate the channel supports
    Max,
    /// Channel default
    Default,
    /// Explicit rate in Hz
    Hz(u32),
}

impl PollRate {
    /// Resolve to a rate in Hz for `channel`; `None` for [`PollRate::Manual`]
    #[must_use]
    pub const fn hz(self, channel: Channel) -> Option<u32> {
        match (self, channel) {
            (Self::Manual, _) => None,
            (Self::Max, Channel::Accel) => Some(ACCEL_MAX_POLL_HZ),
            (Self::Default, Channel::Accel) => Some(ACCEL_DEFAULT_POLL_HZ),
            (Self::Max | Self::Default, Channel::Mag) => Some(MAG_MAX_POLL_HZ),
            (Self::Hz(hz), _) => Some(hz),
        }
    }
}

/// What a poll-rate change did to the triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reschedule {
    /// Channel switched to manual mode
    Stopped,
    /// Triggers were (re)started; buffers should be flushed
    Started,
    /// Live period of a running trigger was changed
    Retuned,
}

/// Per-channel poll intervals over a platform timer
pub struct Scheduler<T> {
    timer: T,
    accel_interval_us: u32,
    mag_interval_us: u32,
    running: bool,
}

impl<T: HrtTimer> Scheduler<T> {
    /// Both channels start in manual mode
    pub const fn new(timer: T) -> Self {
        Self {
            timer,
            accel_interval_us: 0,
            mag_interval_us: 0,
            running: false,
        }
    }

    /// Arm the trigger of every channel with a non-zero interval
    ///
    /// Any running trigger is cancelled first. The caller flushes the buffers.
    pub fn start(&mut self) {
        self.stop();
        self.running = true;
        if self.accel_interval_us > 0 {
            self.timer
                .call_every(Channel::Accel, START_DELAY_US, self.accel_interval_us);
        }
        if self.mag_interval_us > 0 {
            self.timer
                .call_every(Channel::Mag, START_DELAY_US, self.mag_interval_us);
        }
    }

    /// Cancel both triggers, keeping the intervals for the next start
    pub fn stop(&mut self) {
        self.timer.cancel(Channel::Accel);
        self.timer.cancel(Channel::Mag);
        self.running = false;
    }

    /// Whether the triggers are armed
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Whether `channel` is polled periodically
    #[must_use]
    pub const fn is_active(&self, channel: Channel) -> bool {
        self.running && self.interval(channel) > 0
    }

    /// Configured poll interval of `channel` in µs, zero in manual mode
    #[must_use]
    pub const fn interval(&self, channel: Channel) -> u32 {
        match channel {
            Channel::Accel => self.accel_interval_us,
            Channel::Mag => self.mag_interval_us,
        }
    }

    /// Current poll rate of `channel`; manual while stopped
    #[must_use]
    pub const fn poll_rate(&self, channel: Channel) -> PollRate {
        if !self.is_active(channel) {
            return PollRate::Manual;
        }
        PollRate::Hz(1_000_000 / self.interval(channel))
    }

    /// Interval for polling `channel` at `hz`
    ///
    /// `None` when `hz` is zero or faster than the channel allows.
    #[must_use]
    pub const fn interval_for(channel: Channel, hz: u32) -> Option<u32> {
        if hz == 0 {
            return None;
        }
        let interval = 1_000_000 / hz;
        let min = match channel {
            Channel::Accel => ACCEL_MIN_INTERVAL_US,
            Channel::Mag => MAG_MIN_INTERVAL_US,
        };
        if interval < min { None } else { Some(interval) }
    }

    /// Apply a poll-rate request
    ///
    /// A channel that is not being polled, including every channel of a
    /// stopped scheduler, is (re)started. Returns `None` and changes nothing
    /// when the rate is invalid.
    pub fn set_poll_rate(&mut self, channel: Channel, rate: PollRate) -> Option<Reschedule> {
        let Some(hz) = rate.hz(channel) else {
            self.timer.cancel(channel);
            self.set_interval_us(channel, 0);
            return Some(Reschedule::Stopped);
        };

        let interval = Self::interval_for(channel, hz)?;
        let was_active = self.is_active(channel);
        self.set_interval_us(channel, interval);

        if was_active {
            self.timer.set_interval(channel, interval);
            Some(Reschedule::Retuned)
        } else {
            self.start();
            Some(Reschedule::Started)
        }
    }

    /// Push the next trigger of `channel` out by `delay_us`
    pub fn retry(&mut self, channel: Channel, delay_us: u32) {
        self.timer.call_delay(channel, delay_us);
    }

    /// Monotonic time from the platform timer
    pub fn now_us(&self) -> u64 {
        self.timer.now_us()
    }

    /// Borrow the platform timer
    pub const fn timer(&self) -> &T {
        &self.timer
    }

    /// Consume the scheduler and return the timer
    pub fn release(self) -> T {
        self.timer
    }

    fn set_interval_us(&mut self, channel: Channel, interval: u32) {
        match channel {
            Channel::Accel => self.accel_interval_us = interval,
            Channel::Mag => self.mag_interval_us = interval,
        }
    }
}
