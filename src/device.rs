//! High-level driver API for the LSM303D
//!
//! This module ties the register layer, the per-channel configuration, the
//! sample queues and the acquisition scheduler together. The platform timer
//! calls [`Lsm303d::on_timer`] from interrupt context; consumers call the
//! `read_*` methods and the command surface from task context.
//!
//! # Example
//!
//! ```ignore
//! let mut imu = Lsm303d::new(SpiInterface::new(spi), drdy_pin, timer, ())?;
//! imu.init()?;
//! imu.set_poll_rate(Channel::Accel, PollRate::Default)?;
//!
//! // in the timer interrupt
//! imu.on_timer(Channel::Accel)?;
//!
//! // in task context
//! let mut samples = [AccelSample::default(); 4];
//! let count = imu.read_accel(&mut samples)?;
//! ```

use device_driver::RegisterInterface;
use embedded_hal::digital::InputPin;

use crate::buffer::SampleQueue;
use crate::config::{
    ACCEL_DEFAULT_DRIVER_FILTER_HZ, AccelConfig, ExpectedConfig, MagConfig, RegisterUpdate,
};
use crate::diagnostics::{ExtremeMonitor, RegisterDump};
use crate::filter::AxisFilter;
use crate::registers::{
    CTRL1_DEFAULT_ENABLE, CTRL3_DRDY_ACCEL_INT1, CTRL4_DRDY_MAG_INT2, CTRL5_MAG_RES_HIGH,
    CTRL7_MAG_CONTINUOUS, Register, Registers,
};
use crate::scheduler::{HrtTimer, PollRate, Reschedule, Scheduler};
use crate::sensors::{AccelCalibration, AccelSample, MagCalibration, MagSample, RawBurst};
use crate::sink::SampleSink;
use crate::{Channel, Error, WHO_AM_I_VALUE};

/// Delay before retrying an accelerometer measurement whose data was not ready
const ACCEL_RETRY_DELAY_US: u32 = 100;

/// Offsets below this magnitude count as "never calibrated"
const SELF_TEST_EPSILON: f32 = 1e-6;

/// Largest accepted deviation of a calibration scale from unity
const SELF_TEST_MAX_SCALE_DEVIATION: f32 = 0.4;

/// Outcome of one acquisition routine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Measurement {
    /// A sample was queued
    Sampled,
    /// Data-ready was low; the trigger was pushed out by a short delay
    NotReady,
    /// The health check found a reset device and re-initialized it
    Recovered,
    /// The channel is in manual mode, nothing was done
    Inactive,
}

/// Driver counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Stats {
    /// Accelerometer samples produced since the last re-initialization
    pub accel_reads: u32,
    /// Magnetometer samples produced since the last re-initialization
    pub mag_reads: u32,
    /// Re-initializations triggered by an unexpected CTRL1
    pub ctrl1_resets: u32,
    /// Re-initializations triggered by an unexpected CTRL7
    pub ctrl7_resets: u32,
    /// Accelerometer cycles deferred because data was not ready
    pub accel_reschedules: u32,
    /// Accelerometer samples beyond the extreme threshold
    pub extreme_values: u32,
}

struct AccelChannel {
    config: AccelConfig,
    filter: AxisFilter,
    queue: SampleQueue<AccelSample>,
    publish: bool,
}

struct MagChannel {
    config: MagConfig,
    queue: SampleQueue<MagSample>,
    publish: bool,
}

/// Main driver for the LSM303D
///
/// * `I` - register transport, usually [`SpiInterface`](crate::SpiInterface)
/// * `D` - accelerometer data-ready input
/// * `T` - platform timer
/// * `S` - receiver for notifications, published samples and diagnostics
pub struct Lsm303d<I, D, T, S = ()> {
    regs: Registers<I>,
    drdy: D,
    scheduler: Scheduler<T>,
    sink: S,
    accel: AccelChannel,
    mag: MagChannel,
    expected: ExpectedConfig,
    stats: Stats,
    monitor: ExtremeMonitor,
}

impl<I, D, T, S> Lsm303d<I, D, T, S>
where
    I: RegisterInterface<AddressType = u8>,
    D: InputPin,
    T: HrtTimer,
    S: SampleSink,
{
    /// Create a new LSM303D driver instance
    ///
    /// This will verify the `WHO_AM_I` register but will not configure the
    /// device. Call [`init`](Self::init) after construction.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Communication with the device fails
    /// - The `WHO_AM_I` register contains an unexpected value
    pub fn new(interface: I, drdy: D, timer: T, sink: S) -> Result<Self, Error<I::Error>> {
        let config = AccelConfig::default();
        let mut driver = Self {
            regs: Registers::new(interface),
            drdy,
            scheduler: Scheduler::new(timer),
            sink,
            accel: AccelChannel {
                config,
                filter: AxisFilter::new(config.rate.hz() as f32, ACCEL_DEFAULT_DRIVER_FILTER_HZ),
                queue: SampleQueue::new(),
                publish: true,
            },
            mag: MagChannel {
                config: MagConfig::default(),
                queue: SampleQueue::new(),
                publish: true,
            },
            expected: ExpectedConfig::default(),
            stats: Stats::default(),
            monitor: ExtremeMonitor::new(),
        };

        // The first transfer after power-up can be garbage; discard it
        driver.regs.read(Register::WhoAmI)?;
        let who_am_i = driver.read_who_am_i()?;
        if who_am_i != WHO_AM_I_VALUE {
            return Err(Error::InvalidDevice(who_am_i));
        }

        Ok(driver)
    }

    /// Configure the device and take a first accelerometer measurement
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn init(&mut self) -> Result<(), Error<I::Error>> {
        self.reset()?;
        self.measure_accel()?;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "LSM303D initialized: accel {}g @ {}Hz, mag {}Ga @ {}Hz",
            self.accel.config.range.g(),
            self.accel.config.rate.hz(),
            self.mag.config.range.ga(),
            self.mag.config.rate.hz()
        );

        Ok(())
    }

    /// Read the `WHO_AM_I` register
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn read_who_am_i(&mut self) -> Result<u8, Error<I::Error>> {
        Ok(self.regs.read(Register::WhoAmI)?)
    }

    /// Re-initialize the device with the current configuration
    ///
    /// Disables the I2C interface, enables both channels, routes data-ready
    /// to INT1/INT2 and reapplies every configured range, rate and filter.
    /// Calibration is left untouched; the read counters restart from zero.
    /// Safe to call at any time, including from the health check.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn reset(&mut self) -> Result<(), Error<I::Error>> {
        self.disable_i2c()?;

        let ctrl1 = CTRL1_DEFAULT_ENABLE | RegisterUpdate::of(self.accel.config.rate).set;
        self.regs.write(Register::Ctrl1, ctrl1)?;
        self.expected.ctrl1 = ctrl1;

        self.regs.write(Register::Ctrl7, CTRL7_MAG_CONTINUOUS)?;
        self.expected.ctrl7 = CTRL7_MAG_CONTINUOUS;

        self.regs.write(Register::Ctrl5, CTRL5_MAG_RES_HIGH)?;
        self.regs.write(Register::Ctrl3, CTRL3_DRDY_ACCEL_INT1)?;
        self.regs.write(Register::Ctrl4, CTRL4_DRDY_MAG_INT2)?;

        for update in self.accel.config.updates() {
            self.apply(update)?;
        }
        let sample_freq = self.accel.filter.sample_freq();
        let cutoff = self.accel.filter.cutoff_freq();
        self.accel.filter.set_cutoff_frequency(sample_freq, cutoff);

        for update in self.mag.config.updates() {
            self.apply(update)?;
        }

        self.stats.accel_reads = 0;
        self.stats.mag_reads = 0;
        Ok(())
    }

    /// Keep the chip from interpreting SPI traffic on the shared bus as I2C
    ///
    /// Uses the undocumented interface registers at 0x02 and 0x15.
    fn disable_i2c(&mut self) -> Result<(), Error<I::Error>> {
        self.regs.modify(Register::I2cControl1, 0x00, 0x10)?;
        self.regs.modify(Register::I2cControl1, 0x08, 0x00)?;
        self.regs.modify(Register::I2cControl2, 0x00, 0x80)?;
        self.regs.modify(Register::I2cControl1, 0x18, 0x00)?;
        Ok(())
    }

    fn apply(&mut self, update: RegisterUpdate) -> Result<(), Error<I::Error>> {
        self.regs.modify(update.register, update.clear, update.set)?;
        self.expected.track(&update);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Acquisition
    // ---------------------------------------------------------------------

    /// Timer callback for `channel`
    ///
    /// Does nothing when the channel is in manual mode.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn on_timer(&mut self, channel: Channel) -> Result<Measurement, Error<I::Error>> {
        if !self.scheduler.is_active(channel) {
            return Ok(Measurement::Inactive);
        }
        match channel {
            Channel::Accel => self.measure_accel(),
            Channel::Mag => self.measure_mag(),
        }
    }

    /// Timer callback for the accelerometer
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn on_accel_timer(&mut self) -> Result<Measurement, Error<I::Error>> {
        self.on_timer(Channel::Accel)
    }

    /// Timer callback for the magnetometer
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn on_mag_timer(&mut self) -> Result<Measurement, Error<I::Error>> {
        self.on_timer(Channel::Mag)
    }

    /// Take one accelerometer measurement
    ///
    /// 1. Data-ready low: count a reschedule, push the trigger out by 100 µs.
    /// 2. CTRL1 differs from the expected value: count it and re-initialize.
    /// 3. Otherwise read, convert, filter and queue the sample.
    ///
    /// A failed data-ready read counts as not ready.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn measure_accel(&mut self) -> Result<Measurement, Error<I::Error>> {
        if !self.drdy.is_high().unwrap_or(false) {
            self.stats.accel_reschedules = self.stats.accel_reschedules.wrapping_add(1);
            if self.scheduler.is_active(Channel::Accel) {
                self.scheduler.retry(Channel::Accel, ACCEL_RETRY_DELAY_US);
            }

            #[cfg(feature = "defmt")]
            defmt::trace!("Accel data not ready, retrying in {}us", ACCEL_RETRY_DELAY_US);

            return Ok(Measurement::NotReady);
        }

        let ctrl1 = self.regs.read(Register::Ctrl1)?;
        if ctrl1 != self.expected.ctrl1 {
            self.stats.ctrl1_resets = self.stats.ctrl1_resets.wrapping_add(1);

            #[cfg(feature = "defmt")]
            defmt::warn!(
                "CTRL1 reads {=u8:#x}, expected {=u8:#x}; re-initializing",
                ctrl1,
                self.expected.ctrl1
            );

            self.reset()?;
            return Ok(Measurement::Recovered);
        }

        let mut bytes = [0u8; RawBurst::LEN];
        self.regs.read_burst(Register::StatusA, &mut bytes)?;
        let raw = RawBurst::from_bytes(bytes);

        let scaling = self.accel.config.range_scale();
        let calibrated = self
            .accel
            .config
            .calibration
            .apply([raw.x, raw.y, raw.z], scaling);
        let [x, y, z] = self.accel.filter.apply(calibrated);

        let sample = AccelSample {
            timestamp_us: self.scheduler.now_us(),
            error_count: 0,
            x_raw: raw.x,
            y_raw: raw.y,
            z_raw: raw.z,
            x,
            y,
            z,
            scaling,
            range_m_s2: self.accel.config.range.range_m_s2(),
        };

        self.accel.queue.push(sample);
        self.stats.accel_reads = self.stats.accel_reads.wrapping_add(1);
        self.sink.notify(Channel::Accel);
        if self.accel.publish {
            self.sink.publish_accel(&sample);
        }
        self.watch(&sample);

        Ok(Measurement::Sampled)
    }

    /// Take one magnetometer measurement
    ///
    /// The magnetometer has no data-ready line wired; only the CTRL7 health
    /// check precedes the read. No low-pass filter is applied.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn measure_mag(&mut self) -> Result<Measurement, Error<I::Error>> {
        let ctrl7 = self.regs.read(Register::Ctrl7)?;
        if ctrl7 != self.expected.ctrl7 {
            self.stats.ctrl7_resets = self.stats.ctrl7_resets.wrapping_add(1);

            #[cfg(feature = "defmt")]
            defmt::warn!(
                "CTRL7 reads {=u8:#x}, expected {=u8:#x}; re-initializing",
                ctrl7,
                self.expected.ctrl7
            );

            self.reset()?;
            return Ok(Measurement::Recovered);
        }

        let mut bytes = [0u8; RawBurst::LEN];
        self.regs.read_burst(Register::StatusM, &mut bytes)?;
        let raw = RawBurst::from_bytes(bytes);

        let scaling = self.mag.config.range_scale();
        let [x, y, z] = self
            .mag
            .config
            .calibration
            .apply([raw.x, raw.y, raw.z], scaling);

        let sample = MagSample {
            timestamp_us: self.scheduler.now_us(),
            error_count: 0,
            x_raw: raw.x,
            y_raw: raw.y,
            z_raw: raw.z,
            x,
            y,
            z,
            scaling,
            range_ga: f32::from(self.mag.config.range.ga()),
        };

        self.mag.queue.push(sample);
        self.stats.mag_reads = self.stats.mag_reads.wrapping_add(1);
        self.sink.notify(Channel::Mag);
        if self.mag.publish {
            self.sink.publish_mag(&sample);
        }

        Ok(Measurement::Sampled)
    }

    fn watch(&mut self, sample: &AccelSample) {
        let Some(mut record) = self.monitor.observe(sample, sample.timestamp_us) else {
            return;
        };
        self.stats.extreme_values = self.monitor.extreme_count();

        #[cfg(feature = "defmt")]
        if record.extreme {
            defmt::warn!(
                "Extreme accel value ({}, {}, {}) |a|={} m/s^2, count {}",
                sample.x,
                sample.y,
                sample.z,
                sample.magnitude(),
                record.extreme_count
            );
        }

        if record.actions.log_registers {
            record.registers =
                RegisterDump::capture(&mut self.regs, &self.expected, sample.timestamp_us).ok();
        }
        self.sink.diagnostic(&record);
    }

    // ---------------------------------------------------------------------
    // Readers
    // ---------------------------------------------------------------------

    /// Read accelerometer samples into `buffer`, returning how many were written
    ///
    /// With automatic polling, drains up to `buffer.len()` queued samples.
    /// In manual mode, discards anything still queued, takes one measurement
    /// and returns it; `Ok(0)` when the data was not ready or the health
    /// check re-initialized the device instead.
    ///
    /// # Errors
    ///
    /// - [`Error::BufferTooSmall`] if `buffer` is empty
    /// - [`Error::WouldBlock`] if polling is active and nothing is queued
    /// - [`Error::Bus`] if a manual measurement fails
    pub fn read_accel(&mut self, buffer: &mut [AccelSample]) -> Result<usize, Error<I::Error>> {
        if buffer.is_empty() {
            return Err(Error::BufferTooSmall);
        }

        if self.scheduler.is_active(Channel::Accel) {
            return drain(&self.accel.queue, buffer);
        }

        self.accel.queue.flush();
        let measurement = self.measure_accel()?;
        Ok(take_one(measurement, &self.accel.queue, buffer))
    }

    /// Read magnetometer samples into `buffer`, returning how many were written
    ///
    /// Same as [`read_accel`](Self::read_accel).
    ///
    /// # Errors
    ///
    /// - [`Error::BufferTooSmall`] if `buffer` is empty
    /// - [`Error::WouldBlock`] if polling is active and nothing is queued
    /// - [`Error::Bus`] if a manual measurement fails
    pub fn read_mag(&mut self, buffer: &mut [MagSample]) -> Result<usize, Error<I::Error>> {
        if buffer.is_empty() {
            return Err(Error::BufferTooSmall);
        }

        if self.scheduler.is_active(Channel::Mag) {
            return drain(&self.mag.queue, buffer);
        }

        self.mag.queue.flush();
        let measurement = self.measure_mag()?;
        Ok(take_one(measurement, &self.mag.queue, buffer))
    }

    /// Accelerometer sample queue
    pub const fn accel_queue(&self) -> &SampleQueue<AccelSample> {
        &self.accel.queue
    }

    /// Magnetometer sample queue
    pub const fn mag_queue(&self) -> &SampleQueue<MagSample> {
        &self.mag.queue
    }

    // ---------------------------------------------------------------------
    // Polling and queues
    // ---------------------------------------------------------------------

    /// Start periodic acquisition on every channel with a poll rate
    ///
    /// Flushes both queues.
    pub fn start(&mut self) {
        self.accel.queue.flush();
        self.mag.queue.flush();
        self.scheduler.start();

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "Polling started: accel {}us, mag {}us",
            self.scheduler.interval(Channel::Accel),
            self.scheduler.interval(Channel::Mag)
        );
    }

    /// Cancel both triggers
    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    /// Set the poll rate of `channel`
    ///
    /// [`PollRate::Manual`] stops the channel's trigger. A rate on a stopped
    /// channel starts polling (flushing both queues); on a running channel it
    /// changes the live period. For the accelerometer the driver low-pass
    /// filter is re-derived for the new rate, keeping its cutoff.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for a zero rate or one faster than
    /// the channel allows (2000 Hz accel, 1000 Hz mag).
    pub fn set_poll_rate(
        &mut self,
        channel: Channel,
        rate: PollRate,
    ) -> Result<(), Error<I::Error>> {
        let outcome = self
            .scheduler
            .set_poll_rate(channel, rate)
            .ok_or(Error::InvalidConfig)?;

        if outcome == Reschedule::Started {
            self.accel.queue.flush();
            self.mag.queue.flush();
        }

        if channel == Channel::Accel && outcome != Reschedule::Stopped {
            let interval = self.scheduler.interval(Channel::Accel);
            let sample_freq = 1.0e6 / interval as f32;
            let cutoff = self.accel.filter.cutoff_freq();
            self.accel.filter.set_cutoff_frequency(sample_freq, cutoff);
        }

        Ok(())
    }

    /// Current poll rate of `channel`
    pub const fn poll_rate(&self, channel: Channel) -> PollRate {
        self.scheduler.poll_rate(channel)
    }

    /// Set the sample queue depth of `channel`
    ///
    /// Shrinking keeps the newest samples.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] unless `1 <= depth <= 100`.
    pub fn set_queue_depth(
        &mut self,
        channel: Channel,
        depth: usize,
    ) -> Result<(), Error<I::Error>> {
        let resized = match channel {
            Channel::Accel => self.accel.queue.resize(depth),
            Channel::Mag => self.mag.queue.resize(depth),
        };
        resized.map_err(|_| Error::InvalidConfig)
    }

    /// Sample queue depth of `channel`
    pub fn queue_depth(&self, channel: Channel) -> usize {
        match channel {
            Channel::Accel => self.accel.queue.capacity(),
            Channel::Mag => self.mag.queue.capacity(),
        }
    }

    /// Enable or disable publishing of `channel` samples to the sink
    pub fn set_publish(&mut self, channel: Channel, enable: bool) {
        match channel {
            Channel::Accel => self.accel.publish = enable,
            Channel::Mag => self.mag.publish = enable,
        }
    }

    // ---------------------------------------------------------------------
    // Accelerometer configuration
    // ---------------------------------------------------------------------

    /// Set the accelerometer range to the smallest covering `max_g` (0 for 16 g)
    ///
    /// # Errors
    ///
    /// - [`Error::OutOfRange`] if `max_g` exceeds 16
    /// - [`Error::Bus`] if communication with the device fails
    pub fn set_accel_range(&mut self, max_g: u32) -> Result<(), Error<I::Error>> {
        let update = self.accel.config.set_range(max_g).ok_or(Error::OutOfRange)?;
        self.apply(update)
    }

    /// Accelerometer range in g
    pub const fn accel_range_g(&self) -> u32 {
        self.accel.config.range.g() as u32
    }

    /// Set the accelerometer output data rate to the smallest covering `hz`
    /// (0 for 1600 Hz)
    ///
    /// # Errors
    ///
    /// - [`Error::OutOfRange`] if `hz` exceeds 1600
    /// - [`Error::Bus`] if communication with the device fails
    pub fn set_accel_sample_rate(&mut self, hz: u32) -> Result<(), Error<I::Error>> {
        let update = self.accel.config.set_rate(hz).ok_or(Error::OutOfRange)?;
        self.apply(update)
    }

    /// Accelerometer output data rate in Hz
    pub const fn accel_sample_rate(&self) -> u32 {
        self.accel.config.rate.hz()
    }

    /// Set the on-chip anti-alias bandwidth to the smallest covering `hz`
    /// (0 for 773 Hz)
    ///
    /// # Errors
    ///
    /// - [`Error::OutOfRange`] if `hz` exceeds 773
    /// - [`Error::Bus`] if communication with the device fails
    pub fn set_accel_onchip_filter_bandwidth(&mut self, hz: u32) -> Result<(), Error<I::Error>> {
        let update = self
            .accel
            .config
            .set_anti_alias(hz)
            .ok_or(Error::OutOfRange)?;
        self.apply(update)
    }

    /// On-chip anti-alias bandwidth in Hz
    pub const fn accel_onchip_filter_bandwidth(&self) -> u32 {
        self.accel.config.anti_alias.bandwidth_hz()
    }

    /// Set the driver low-pass cutoff of `channel` in Hz (0 disables filtering)
    ///
    /// The filter runs at the accelerometer output data rate. Filter state
    /// is reset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for the magnetometer, which is not
    /// filtered.
    pub fn set_driver_lowpass(
        &mut self,
        channel: Channel,
        cutoff_hz: f32,
    ) -> Result<(), Error<I::Error>> {
        match channel {
            Channel::Accel => {
                let sample_freq = self.accel.config.rate.hz() as f32;
                self.accel.filter.set_cutoff_frequency(sample_freq, cutoff_hz);
                Ok(())
            }
            Channel::Mag => Err(Error::InvalidConfig),
        }
    }

    /// Driver low-pass cutoff of `channel` in Hz
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for the magnetometer.
    pub fn driver_lowpass(&self, channel: Channel) -> Result<f32, Error<I::Error>> {
        match channel {
            Channel::Accel => Ok(self.accel.filter.cutoff_freq()),
            Channel::Mag => Err(Error::InvalidConfig),
        }
    }

    /// Replace the accelerometer calibration
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the three scales do not sum to
    /// between 2.0 and 4.0; the previous calibration stays in effect.
    pub fn set_accel_calibration(
        &mut self,
        calibration: AccelCalibration,
    ) -> Result<(), Error<I::Error>> {
        if self.accel.config.set_calibration(calibration) {
            Ok(())
        } else {
            Err(Error::InvalidConfig)
        }
    }

    /// Accelerometer calibration
    pub const fn accel_calibration(&self) -> &AccelCalibration {
        &self.accel.config.calibration
    }

    /// Check the accelerometer for samples and a plausible calibration
    ///
    /// Returns 0 on pass, 1 on fail: no samples yet, any offset zero, or any
    /// scale more than 0.4 away from (or exactly at) unity.
    pub fn accel_self_test(&self) -> u8 {
        if self.stats.accel_reads == 0 {
            return 1;
        }
        let cal = &self.accel.config.calibration;
        let offsets = [cal.offset_x, cal.offset_y, cal.offset_z];
        let scales = [cal.scale_x, cal.scale_y, cal.scale_z];

        let offsets_ok = offsets.iter().all(|o| libm::fabsf(*o) >= SELF_TEST_EPSILON);
        let scales_ok = scales.iter().all(|s| {
            let deviation = libm::fabsf(*s - 1.0);
            (SELF_TEST_EPSILON..=SELF_TEST_MAX_SCALE_DEVIATION).contains(&deviation)
        });
        u8::from(!(offsets_ok && scales_ok))
    }

    // ---------------------------------------------------------------------
    // Magnetometer configuration
    // ---------------------------------------------------------------------

    /// Set the magnetometer range to the smallest covering `max_ga` (0 for 12 Ga)
    ///
    /// # Errors
    ///
    /// - [`Error::OutOfRange`] if `max_ga` exceeds 12
    /// - [`Error::Bus`] if communication with the device fails
    pub fn set_mag_range(&mut self, max_ga: u32) -> Result<(), Error<I::Error>> {
        let update = self.mag.config.set_range(max_ga).ok_or(Error::OutOfRange)?;
        self.apply(update)
    }

    /// Magnetometer range in gauss
    pub const fn mag_range_ga(&self) -> u32 {
        self.mag.config.range.ga() as u32
    }

    /// Set the magnetometer output data rate to the smallest covering `hz`
    /// (0 for 100 Hz)
    ///
    /// # Errors
    ///
    /// - [`Error::OutOfRange`] if `hz` exceeds 100
    /// - [`Error::Bus`] if communication with the device fails
    pub fn set_mag_sample_rate(&mut self, hz: u32) -> Result<(), Error<I::Error>> {
        let update = self.mag.config.set_rate(hz).ok_or(Error::OutOfRange)?;
        self.apply(update)
    }

    /// Magnetometer output data rate in Hz
    pub const fn mag_sample_rate(&self) -> u32 {
        self.mag.config.rate.hz()
    }

    /// Replace the magnetometer calibration
    pub fn set_mag_calibration(&mut self, calibration: MagCalibration) {
        self.mag.config.calibration = calibration;
    }

    /// Magnetometer calibration
    pub const fn mag_calibration(&self) -> &MagCalibration {
        &self.mag.config.calibration
    }

    /// Check the magnetometer for samples and non-zero offsets
    ///
    /// Returns 0 on pass, 1 on fail. Scales are not checked.
    pub fn mag_self_test(&self) -> u8 {
        if self.stats.mag_reads == 0 {
            return 1;
        }
        let cal = &self.mag.config.calibration;
        let offsets_ok = [cal.offset_x, cal.offset_y, cal.offset_z]
            .iter()
            .all(|o| libm::fabsf(*o) >= SELF_TEST_EPSILON);
        u8::from(!offsets_ok)
    }

    /// Whether the magnetometer is external to the flight controller
    pub const fn mag_is_external(&self) -> bool {
        false
    }

    // ---------------------------------------------------------------------
    // Diagnostics
    // ---------------------------------------------------------------------

    /// Driver counters
    pub const fn stats(&self) -> Stats {
        self.stats
    }

    /// Register values the health check expects
    pub const fn expected_config(&self) -> ExpectedConfig {
        self.expected
    }

    /// Read every diagnostic register
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn register_dump(&mut self) -> Result<RegisterDump, Error<I::Error>> {
        let now = self.scheduler.now_us();
        Ok(RegisterDump::capture(&mut self.regs, &self.expected, now)?)
    }

    /// Flip diagnostic logging, returning the new state
    pub fn toggle_logging(&mut self) -> bool {
        self.monitor.toggle()
    }

    /// Borrow the sink
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Borrow the sink mutably
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Borrow the platform timer
    pub const fn timer(&self) -> &T {
        self.scheduler.timer()
    }

    /// Stop polling and return the owned resources
    pub fn release(mut self) -> (I, D, T, S) {
        self.scheduler.stop();
        (
            self.regs.release(),
            self.drdy,
            self.scheduler.release(),
            self.sink,
        )
    }
}

fn drain<T, E>(queue: &SampleQueue<T>, buffer: &mut [T]) -> Result<usize, Error<E>> {
    let mut count = 0;
    for slot in buffer.iter_mut() {
        let Some(sample) = queue.pop() else { break };
        *slot = sample;
        count += 1;
    }
    if count == 0 {
        Err(Error::WouldBlock)
    } else {
        Ok(count)
    }
}

fn take_one<T>(measurement: Measurement, queue: &SampleQueue<T>, buffer: &mut [T]) -> usize {
    if measurement != Measurement::Sampled {
        return 0;
    }
    match (queue.pop(), buffer.first_mut()) {
        (Some(sample), Some(slot)) => {
            *slot = sample;
            1
        }
        _ => 0,
    }
}
