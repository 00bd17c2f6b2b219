//! Second-order low-pass filter applied to accelerometer samples
//!
//! A two-pole Butterworth biquad in direct form II. A cutoff of zero (or any
//! non-positive value) turns the filter into a passthrough.

use core::f32::consts::{FRAC_PI_4, PI};

/// Two-pole Butterworth low-pass filter
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LowPassFilter2p {
    sample_freq: f32,
    cutoff_freq: f32,
    a1: f32,
    a2: f32,
    b0: f32,
    b1: f32,
    b2: f32,
    delay1: f32,
    delay2: f32,
    primed: bool,
}

impl LowPassFilter2p {
    /// Create a filter for `sample_freq` Hz input with a `cutoff_freq` Hz corner
    #[must_use]
    pub fn new(sample_freq: f32, cutoff_freq: f32) -> Self {
        let mut filter = Self {
            sample_freq: 0.0,
            cutoff_freq: 0.0,
            a1: 0.0,
            a2: 0.0,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            delay1: 0.0,
            delay2: 0.0,
            primed: false,
        };
        filter.set_cutoff_frequency(sample_freq, cutoff_freq);
        filter
    }

    /// Recompute the coefficients and clear the delay line
    pub fn set_cutoff_frequency(&mut self, sample_freq: f32, cutoff_freq: f32) {
        self.sample_freq = sample_freq;
        self.cutoff_freq = cutoff_freq;
        self.delay1 = 0.0;
        self.delay2 = 0.0;
        self.primed = false;

        if cutoff_freq <= 0.0 || sample_freq <= 0.0 {
            self.a1 = 0.0;
            self.a2 = 0.0;
            self.b0 = 1.0;
            self.b1 = 0.0;
            self.b2 = 0.0;
            return;
        }

        let fr = sample_freq / cutoff_freq;
        let ohm = libm::tanf(PI / fr);
        let cos_term = 2.0 * libm::cosf(FRAC_PI_4) * ohm;
        let c = 1.0 + cos_term + ohm * ohm;

        self.b0 = ohm * ohm / c;
        self.b1 = 2.0 * self.b0;
        self.b2 = self.b0;
        self.a1 = 2.0 * (ohm * ohm - 1.0) / c;
        self.a2 = (1.0 - cos_term + ohm * ohm) / c;
    }

    /// Filter one sample
    ///
    /// The first sample after a reset primes the delay line at steady state,
    /// so it passes through unchanged.
    pub fn apply(&mut self, sample: f32) -> f32 {
        if self.is_passthrough() {
            return sample;
        }
        if !self.primed {
            self.reset(sample);
        }

        let mut delay0 = sample - self.delay1 * self.a1 - self.delay2 * self.a2;
        if !delay0.is_finite() {
            delay0 = sample;
        }
        let output = delay0 * self.b0 + self.delay1 * self.b1 + self.delay2 * self.b2;

        self.delay2 = self.delay1;
        self.delay1 = delay0;
        output
    }

    /// Settle the delay line as if `sample` had been applied forever
    pub fn reset(&mut self, sample: f32) {
        let gain = self.b0 + self.b1 + self.b2;
        let delay = if gain.abs() > f32::EPSILON {
            sample / gain
        } else {
            sample
        };
        self.delay1 = delay;
        self.delay2 = delay;
        self.primed = true;
    }

    /// Cutoff frequency in Hz
    #[must_use]
    pub const fn cutoff_freq(&self) -> f32 {
        self.cutoff_freq
    }

    /// Sample frequency in Hz
    #[must_use]
    pub const fn sample_freq(&self) -> f32 {
        self.sample_freq
    }

    fn is_passthrough(&self) -> bool {
        self.cutoff_freq <= 0.0 || self.sample_freq <= 0.0
    }
}

/// One [`LowPassFilter2p`] per axis, sharing a cutoff
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisFilter {
    axes: [LowPassFilter2p; 3],
}

impl AxisFilter {
    /// Create three identical filters
    #[must_use]
    pub fn new(sample_freq: f32, cutoff_freq: f32) -> Self {
        let filter = LowPassFilter2p::new(sample_freq, cutoff_freq);
        Self {
            axes: [filter; 3],
        }
    }

    /// Reconfigure all three axes
    pub fn set_cutoff_frequency(&mut self, sample_freq: f32, cutoff_freq: f32) {
        for axis in &mut self.axes {
            axis.set_cutoff_frequency(sample_freq, cutoff_freq);
        }
    }

    /// Filter one `[x, y, z]` sample
    pub fn apply(&mut self, sample: [f32; 3]) -> [f32; 3] {
        let [x, y, z] = sample;
        [
            self.axes[0].apply(x),
            self.axes[1].apply(y),
            self.axes[2].apply(z),
        ]
    }

    /// Cutoff frequency in Hz
    #[must_use]
    pub const fn cutoff_freq(&self) -> f32 {
        self.axes[0].cutoff_freq()
    }

    /// Sample frequency in Hz
    #[must_use]
    pub const fn sample_freq(&self) -> f32 {
        self.axes[0].sample_freq()
    }
}
