use std::f32::consts::PI;

use super::Filter;
use crate::constants::{MAX_FILTER_NYQUIST_RATIO, MIN_FILTER_HZ, MIN_FILTER_Q};

/// Response shape of a [`Biquad`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiquadKind {
    /// Band-pass with 0 dB peak gain at the centre frequency
    BandPass,
    /// Second-order low-pass
    LowPass,
}

/// Retunable second-order IIR section (RBJ cookbook coefficients)
///
/// Uses transposed direct form II. The delay state survives a retune, so the
/// frequency and Q can follow a smoothed parameter without resetting the
/// filter and clicking.
pub struct Biquad {
    kind: BiquadKind,
    sample_rate: f32,
    frequency: f32,
    q: f32,
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    z1: f32,
    z2: f32,
}

impl Biquad {
    pub fn new(kind: BiquadKind, frequency: f32, q: f32, sample_rate: f32) -> Self {
        let mut filter = Self {
            kind,
            sample_rate,
            frequency: 0.0,
            q: 0.0,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
        };
        filter.set_params(frequency, q);
        filter
    }

    pub fn band_pass(center_hz: f32, q: f32, sample_rate: f32) -> Self {
        Self::new(BiquadKind::BandPass, center_hz, q, sample_rate)
    }

    pub fn low_pass(cutoff_hz: f32, q: f32, sample_rate: f32) -> Self {
        Self::new(BiquadKind::LowPass, cutoff_hz, q, sample_rate)
    }

    /// Recompute coefficients, keeping the delay state
    ///
    /// Frequency is clamped below Nyquist and Q to a small positive floor.
    pub fn set_params(&mut self, frequency: f32, q: f32) {
        let max_hz = self.sample_rate * MAX_FILTER_NYQUIST_RATIO;
        let frequency = frequency.clamp(MIN_FILTER_HZ, max_hz);
        let q = q.max(MIN_FILTER_Q);
        self.frequency = frequency;
        self.q = q;

        let w0 = 2.0 * PI * frequency / self.sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q);
        let a0 = 1.0 + alpha;

        let (b0, b1, b2) = match self.kind {
            BiquadKind::BandPass => (alpha, 0.0, -alpha),
            BiquadKind::LowPass => {
                let k = 1.0 - cos_w0;
                (k / 2.0, k, k / 2.0)
            }
        };

        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = -2.0 * cos_w0 / a0;
        self.a2 = (1.0 - alpha) / a0;
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn q(&self) -> f32 {
        self.q
    }
}

impl Filter for Biquad {
    fn process(&mut self, sample: f32) -> f32 {
        let out = self.b0 * sample + self.z1;
        self.z1 = self.b1 * sample - self.a1 * out + self.z2;
        self.z2 = self.b2 * sample - self.a2 * out;
        out
    }

    fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}
