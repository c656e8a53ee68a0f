//! QSB (fading) modulator
//!
//! A slow sine LFO scaled by how weak the signal is, with a little uniform
//! jitter on top for scintillation. Weak stations fade deeper and flutter
//! faster; a perfect signal (fraction 1) does not fade at all.

use std::f64::consts::PI;
use std::time::Duration;

use rand::RngExt;
use rand_chacha::ChaCha8Rng;

use crate::audio::noise::create_rng;
use crate::config::QsbConfig;

pub struct QsbModulator {
    config: QsbConfig,
    /// Position within the current LFO cycle, in `[0, 1)`
    phase: f64,
    /// Completed LFO cycles
    cycles: u64,
    rng: ChaCha8Rng,
}

impl QsbModulator {
    pub fn new(config: &QsbConfig) -> Self {
        Self {
            config: config.clone(),
            phase: 0.0,
            cycles: 0,
            rng: create_rng(config.seed),
        }
    }

    /// Fade depth: `1 - fraction`
    pub fn depth(best_fraction: f64) -> f64 {
        1.0 - best_fraction.clamp(0.0, 1.0)
    }

    /// LFO rate for a given depth, interpolated between the configured bounds
    pub fn rate_hz(&self, depth: f64) -> f64 {
        let depth = depth.clamp(0.0, 1.0);
        self.config.min_rate_hz + (self.config.max_rate_hz - self.config.min_rate_hz) * depth
    }

    fn advance(&mut self, rate_hz: f64, elapsed: Duration) {
        let next = self.phase + rate_hz.max(0.0) * elapsed.as_secs_f64();
        let whole = next.floor();
        self.cycles += whole as u64;
        self.phase = next - whole;
    }

    /// Current LFO value, `sin(2*pi*phase)`
    pub fn lfo(&self) -> f64 {
        (2.0 * PI * self.phase).sin()
    }

    /// Advance by `elapsed` and return the faded gain for `base_gain`
    ///
    /// Never negative.
    pub fn modulate(&mut self, base_gain: f32, best_fraction: f64, elapsed: Duration) -> f32 {
        let depth = Self::depth(best_fraction);
        self.advance(self.rate_hz(depth), elapsed);

        let u: f64 = self.rng.random();
        let stochastic = 1.0 + (2.0 * u - 1.0) * self.config.jitter;

        let base = base_gain as f64;
        let gain = base + self.lfo() * depth * stochastic * base;
        gain.max(0.0) as f32
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Unwrapped phase in cycles; never decreases
    pub fn total_phase(&self) -> f64 {
        self.cycles as f64 + self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> QsbModulator {
        QsbModulator::new(&QsbConfig {
            seed: Some(11),
            ..QsbConfig::default()
        })
    }

    #[test]
    fn test_depth_and_rate() {
        let qsb = seeded();
        assert_eq!(QsbModulator::depth(1.0), 0.0);
        assert_eq!(QsbModulator::depth(0.0), 1.0);
        assert_eq!(QsbModulator::depth(1.5), 0.0);
        assert!((qsb.rate_hz(0.0) - 0.08).abs() < 1e-12);
        assert!((qsb.rate_hz(1.0) - 1.2).abs() < 1e-12);
        assert!(qsb.rate_hz(0.8) > qsb.rate_hz(0.2));
    }

    #[test]
    fn test_full_signal_does_not_fade() {
        let mut qsb = seeded();
        for _ in 0..100 {
            let g = qsb.modulate(0.8, 1.0, Duration::from_millis(100));
            assert!((g - 0.8).abs() < 1e-6);
        }
    }

    #[test]
    fn test_gain_never_negative() {
        let mut qsb = QsbModulator::new(&QsbConfig {
            jitter: 0.15,
            seed: Some(5),
            ..QsbConfig::default()
        });
        for _ in 0..2000 {
            assert!(qsb.modulate(1.0, 0.0, Duration::from_millis(37)) >= 0.0);
        }
    }

    #[test]
    fn test_gain_stays_within_depth_envelope() {
        let mut qsb = seeded();
        let base = 0.5f32;
        let fraction = 0.7;
        let depth = QsbModulator::depth(fraction) as f32;
        let limit = base * depth * 1.12 + 1e-6;
        for _ in 0..500 {
            let g = qsb.modulate(base, fraction, Duration::from_millis(100));
            assert!((g - base).abs() <= limit);
        }
    }

    #[test]
    fn test_weak_signal_fades_deeper() {
        let swing = |fraction: f64| {
            let mut qsb = seeded();
            let gains: Vec<f32> = (0..300)
                .map(|_| qsb.modulate(1.0, fraction, Duration::from_millis(100)))
                .collect();
            let max = gains.iter().cloned().fold(f32::MIN, f32::max);
            let min = gains.iter().cloned().fold(f32::MAX, f32::min);
            max - min
        };
        assert!(swing(0.2) > swing(0.8));
    }

    #[test]
    fn test_phase_never_decreases_and_wraps() {
        let mut qsb = seeded();
        let mut previous = qsb.total_phase();
        for _ in 0..1000 {
            qsb.modulate(1.0, 0.0, Duration::from_millis(100));
            let total = qsb.total_phase();
            assert!(total >= previous);
            assert!((0.0..1.0).contains(&qsb.phase()));
            previous = total;
        }
        // 100 s at 1.2 Hz
        assert!((qsb.total_phase() - 120.0).abs() < 1e-6);
    }

    #[test]
    fn test_lfo_continuous_across_wrap() {
        let mut qsb = seeded();
        qsb.advance(1.0, Duration::from_millis(999));
        let before = qsb.lfo();
        qsb.advance(1.0, Duration::from_millis(2));
        let after = qsb.lfo();
        assert_eq!(qsb.total_phase().floor(), 1.0);
        assert!((after - before).abs() < 0.02);
    }
}
