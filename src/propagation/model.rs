//! Heuristic shortwave propagation model
//!
//! Combines four factors into one raw strength and maps it onto `[0, 1)`:
//!
//! - inverse-power distance attenuation with a soft floor near the station
//! - Gaussian frequency match between carrier and dial, narrower at night
//! - a night boost favouring the low bands
//! - transmit power
//!
//! The final map is `raw / (1 + raw)`, which saturates smoothly instead of
//! clamping, so the fraction never reaches 1 and has no kinks.

use chrono::{DateTime, Utc};

use crate::config::{DayNightConfig, PropagationConfig};
use crate::constants::DISTANCE_EPSILON_KM;
use crate::geo::LatLon;
use crate::propagation::daynight::is_night_at;
use crate::station::Station;

/// Intermediate terms of one signal evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalBreakdown {
    pub distance_km: f64,
    pub power_term: f64,
    pub night: bool,
    pub freq_factor: f64,
    pub night_boost: f64,
    pub raw: f64,
    pub fraction: f64,
}

/// Propagation model parameterised by its configuration
#[derive(Debug, Clone, Default)]
pub struct PropagationModel {
    pub config: PropagationConfig,
    pub daynight: DayNightConfig,
}

impl PropagationModel {
    pub fn new(config: PropagationConfig, daynight: DayNightConfig) -> Self {
        Self { config, daynight }
    }

    /// Attenuated power at `distance_km`
    pub fn power_term(&self, power_watts: f64, distance_km: f64) -> f64 {
        let d = distance_km.max(self.config.min_distance_km);
        power_watts * self.config.power_scale / d.powf(self.config.distance_exponent)
    }

    /// Gaussian falloff with the carrier-to-dial mismatch
    pub fn frequency_factor(&self, station_khz: f64, tuned_khz: f64, night: bool) -> f64 {
        let bandwidth = if night {
            self.config.bandwidth_night_khz
        } else {
            self.config.bandwidth_day_khz
        };
        let delta = (station_khz - tuned_khz).abs();
        (-(delta * delta) / (2.0 * bandwidth * bandwidth)).exp()
    }

    /// Night multiplier: full boost at the low band, none at the high bound
    pub fn night_boost(&self, tuned_khz: f64, night: bool) -> f64 {
        if !night {
            return 1.0;
        }
        let low = self.config.night_boost_low_khz;
        let high = self.config.night_boost_high_khz;
        let t = ((high - tuned_khz) / (high - low)).clamp(0.0, 1.0);
        1.0 + self.config.night_boost_max * t
    }

    /// Evaluate every term for `station` with an explicit day/night state
    pub fn evaluate_with_night(
        &self,
        station: &Station,
        tuned_khz: f64,
        listener: &LatLon,
        night: bool,
    ) -> SignalBreakdown {
        let distance_km = listener.distance_km(&station.position) + DISTANCE_EPSILON_KM;
        let power_term = self.power_term(station.power_watts, distance_km);
        let freq_factor = self.frequency_factor(station.frequency_khz, tuned_khz, night);
        let night_boost = self.night_boost(tuned_khz, night);

        let raw = power_term * freq_factor * night_boost;
        let fraction = if raw.is_finite() && raw > 0.0 {
            raw / (1.0 + raw)
        } else {
            0.0
        };

        SignalBreakdown {
            distance_km,
            power_term,
            night,
            freq_factor,
            night_boost,
            raw,
            fraction,
        }
    }

    /// Evaluate every term for `station` at the instant `now`
    ///
    /// `None` while the listener position is unknown.
    pub fn evaluate(
        &self,
        station: &Station,
        tuned_khz: f64,
        listener: Option<&LatLon>,
        now: DateTime<Utc>,
    ) -> Option<SignalBreakdown> {
        let listener = listener?;
        let night = is_night_at(station.position.lon, now, &self.daynight);
        Some(self.evaluate_with_night(station, tuned_khz, listener, night))
    }

    /// Normalised signal fraction in `[0, 1]`; exactly 0 without a listener
    pub fn signal_fraction(
        &self,
        station: &Station,
        tuned_khz: f64,
        listener: Option<&LatLon>,
        now: DateTime<Utc>,
    ) -> f64 {
        self.evaluate(station, tuned_khz, listener, now)
            .map_or(0.0, |b| b.fraction)
    }
}
