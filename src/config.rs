//! Configuration for the shortwave receiver.
//!
//! Every tunable constant of the propagation model, the audio graph and the
//! update loop lives here. All sections have working defaults, so a TOML file
//! only needs to name the values it changes:
//!
//! ```toml
//! [propagation]
//! distance_exponent = 2.0
//!
//! [tuning]
//! initial_khz = 6070.0
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{ReceiverError, Result};
use crate::geo::LatLon;

/// Complete receiver configuration
///
/// # Example
/// ```
/// use shortwave::config::ReceiverConfig;
///
/// let mut config = ReceiverConfig::default();
/// config.tuning.initial_khz = 6070.0;
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Audio output and graph configuration
    pub audio: AudioConfig,
    /// Propagation model constants
    pub propagation: PropagationConfig,
    /// Day/night boundary hours
    pub daynight: DayNightConfig,
    /// Signal fraction to audio parameter mapping
    pub mapping: MappingConfig,
    /// QSB fading modulator
    pub qsb: QsbConfig,
    /// Update scheduler
    pub scheduler: SchedulerConfig,
    /// Tuning dial range and scan behaviour
    pub tuning: TuningConfig,
    /// Listener position fallback
    pub listener: ListenerConfig,
    /// Station catalogue source
    pub catalogue: CatalogueConfig,
}

/// Audio output and graph configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Device buffer size in frames
    pub buffer_size: usize,
    /// Output channel count (the mono mix is copied to every channel)
    pub channels: u16,
    /// Length of the looped white-noise buffer in seconds
    pub noise_buffer_secs: f32,
    /// Peak amplitude of the white-noise samples
    pub noise_amplitude: f32,
    /// Time constant for station branch parameter changes in milliseconds
    pub station_smoothing_ms: f32,
    /// Time constant for noise branch parameter changes in milliseconds
    pub noise_smoothing_ms: f32,
    /// Time constant of the ramp around a station source switch in milliseconds
    pub switch_ramp_ms: f32,
    /// Master output high-pass cutoff in Hz
    pub output_highpass_hz: f32,
    /// Master output high-pass Butterworth order
    pub output_highpass_order: usize,
    /// Gain applied to the summed branches before soft clipping
    pub master_gain: f32,
    /// Capacity of the engine-to-graph command queue
    pub command_queue_len: usize,
    /// Longest wait for the mute ramp when stopping, in milliseconds
    pub release_timeout_ms: u64,
}

/// Propagation model constants
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PropagationConfig {
    /// Linear scale applied to transmit power
    pub power_scale: f64,
    /// Exponent of the inverse-power distance law
    pub distance_exponent: f64,
    /// Soft floor on distance in km
    pub min_distance_km: f64,
    /// Frequency-match Gaussian width by day in kHz
    pub bandwidth_day_khz: f64,
    /// Frequency-match Gaussian width by night in kHz
    pub bandwidth_night_khz: f64,
    /// Extra multiplier reached at or below `night_boost_low_khz` (0.5 = 1.5x)
    pub night_boost_max: f64,
    /// Tuned frequency receiving the full night boost
    pub night_boost_low_khz: f64,
    /// Tuned frequency at and above which the night boost vanishes
    pub night_boost_high_khz: f64,
}

/// Local-time window classified as night
///
/// Night is `hour >= night_start_hour || hour < night_end_hour`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DayNightConfig {
    pub night_start_hour: f64,
    pub night_end_hour: f64,
}

/// Mapping from signal fraction to audio graph parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Concave exponent for station gain (`fraction^exponent`)
    pub station_gain_exponent: f32,
    /// Station gain at full signal
    pub station_gain_max: f32,
    /// Static gain with no signal at all
    pub noise_gain_loud: f32,
    /// Static gain at full signal
    pub noise_gain_quiet: f32,
    /// Band-pass centre for the station branch in Hz
    pub station_filter_hz: f32,
    /// Band-pass Q for a barely audible station
    pub q_weak: f32,
    /// Band-pass Q for a solid station
    pub q_strong: f32,
    /// Noise low-pass cutoff with no signal in Hz
    pub noise_cutoff_weak_hz: f32,
    /// Noise low-pass cutoff at full signal in Hz
    pub noise_cutoff_strong_hz: f32,
}

/// QSB fading modulator
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QsbConfig {
    /// Fade rate for a perfect signal in Hz
    pub min_rate_hz: f64,
    /// Fade rate for a vanishing signal in Hz
    pub max_rate_hz: f64,
    /// Uniform scintillation jitter as a fraction of depth (0.12 = +/-12%)
    pub jitter: f64,
    /// Seed for reproducible jitter; random when unset
    pub seed: Option<u64>,
}

/// Update scheduler
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Tick period in milliseconds
    pub period_ms: u64,
}

/// Tuning dial range and scan behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    pub min_khz: f64,
    pub max_khz: f64,
    pub initial_khz: f64,
    /// Manual step size in kHz
    pub step_khz: f64,
    /// Dial advance per tick while scanning, in kHz
    pub scan_step_khz: f64,
    /// Best fraction at which a scan stops
    pub scan_stop_threshold: f64,
}

/// Listener position fallback
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Position used when no source yields a fix
    pub default_position: LatLon,
    /// Maximum time to wait for a position fix in milliseconds
    pub timeout_ms: u64,
}

/// Station catalogue source
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogueConfig {
    /// Local path or `http(s)://` URL of the JSON catalogue
    pub source: String,
    /// Network fetch timeout in seconds
    pub fetch_timeout_secs: u64,
}

impl ReceiverConfig {
    /// Load a configuration from a TOML file
    ///
    /// Missing sections and fields fall back to their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ReceiverError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// Parse and validate a configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ReceiverError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints the type system cannot express
    pub fn validate(&self) -> Result<()> {
        let t = &self.tuning;
        if !(t.min_khz > 0.0 && t.min_khz < t.max_khz) {
            return Err(ReceiverError::Config(format!(
                "tuning range must satisfy 0 < min < max, got {}..{}",
                t.min_khz, t.max_khz
            )));
        }
        if t.scan_step_khz <= 0.0 {
            return Err(ReceiverError::Config("scan step must be positive".into()));
        }

        let p = &self.propagation;
        if p.bandwidth_day_khz <= 0.0 || p.bandwidth_night_khz <= 0.0 {
            return Err(ReceiverError::Config("bandwidths must be positive".into()));
        }
        if p.min_distance_km <= 0.0 || p.distance_exponent <= 0.0 {
            return Err(ReceiverError::Config(
                "distance floor and exponent must be positive".into(),
            ));
        }
        if p.night_boost_low_khz >= p.night_boost_high_khz {
            return Err(ReceiverError::Config(
                "night boost low bound must be below the high bound".into(),
            ));
        }

        let d = &self.daynight;
        if !(0.0..24.0).contains(&d.night_start_hour) || !(0.0..24.0).contains(&d.night_end_hour)
        {
            return Err(ReceiverError::Config(
                "night boundary hours must be in [0, 24)".into(),
            ));
        }

        let a = &self.audio;
        if a.sample_rate == 0 || a.channels == 0 {
            return Err(ReceiverError::Config(
                "sample rate and channel count must be non-zero".into(),
            ));
        }
        if a.noise_buffer_secs <= 0.0 {
            return Err(ReceiverError::Config(
                "noise buffer duration must be positive".into(),
            ));
        }

        if self.scheduler.period_ms == 0 {
            return Err(ReceiverError::Config("scheduler period must be non-zero".into()));
        }

        let q = &self.qsb;
        if q.min_rate_hz < 0.0 || q.max_rate_hz < q.min_rate_hz {
            return Err(ReceiverError::Config(
                "QSB rates must satisfy 0 <= min <= max".into(),
            ));
        }

        Ok(())
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 1024,
            channels: 2,
            noise_buffer_secs: 2.0,
            noise_amplitude: 0.35,
            station_smoothing_ms: 60.0,
            noise_smoothing_ms: 80.0,
            switch_ramp_ms: 8.0,
            output_highpass_hz: 120.0,
            output_highpass_order: 2,
            master_gain: 0.8,
            command_queue_len: 64,
            release_timeout_ms: 1500,
        }
    }
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            power_scale: 10.0,
            distance_exponent: 1.8,
            min_distance_km: 5.0,
            bandwidth_day_khz: 18.0,
            bandwidth_night_khz: 14.0,
            night_boost_max: 0.5,
            night_boost_low_khz: 3000.0,
            night_boost_high_khz: 15000.0,
        }
    }
}

impl Default for DayNightConfig {
    fn default() -> Self {
        Self {
            night_start_hour: 18.0,
            night_end_hour: 6.0,
        }
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            station_gain_exponent: 0.9,
            station_gain_max: 1.0,
            noise_gain_loud: 0.6,
            noise_gain_quiet: 0.03,
            station_filter_hz: 1500.0,
            q_weak: 3.0,
            q_strong: 0.5,
            noise_cutoff_weak_hz: 6000.0,
            noise_cutoff_strong_hz: 2500.0,
        }
    }
}

impl Default for QsbConfig {
    fn default() -> Self {
        Self {
            min_rate_hz: 0.08,
            max_rate_hz: 1.2,
            jitter: 0.12,
            seed: None,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { period_ms: 100 }
    }
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            min_khz: 2300.0,
            max_khz: 26100.0,
            initial_khz: 9600.0,
            step_khz: 5.0,
            scan_step_khz: 5.0,
            scan_stop_threshold: 0.5,
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            default_position: LatLon::new(51.5074, -0.1278),
            timeout_ms: 5000,
        }
    }
}

impl Default for CatalogueConfig {
    fn default() -> Self {
        Self {
            source: "stations.json".to_string(),
            fetch_timeout_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ReceiverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scheduler.period_ms, 100);
        assert_eq!(config.daynight.night_start_hour, 18.0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ReceiverConfig::from_toml(
            r#"
            [propagation]
            distance_exponent = 2.0

            [tuning]
            initial_khz = 6070.0
            "#,
        )
        .unwrap();

        assert_eq!(config.propagation.distance_exponent, 2.0);
        assert_eq!(config.propagation.power_scale, 10.0);
        assert_eq!(config.tuning.initial_khz, 6070.0);
        assert_eq!(config.tuning.max_khz, 26100.0);
    }

    #[test]
    fn test_default_position_from_toml() {
        let config = ReceiverConfig::from_toml(
            r#"
            [listener]
            default_position = { lat = 40.0, lon = -74.0 }
            "#,
        )
        .unwrap();
        assert_eq!(config.listener.default_position, LatLon::new(40.0, -74.0));
    }

    #[test]
    fn test_invalid_tuning_range_rejected() {
        let result = ReceiverConfig::from_toml(
            r#"
            [tuning]
            min_khz = 9000.0
            max_khz = 3000.0
            "#,
        );
        assert!(matches!(result, Err(ReceiverError::Config(_))));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        assert!(ReceiverConfig::from_toml("[tuning\nmin_khz = ").is_err());
    }
}
