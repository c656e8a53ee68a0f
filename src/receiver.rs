//! Receiver session: the state one listening session owns, and the per-tick
//! pipeline that turns it into a meter reading and audio parameters.
//!
//! Each tick:
//! 1. advance the dial if scanning, then read the tuned frequency
//! 2. pick the strongest station at that frequency
//! 3. hand a [`MeterReading`] to the display
//! 4. make sure the audio engine is up
//! 5. switch the station source when the best station changed
//! 6. map the fraction onto station/noise parameters
//! 7. layer QSB fading onto the station gain
//!
//! UI controls only touch the dial and the start/stop/scan flags; the audio
//! graph is written from `tick` alone.

use std::time::Duration;

use crate::audio::AudioEngine;
use crate::config::{MappingConfig, ReceiverConfig, TuningConfig};
use crate::display::{MeterDisplay, MeterReading};
use crate::fading::QsbModulator;
use crate::geo::LatLon;
use crate::propagation::{BestMatch, Clock, PropagationModel, is_night_at};
use crate::station::Station;

/// Tuned frequency, clamped to the configured band
#[derive(Debug, Clone)]
pub struct TuningDial {
    khz: f64,
    min_khz: f64,
    max_khz: f64,
    step_khz: f64,
}

impl TuningDial {
    pub fn new(config: &TuningConfig) -> Self {
        let mut dial = Self {
            khz: config.min_khz,
            min_khz: config.min_khz,
            max_khz: config.max_khz,
            step_khz: config.step_khz,
        };
        dial.set(config.initial_khz);
        dial
    }

    pub fn frequency(&self) -> f64 {
        self.khz
    }

    /// Set the dial; out-of-band values are clamped and NaN is ignored
    pub fn set(&mut self, khz: f64) {
        if !khz.is_nan() {
            self.khz = khz.clamp(self.min_khz, self.max_khz);
        }
    }

    pub fn step_up(&mut self) {
        self.set(self.khz + self.step_khz);
    }

    pub fn step_down(&mut self) {
        self.set(self.khz - self.step_khz);
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min_khz, self.max_khz)
    }
}

/// Automatic sweep that stops on the first strong enough station
#[derive(Debug, Clone)]
pub struct ScanControl {
    active: bool,
    step_khz: f64,
    stop_threshold: f64,
}

impl ScanControl {
    pub fn new(config: &TuningConfig) -> Self {
        Self {
            active: false,
            step_khz: config.scan_step_khz,
            stop_threshold: config.scan_stop_threshold,
        }
    }

    pub fn start(&mut self) {
        self.active = true;
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Move the dial one scan step up, wrapping to the bottom of the band
    pub fn advance(&self, dial: &mut TuningDial) {
        let (min, max) = dial.range();
        let next = dial.frequency() + self.step_khz;
        dial.set(if next > max { min } else { next });
    }

    /// Whether `fraction` is strong enough to end the scan
    pub fn locks_on(&self, fraction: f64) -> bool {
        fraction >= self.stop_threshold
    }
}

/// Audio graph parameters derived from one signal fraction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioParams {
    pub station_filter_hz: f32,
    pub station_q: f32,
    pub station_gain: f32,
    pub noise_cutoff_hz: f32,
    pub noise_gain: f32,
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

impl AudioParams {
    /// Concave station gain, static fading out as the signal comes up
    pub fn from_fraction(fraction: f64, mapping: &MappingConfig) -> Self {
        let f = fraction.clamp(0.0, 1.0) as f32;
        Self {
            station_filter_hz: mapping.station_filter_hz,
            station_q: lerp(mapping.q_weak, mapping.q_strong, f),
            station_gain: f.powf(mapping.station_gain_exponent) * mapping.station_gain_max,
            noise_cutoff_hz: lerp(
                mapping.noise_cutoff_weak_hz,
                mapping.noise_cutoff_strong_hz,
                f,
            ),
            noise_gain: lerp(mapping.noise_gain_loud, mapping.noise_gain_quiet, f).max(0.0),
        }
    }
}

/// Parameters actually pushed to the engine on a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedParams {
    pub base: AudioParams,
    /// Station gain after QSB
    pub faded_station_gain: f32,
}

/// Everything one listening session owns
pub struct ReceiverSession {
    config: ReceiverConfig,
    model: PropagationModel,
    stations: Vec<Station>,
    listener: Option<LatLon>,
    dial: TuningDial,
    scan: ScanControl,
    engine: AudioEngine,
    qsb: QsbModulator,
    clock: Box<dyn Clock>,
    best_index: Option<usize>,
    best_fraction: f64,
    last_applied: Option<AppliedParams>,
}

impl ReceiverSession {
    /// A session with no stations and no listener position yet
    pub fn new(config: ReceiverConfig, engine: AudioEngine, clock: Box<dyn Clock>) -> Self {
        Self {
            model: PropagationModel::new(config.propagation.clone(), config.daynight.clone()),
            dial: TuningDial::new(&config.tuning),
            scan: ScanControl::new(&config.tuning),
            qsb: QsbModulator::new(&config.qsb),
            config,
            stations: Vec::new(),
            listener: None,
            engine,
            clock,
            best_index: None,
            best_fraction: 0.0,
            last_applied: None,
        }
    }

    pub fn set_stations(&mut self, stations: Vec<Station>) {
        log::info!("Station set ready: {} stations", stations.len());
        self.stations = stations;
        self.best_index = None;
        self.best_fraction = 0.0;
    }

    pub fn set_listener(&mut self, position: LatLon) {
        self.listener = Some(position);
    }

    pub fn listener(&self) -> Option<LatLon> {
        self.listener
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn config(&self) -> &ReceiverConfig {
        &self.config
    }

    pub fn dial(&self) -> &TuningDial {
        &self.dial
    }

    pub fn dial_mut(&mut self) -> &mut TuningDial {
        &mut self.dial
    }

    pub fn scan(&self) -> &ScanControl {
        &self.scan
    }

    pub fn start_scan(&mut self) {
        self.scan.start();
    }

    pub fn stop_scan(&mut self) {
        self.scan.stop();
    }

    pub fn engine(&self) -> &AudioEngine {
        &self.engine
    }

    pub fn qsb(&self) -> &QsbModulator {
        &self.qsb
    }

    /// Start (or retry) audio playback
    pub fn start(&mut self) -> bool {
        self.engine.resume()
    }

    /// Stop audio playback; the session can be started again
    pub fn stop(&mut self) {
        self.scan.stop();
        self.engine.teardown();
    }

    /// Best station and fraction retained from the last tick
    pub fn best(&self) -> BestMatch<'_> {
        BestMatch {
            station: self.best_index.and_then(|i| self.stations.get(i)),
            index: self.best_index,
            fraction: self.best_fraction,
        }
    }

    pub fn last_applied(&self) -> Option<AppliedParams> {
        self.last_applied
    }

    /// Signal fraction of `station` at the current dial setting and time
    pub fn compute_signal_fraction(&self, station: &Station) -> f64 {
        self.model.signal_fraction(
            station,
            self.dial.frequency(),
            self.listener.as_ref(),
            self.clock.now(),
        )
    }

    /// Strongest station at the current dial setting and time
    pub fn select_best_station(&self) -> BestMatch<'_> {
        self.model.select_best(
            &self.stations,
            self.dial.frequency(),
            self.listener.as_ref(),
            self.clock.now(),
        )
    }

    /// Push parameters for `fraction` to the engine, with QSB on the station gain
    pub fn apply_audio_parameters(&mut self, fraction: f64, elapsed: Duration) -> AppliedParams {
        let base = AudioParams::from_fraction(fraction, &self.config.mapping);
        self.engine
            .set_station_params(base.station_filter_hz, base.station_q, base.station_gain);
        self.engine
            .set_noise_params(base.noise_cutoff_hz, base.noise_gain);

        let faded_station_gain = self.qsb.modulate(base.station_gain, fraction, elapsed);
        self.engine.set_station_gain(faded_station_gain);

        let applied = AppliedParams {
            base,
            faded_station_gain,
        };
        self.last_applied = Some(applied);
        applied
    }

    /// One scheduler step; `elapsed` is the time since the previous tick
    pub fn tick(&mut self, elapsed: Duration, display: &mut dyn MeterDisplay) -> MeterReading {
        if self.scan.is_active() {
            self.scan.advance(&mut self.dial);
        }
        let tuned_khz = self.dial.frequency();
        let now = self.clock.now();

        let best = self
            .model
            .select_best(&self.stations, tuned_khz, self.listener.as_ref(), now);

        if self.scan.is_active() && self.scan.locks_on(best.fraction) {
            self.scan.stop();
            if let Some(station) = best.station {
                log::info!(
                    "Scan locked on {} at {:.1} kHz ({:.0}%)",
                    station.label,
                    tuned_khz,
                    best.fraction * 100.0
                );
            }
        }

        if best.index != self.best_index {
            log::debug!(
                "Best station -> {}",
                best.station.map_or("(none)", |s| s.label.as_str())
            );
        }

        let reading = MeterReading {
            tuned_khz,
            fraction: best.fraction,
            station: best.station.map(|s| s.label.clone()),
            station_khz: best.station.map(|s| s.frequency_khz),
            distance_km: best.station.zip(self.listener).map(|(s, l)| l.distance_km(&s.position)),
            night: best
                .station
                .map(|s| is_night_at(s.position.lon, now, &self.config.daynight)),
            scanning: self.scan.is_active(),
        };
        display.show(&reading);

        if self.engine.init() {
            self.engine
                .switch_station_source(best.station.map(|s| s.audio.as_str()));
        }

        self.best_index = best.index;
        self.best_fraction = best.fraction;
        self.apply_audio_parameters(reading.fraction, elapsed);

        reading
    }
}
