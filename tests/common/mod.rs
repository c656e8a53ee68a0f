#![allow(dead_code)]

use std::f32::consts::PI;
use std::time::Duration;

use shortwave::audio::{AudioClip, AudioEngine, OfflineHandle, OfflineOutput};
use shortwave::propagation::FixedClock;
use shortwave::{LatLon, ReceiverConfig, ReceiverSession, Station};

pub const SAMPLE_RATE: u32 = 48000;
pub const TICK: Duration = Duration::from_millis(100);

/// Central London
pub fn listener() -> LatLon {
    LatLon::new(51.5, -0.12)
}

/// Continuous tone at `freq` Hz, `secs` long
pub fn tone(freq: f32, secs: f32, amplitude: f32) -> Vec<f32> {
    let n = (secs * SAMPLE_RATE as f32) as usize;
    (0..n)
        .map(|i| amplitude * (2.0 * PI * freq * i as f32 / SAMPLE_RATE as f32).sin())
        .collect()
}

pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

/// Two stations: one ~55 km from the listener, one across the Atlantic
pub fn stations() -> Vec<Station> {
    vec![
        Station::new("Channel Relay", LatLon::new(51.0, -0.10), 50000.0, 9600.0, "relay.wav"),
        Station::new("Atlantic Service", LatLon::new(40.7, -74.0), 100000.0, 6070.0, "atlantic.wav"),
    ]
}

/// A session on an offline output, with a 1 kHz tone preloaded for every
/// station in `stations()`
pub fn offline_session(utc_hour: f64) -> (ReceiverSession, OfflineHandle) {
    let mut config = ReceiverConfig::default();
    config.qsb.seed = Some(42);

    let (output, handle) = OfflineOutput::new();
    let mut engine =
        AudioEngine::new(&config.audio, &config.mapping, Box::new(output)).with_noise_seed(42);
    for station in stations() {
        engine.preload(AudioClip::from_samples(station.audio, tone(1000.0, 1.0, 0.5)));
    }

    let session = ReceiverSession::new(
        config,
        engine,
        Box::new(FixedClock::at_utc_hour(utc_hour)),
    );
    (session, handle)
}

/// Render `secs` of mono audio from a running offline graph
pub fn render(handle: &OfflineHandle, secs: f32) -> Vec<f32> {
    let mut buf = vec![0.0f32; (secs * SAMPLE_RATE as f32) as usize];
    assert!(handle.render(&mut buf, 1), "graph is not running");
    buf
}
