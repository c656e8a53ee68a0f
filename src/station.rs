//! Station records and the JSON station catalogue.
//!
//! The catalogue is an array of objects:
//!
//! ```json
//! [
//!   { "label": "Radio Example", "lat": 51.0, "lng": -0.1,
//!     "frequency_khz": 9600.0, "power_watts": 50000.0, "audio": "audio/example.wav" }
//! ]
//! ```
//!
//! `lon` is accepted for `lng` and `name` for `label`. Entries with missing or
//! nonsensical fields are skipped, never passed on half-filled.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::config::CatalogueConfig;
use crate::error::{ReceiverError, Result};
use crate::geo::LatLon;

/// A virtual transmitting station
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub label: String,
    pub position: LatLon,
    /// Transmit power in watts (always positive)
    pub power_watts: f64,
    /// Carrier frequency in kHz
    pub frequency_khz: f64,
    /// Audio asset path played while the station is selected
    pub audio: String,
}

impl Station {
    pub fn new(
        label: impl Into<String>,
        position: LatLon,
        power_watts: f64,
        frequency_khz: f64,
        audio: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            position,
            power_watts,
            frequency_khz,
            audio: audio.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawStation {
    #[serde(alias = "name")]
    label: Option<String>,
    lat: Option<f64>,
    #[serde(alias = "lng")]
    lon: Option<f64>,
    frequency_khz: Option<f64>,
    power_watts: Option<f64>,
    audio: Option<String>,
}

impl RawStation {
    fn validate(self) -> std::result::Result<Station, String> {
        let lat = self.lat.ok_or("missing lat")?;
        let lon = self.lon.ok_or("missing lng/lon")?;
        let position = LatLon::new(lat, lon);
        if !position.is_valid() {
            return Err(format!("coordinates out of range: {}, {}", lat, lon));
        }

        let frequency_khz = self.frequency_khz.ok_or("missing frequency_khz")?;
        if !(frequency_khz.is_finite() && frequency_khz > 0.0) {
            return Err(format!("invalid frequency_khz {}", frequency_khz));
        }

        let power_watts = self.power_watts.ok_or("missing power_watts")?;
        if !(power_watts.is_finite() && power_watts > 0.0) {
            return Err(format!("invalid power_watts {}", power_watts));
        }

        let audio = self
            .audio
            .filter(|a| !a.trim().is_empty())
            .ok_or("missing audio")?;

        let label = self
            .label
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| format!("{:.0} kHz", frequency_khz));

        Ok(Station {
            label,
            position,
            power_watts,
            frequency_khz,
            audio,
        })
    }
}

/// Parse a catalogue document, skipping malformed entries
///
/// Fails only when the document itself is not a JSON array.
pub fn parse_catalogue(json: &str) -> Result<Vec<Station>> {
    let entries: Vec<serde_json::Value> =
        serde_json::from_str(json).map_err(|e| ReceiverError::Catalogue(e.to_string()))?;

    let mut stations = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let parsed = serde_json::from_value::<RawStation>(entry)
            .map_err(|e| e.to_string())
            .and_then(RawStation::validate);
        match parsed {
            Ok(station) => stations.push(station),
            Err(reason) => log::warn!("Skipping catalogue entry {}: {}", index, reason),
        }
    }

    Ok(stations)
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

fn fetch_url(url: &str, timeout: Duration) -> Result<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ReceiverError::Catalogue(e.to_string()))?;

    client
        .get(url)
        .send()
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.text())
        .map_err(|e| ReceiverError::Catalogue(format!("{}: {}", url, e)))
}

/// Make relative audio paths relative to the catalogue file's directory
fn resolve_assets(stations: &mut [Station], base: &Path) {
    for station in stations.iter_mut() {
        let audio = PathBuf::from(&station.audio);
        if audio.is_relative() {
            station.audio = base.join(audio).to_string_lossy().into_owned();
        }
    }
}

/// Load a catalogue from a local path or an `http(s)://` URL
pub fn load_catalogue(source: &str, timeout: Duration) -> Result<Vec<Station>> {
    if is_url(source) {
        let body = fetch_url(source, timeout)?;
        return parse_catalogue(&body);
    }

    let path = Path::new(source);
    let body = std::fs::read_to_string(path)
        .map_err(|e| ReceiverError::Catalogue(format!("{}: {}", path.display(), e)))?;
    let mut stations = parse_catalogue(&body)?;
    if let Some(base) = path.parent() {
        resolve_assets(&mut stations, base);
    }
    Ok(stations)
}

/// Load the configured catalogue; any failure leaves the station set empty
pub fn load_catalogue_or_empty(config: &CatalogueConfig) -> Vec<Station> {
    let timeout = Duration::from_secs(config.fetch_timeout_secs);
    match load_catalogue(&config.source, timeout) {
        Ok(stations) => {
            log::info!(
                "Loaded {} stations from {}",
                stations.len(),
                config.source
            );
            stations
        }
        Err(e) => {
            log::warn!("Station catalogue unavailable, no signal anywhere: {}", e);
            Vec::new()
        }
    }
}
