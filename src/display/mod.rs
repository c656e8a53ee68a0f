//! Receiver readout: what the meter and the "nearest station" label show.

mod csv;
mod json;
mod text;

use std::io::Write;
use std::time::{Duration, Instant};

use chrono::Utc;

pub use self::csv::CsvFormatter;
pub use self::json::JsonFormatter;
pub use self::text::TextFormatter;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

/// One tick's worth of display state
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MeterReading {
    pub tuned_khz: f64,
    /// Best signal fraction in `[0, 1]`
    pub fraction: f64,
    pub station: Option<String>,
    pub station_khz: Option<f64>,
    pub distance_km: Option<f64>,
    pub night: Option<bool>,
    pub scanning: bool,
}

impl MeterReading {
    /// Meter width in percent
    pub fn percent(&self) -> f64 {
        (self.fraction * 100.0).clamp(0.0, 100.0)
    }
}

pub trait Formatter: Send {
    fn format(&self, reading: &MeterReading) -> String;

    fn header(&self) -> Option<&'static str> {
        None
    }
}

pub fn create_formatter(format: OutputFormat, verbose: bool) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(verbose)),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Csv => Box::new(CsvFormatter),
    }
}

pub fn iso8601_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Sink for meter readings (the UI side of the receiver)
pub trait MeterDisplay {
    fn show(&mut self, reading: &MeterReading);
}

/// Keeps every reading; used by offline runs and tests
impl MeterDisplay for Vec<MeterReading> {
    fn show(&mut self, reading: &MeterReading) {
        self.push(reading.clone());
    }
}

/// Prints formatted readings to stdout, at most once per `interval`
///
/// A changed station label is always printed straight away.
pub struct ConsoleDisplay {
    formatter: Box<dyn Formatter>,
    interval: Duration,
    last_output: Option<Instant>,
    last_station: Option<String>,
    header_printed: bool,
}

impl ConsoleDisplay {
    pub fn new(formatter: Box<dyn Formatter>, interval: Duration) -> Self {
        Self {
            formatter,
            interval,
            last_output: None,
            last_station: None,
            header_printed: false,
        }
    }
}

impl MeterDisplay for ConsoleDisplay {
    fn show(&mut self, reading: &MeterReading) {
        if !self.header_printed {
            if let Some(header) = self.formatter.header() {
                println!("{}", header);
            }
            self.header_printed = true;
        }

        let station_changed = reading.station != self.last_station;
        let due = self
            .last_output
            .is_none_or(|t| t.elapsed() >= self.interval);
        if !(station_changed || due) {
            return;
        }

        println!("{}", self.formatter.format(reading));
        let _ = std::io::stdout().flush();
        self.last_output = Some(Instant::now());
        self.last_station = reading.station.clone();
    }
}
