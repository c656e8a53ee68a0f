use super::{Formatter, MeterReading};

const METER_WIDTH: usize = 20;

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn meter(fraction: f64) -> String {
        let filled = (fraction.clamp(0.0, 1.0) * METER_WIDTH as f64).round() as usize;
        format!("[{}{}]", "#".repeat(filled), "-".repeat(METER_WIDTH - filled))
    }
}

impl Formatter for TextFormatter {
    fn format(&self, reading: &MeterReading) -> String {
        let station = reading.station.as_deref().unwrap_or("(no signal)");
        let scan = if reading.scanning { " SCAN" } else { "" };
        let base = format!(
            "{} {:>3.0}% {:>8.1} kHz{}  {}",
            Self::meter(reading.fraction),
            reading.percent(),
            reading.tuned_khz,
            scan,
            station
        );

        if !self.verbose {
            return base;
        }

        let carrier = reading
            .station_khz
            .map_or("-".to_string(), |f| format!("{:.1} kHz", f));
        let distance = reading
            .distance_km
            .map_or("-".to_string(), |d| format!("{:.0} km", d));
        let path = match reading.night {
            Some(true) => "night",
            Some(false) => "day",
            None => "-",
        };
        format!(
            "{} [carrier: {}, dist: {}, path: {}, fraction: {:.4}]",
            base, carrier, distance, path, reading.fraction
        )
    }
}
