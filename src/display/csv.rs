use super::{Formatter, MeterReading, iso8601_timestamp};

pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format(&self, reading: &MeterReading) -> String {
        let station = reading
            .station
            .as_deref()
            .map_or(String::new(), |s| format!("\"{}\"", s.replace('"', "\"\"")));
        let carrier = reading
            .station_khz
            .map_or(String::new(), |f| format!("{:.1}", f));
        let distance = reading
            .distance_km
            .map_or(String::new(), |d| format!("{:.1}", d));
        let night = reading.night.map_or(String::new(), |n| n.to_string());
        format!(
            "{},{:.1},{:.4},{},{},{},{},{}",
            iso8601_timestamp(),
            reading.tuned_khz,
            reading.fraction,
            station,
            carrier,
            distance,
            night,
            reading.scanning
        )
    }

    fn header(&self) -> Option<&'static str> {
        Some("ts,tuned_khz,fraction,station,station_khz,distance_km,night,scanning")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::tests::reading;

    #[test]
    fn test_csv_matches_header() {
        let line = CsvFormatter.format(&reading());
        let header = CsvFormatter.header().unwrap();
        assert_eq!(line.split(',').count(), header.split(',').count());
        assert!(line.contains("\"Radio Example\""));
    }
}
