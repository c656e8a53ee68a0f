use super::{Formatter, MeterReading, iso8601_timestamp};

pub struct JsonFormatter;

#[derive(serde::Serialize)]
struct JsonLine<'a> {
    ts: String,
    #[serde(flatten)]
    reading: &'a MeterReading,
}

impl Formatter for JsonFormatter {
    fn format(&self, reading: &MeterReading) -> String {
        let line = JsonLine {
            ts: iso8601_timestamp(),
            reading,
        };
        serde_json::to_string(&line).unwrap_or_else(|e| format!(r#"{{"error":"{}"}}"#, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::tests::reading;

    #[test]
    fn test_json_line_fields() {
        let line = JsonFormatter.format(&reading());
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["tuned_khz"], 9600.0);
        assert_eq!(value["station"], "Radio Example");
        assert_eq!(value["scanning"], false);
        assert!(value["ts"].as_str().unwrap().ends_with('Z'));
    }
}
