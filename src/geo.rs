//! Great-circle distance and listener position acquisition.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{ReceiverError, Result};

/// Mean Earth radius in kilometres (spherical model)
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the Earth's surface in degrees
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    #[serde(alias = "lng")]
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True when both coordinates are finite and within their ranges
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Great-circle distance to `other` in km
    pub fn distance_km(&self, other: &LatLon) -> f64 {
        distance_km(self.lat, self.lon, other.lat, other.lon)
    }
}

/// Great-circle distance between two lat/lon points in km using the
/// Haversine formula.
///
/// Zero for identical points and symmetric in its arguments. NaN inputs
/// produce NaN.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for antipodal points
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// One-shot source of the listener's position
pub trait PositionSource: Send {
    fn acquire(&mut self) -> Result<LatLon>;

    fn name(&self) -> &'static str;
}

/// A position known up front (command line or config)
pub struct FixedPosition(pub LatLon);

impl PositionSource for FixedPosition {
    fn acquire(&mut self) -> Result<LatLon> {
        if self.0.is_valid() {
            Ok(self.0)
        } else {
            Err(ReceiverError::Position(format!(
                "invalid coordinates {:?}",
                self.0
            )))
        }
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Position from the `SHORTWAVE_LAT` / `SHORTWAVE_LON` environment variables
pub struct EnvPosition;

impl EnvPosition {
    pub const LAT_VAR: &'static str = "SHORTWAVE_LAT";
    pub const LON_VAR: &'static str = "SHORTWAVE_LON";

    fn read(var: &str) -> Result<f64> {
        let raw = std::env::var(var)
            .map_err(|_| ReceiverError::Position(format!("{} is not set", var)))?;
        raw.trim()
            .parse()
            .map_err(|_| ReceiverError::Position(format!("{} is not a number: {}", var, raw)))
    }
}

impl PositionSource for EnvPosition {
    fn acquire(&mut self) -> Result<LatLon> {
        let pos = LatLon::new(Self::read(Self::LAT_VAR)?, Self::read(Self::LON_VAR)?);
        FixedPosition(pos).acquire()
    }

    fn name(&self) -> &'static str {
        "environment"
    }
}

/// Run a position source on a helper thread, giving up after `timeout`
pub fn acquire_with_timeout(
    mut source: Box<dyn PositionSource>,
    timeout: Duration,
) -> Result<LatLon> {
    let name = source.name();
    let (tx, rx) = crossbeam_channel::bounded(1);

    std::thread::spawn(move || {
        let _ = tx.send(source.acquire());
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(_) => Err(ReceiverError::Position(format!(
            "{} source timed out after {:?}",
            name, timeout
        ))),
    }
}

/// Try each source in turn, falling back to `default` when none yields a fix
pub fn acquire_or_default(
    sources: Vec<Box<dyn PositionSource>>,
    timeout: Duration,
    default: LatLon,
) -> LatLon {
    for source in sources {
        let name = source.name();
        match acquire_with_timeout(source, timeout) {
            Ok(pos) => {
                log::info!(
                    "Listener position from {} source: {:.4}, {:.4}",
                    name,
                    pos.lat,
                    pos.lon
                );
                return pos;
            }
            Err(e) => log::debug!("Position source {} failed: {}", name, e),
        }
    }

    log::warn!(
        "No listener position available, using default {:.4}, {:.4}",
        default.lat,
        default.lon
    );
    default
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct SlowPosition;

    impl PositionSource for SlowPosition {
        fn acquire(&mut self) -> Result<LatLon> {
            std::thread::sleep(Duration::from_secs(5));
            Ok(LatLon::new(0.0, 0.0))
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    struct DeniedPosition;

    impl PositionSource for DeniedPosition {
        fn acquire(&mut self) -> Result<LatLon> {
            Err(ReceiverError::Position("permission denied".into()))
        }

        fn name(&self) -> &'static str {
            "denied"
        }
    }

    #[test]
    fn test_distance_identical_points_is_zero() {
        for (lat, lon) in [(0.0, 0.0), (51.5, -0.12), (-33.9, 151.2), (89.9, 179.9)] {
            assert_eq!(distance_km(lat, lon, lat, lon), 0.0);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let pairs = [
            ((51.5, -0.12), (40.7, -74.0)),
            ((-33.9, 151.2), (35.7, 139.7)),
            ((0.0, 179.0), (0.0, -179.0)),
        ];
        for ((a_lat, a_lon), (b_lat, b_lon)) in pairs {
            assert_eq!(
                distance_km(a_lat, a_lon, b_lat, b_lon),
                distance_km(b_lat, b_lon, a_lat, a_lon)
            );
        }
    }

    #[test]
    fn test_distance_known_values() {
        // London to New York, roughly 5570 km
        let d = distance_km(51.5074, -0.1278, 40.7128, -74.0060);
        assert!((d - 5570.0).abs() < 20.0, "got {}", d);

        // One degree of latitude
        assert_relative_eq!(
            distance_km(0.0, 0.0, 1.0, 0.0),
            EARTH_RADIUS_KM * 1.0_f64.to_radians(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_distance_antipodal_is_half_circumference() {
        let d = distance_km(0.0, 0.0, 0.0, 180.0);
        assert_relative_eq!(d, std::f64::consts::PI * EARTH_RADIUS_KM, epsilon = 1e-6);
    }

    #[test]
    fn test_distance_nan_propagates() {
        assert!(distance_km(f64::NAN, 0.0, 1.0, 1.0).is_nan());
    }

    #[test]
    fn test_latlon_deserializes_lng_alias() {
        let pos: LatLon = serde_json::from_str(r#"{"lat": 10.0, "lng": 20.0}"#).unwrap();
        assert_eq!(pos, LatLon::new(10.0, 20.0));
    }

    #[test]
    fn test_fixed_position_rejects_out_of_range() {
        assert!(FixedPosition(LatLon::new(95.0, 0.0)).acquire().is_err());
        assert!(FixedPosition(LatLon::new(10.0, 20.0)).acquire().is_ok());
    }

    #[test]
    fn test_acquire_times_out() {
        let result = acquire_with_timeout(Box::new(SlowPosition), Duration::from_millis(20));
        assert!(matches!(result, Err(ReceiverError::Position(_))));
    }

    #[test]
    fn test_acquire_or_default_falls_back() {
        let default = LatLon::new(51.5074, -0.1278);
        let pos = acquire_or_default(
            vec![Box::new(DeniedPosition)],
            Duration::from_millis(100),
            default,
        );
        assert_eq!(pos, default);
    }

    #[test]
    fn test_acquire_or_default_uses_first_fix() {
        let pos = acquire_or_default(
            vec![
                Box::new(DeniedPosition),
                Box::new(FixedPosition(LatLon::new(48.85, 2.35))),
            ],
            Duration::from_millis(500),
            LatLon::new(0.0, 0.0),
        );
        assert_eq!(pos, LatLon::new(48.85, 2.35));
    }
}
