//! Day/night classification from approximate local solar time.
//!
//! Local hour is UTC plus `longitude / 15` hours, wrapped into `[0, 24)`.
//! No equation of time, no season: it only has to decide whether a path is
//! "night-ish" for the propagation heuristic.

use chrono::{DateTime, TimeDelta, Timelike, Utc};

use crate::config::DayNightConfig;

/// Source of the current instant
pub trait Clock: Send {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// 1970-01-01 at the given UTC hour (fractional hours allowed)
    pub fn at_utc_hour(hour: f64) -> Self {
        let minutes = (hour.rem_euclid(24.0) * 60.0).round() as i64;
        Self(DateTime::<Utc>::UNIX_EPOCH + TimeDelta::minutes(minutes))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Approximate local solar hour at `longitude` for the instant `now`
pub fn local_solar_hour(longitude: f64, now: DateTime<Utc>) -> f64 {
    let utc_hours = now.hour() as f64
        + now.minute() as f64 / 60.0
        + now.second() as f64 / 3600.0
        + now.nanosecond() as f64 / 3.6e12;
    (utc_hours + longitude / 15.0).rem_euclid(24.0)
}

/// Night classification of a station at `longitude` for the instant `now`
pub fn is_night_at(longitude: f64, now: DateTime<Utc>, config: &DayNightConfig) -> bool {
    let hour = local_solar_hour(longitude, now);
    let (start, end) = (config.night_start_hour, config.night_end_hour);
    if start > end {
        // Window spans midnight
        hour >= start || hour < end
    } else {
        hour >= start && hour < end
    }
}

/// Night classification against the current wall-clock time
pub fn is_night(longitude: f64, config: &DayNightConfig) -> bool {
    is_night_at(longitude, Utc::now(), config)
}
