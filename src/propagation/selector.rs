use chrono::{DateTime, Utc};

use crate::geo::LatLon;
use crate::propagation::PropagationModel;
use crate::station::Station;

/// Strongest station at the tuned frequency
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestMatch<'a> {
    pub station: Option<&'a Station>,
    /// Position of `station` in the scanned slice
    pub index: Option<usize>,
    pub fraction: f64,
}

impl BestMatch<'_> {
    pub const NONE: BestMatch<'static> = BestMatch {
        station: None,
        index: None,
        fraction: 0.0,
    };
}

impl PropagationModel {
    /// Scan `stations` and keep the strict maximum fraction
    ///
    /// Ties keep the earlier station, so the result is deterministic for a
    /// given catalogue order. An empty slice yields [`BestMatch::NONE`].
    pub fn select_best<'a>(
        &self,
        stations: &'a [Station],
        tuned_khz: f64,
        listener: Option<&LatLon>,
        now: DateTime<Utc>,
    ) -> BestMatch<'a> {
        let mut best = BestMatch::NONE;

        for (index, station) in stations.iter().enumerate() {
            let fraction = self.signal_fraction(station, tuned_khz, listener, now);
            // Strictly above the running best, which starts at 0: nothing
            // audible means no station
            if fraction > best.fraction {
                best = BestMatch {
                    station: Some(station),
                    index: Some(index),
                    fraction,
                };
            }
        }

        best
    }
}
