mod common;

use approx::assert_relative_eq;
use shortwave::propagation::{FixedClock, PropagationModel, is_night_at};
use shortwave::{LatLon, ReceiverConfig, Station};

use common::{listener, stations};

#[test]
fn test_night_path_is_stronger_than_day_path() {
    let model = PropagationModel::default();
    let relay = &stations()[0];

    let night = FixedClock::at_utc_hour(23.0).0;
    let day = FixedClock::at_utc_hour(12.0).0;
    let config = ReceiverConfig::default();
    assert!(is_night_at(relay.position.lon, night, &config.daynight));
    assert!(!is_night_at(relay.position.lon, day, &config.daynight));

    let f_night = model.signal_fraction(relay, 9600.0, Some(&listener()), night);
    let f_day = model.signal_fraction(relay, 9600.0, Some(&listener()), day);

    assert!(f_night > f_day, "night {} vs day {}", f_night, f_day);
    assert!(f_day > 0.0 && f_night < 1.0);
}

#[test]
fn test_stronger_transmitter_wins_at_same_distance() {
    let model = PropagationModel::default();
    let here = LatLon::new(0.0, 0.0);
    // ~10 km north
    let site = LatLon::new(0.09, 0.0);
    let stations = vec![
        Station::new("A", site, 100.0, 9600.0, "a.wav"),
        Station::new("B", site, 10.0, 9600.0, "b.wav"),
    ];
    let now = FixedClock::at_utc_hour(12.0).0;

    let best = model.select_best(&stations, 9600.0, Some(&here), now);
    assert_eq!(best.station.map(|s| s.label.as_str()), Some("A"));
    assert_eq!(best.index, Some(0));

    // Fraction reported is the winner's own fraction
    let expected = model.signal_fraction(&stations[0], 9600.0, Some(&here), now);
    assert_relative_eq!(best.fraction, expected, epsilon = 1e-12);
}

#[test]
fn test_tuning_picks_the_station_on_frequency() {
    let model = PropagationModel::default();
    let stations = stations();
    let now = FixedClock::at_utc_hour(12.0).0;

    let at_relay = model.select_best(&stations, 9600.0, Some(&listener()), now);
    assert_eq!(at_relay.index, Some(0));

    let at_atlantic = model.select_best(&stations, 6070.0, Some(&listener()), now);
    assert_eq!(at_atlantic.index, Some(1));
    // ~5600 km away, so much weaker than the relay on its own frequency
    assert!(at_atlantic.fraction < at_relay.fraction);
}

#[test]
fn test_far_off_frequency_is_silent() {
    let model = PropagationModel::default();
    let now = FixedClock::at_utc_hour(23.0).0;
    for station in stations() {
        let f = model.signal_fraction(&station, 20000.0, Some(&listener()), now);
        assert!(f < 1e-6, "{} leaked {}", station.label, f);
    }
}

#[test]
fn test_no_listener_means_no_signal() {
    let model = PropagationModel::default();
    let now = FixedClock::at_utc_hour(12.0).0;
    let stations = stations();
    let best = model.select_best(&stations, 9600.0, None, now);
    assert_eq!(best.fraction, 0.0);
    assert!(best.station.is_none());
}

#[test]
fn test_colocated_station_stays_bounded() {
    let model = PropagationModel::default();
    let station = Station::new("Here", listener(), 1_000_000.0, 9600.0, "x.wav");
    let now = FixedClock::at_utc_hour(23.0).0;
    let f = model.signal_fraction(&station, 9600.0, Some(&listener()), now);
    assert!(f.is_finite());
    assert!(f > 0.99 && f < 1.0);
}
