mod common;

use std::time::Duration;

use shortwave::audio::{AudioEngine, OfflineOutput};
use shortwave::display::MeterReading;
use shortwave::propagation::FixedClock;
use shortwave::scheduler::ManualStepper;
use shortwave::station::load_catalogue;
use shortwave::{LatLon, ReceiverConfig, ReceiverSession, save_wav};

use common::{TICK, listener, offline_session, render, rms, stations, tone};

/// Tick and render in lockstep so smoothed parameters settle
fn run(session: &mut ReceiverSession, handle: &shortwave::audio::OfflineHandle, ticks: usize) {
    let mut stepper = ManualStepper::new(TICK);
    let mut display: Vec<MeterReading> = Vec::new();
    for _ in 0..ticks {
        stepper.step(session, &mut display);
        render(handle, TICK.as_secs_f32());
    }
}

#[test]
fn test_static_only_before_any_station() {
    let (mut session, handle) = offline_session(12.0);
    session.set_listener(listener());
    run(&mut session, &handle, 5);

    let audio = render(&handle, 0.5);
    assert!(rms(&audio) > 0.005, "static should be audible");
    assert!(audio.iter().all(|s| s.abs() <= 1.0));
    assert_eq!(session.engine().current_asset(), None);
}

#[test]
fn test_tuning_onto_station_brings_up_programme() {
    let (mut session, handle) = offline_session(12.0);
    session.set_stations(stations());
    session.set_listener(listener());

    session.dial_mut().set(12000.0);
    run(&mut session, &handle, 10);
    let off_station = rms(&render(&handle, 0.5));

    session.dial_mut().set(9600.0);
    run(&mut session, &handle, 10);
    let on_station = rms(&render(&handle, 0.5));

    assert_eq!(session.engine().current_asset(), Some("relay.wav"));
    assert!(
        on_station > off_station,
        "on {} vs off {}",
        on_station,
        off_station
    );

    let applied = session.last_applied().unwrap();
    assert!(applied.base.noise_gain < session.config().mapping.noise_gain_loud);
    assert!(applied.faded_station_gain >= 0.0);
}

#[test]
fn test_output_never_clips() {
    let (mut session, handle) = offline_session(23.0);
    let mut loud = stations();
    loud[0].power_watts = 1e9;
    session.set_stations(loud);
    session.set_listener(listener());
    run(&mut session, &handle, 20);

    let audio = render(&handle, 1.0);
    assert!(audio.iter().all(|s| s.is_finite() && s.abs() <= 1.0));
}

#[test]
fn test_sweep_finds_both_stations() {
    let (mut session, handle) = offline_session(12.0);
    session.set_stations(stations());
    session.set_listener(listener());

    let mut stepper = ManualStepper::new(TICK);
    let mut display: Vec<MeterReading> = Vec::new();
    let mut khz = 6000.0;
    while khz <= 9700.0 {
        session.dial_mut().set(khz);
        stepper.step(&mut session, &mut display);
        render(&handle, 0.01);
        khz += 5.0;
    }

    let heard: Vec<&str> = display
        .iter()
        .filter(|r| r.fraction > 0.1)
        .filter_map(|r| r.station.as_deref())
        .collect();
    assert!(heard.contains(&"Channel Relay"));
    assert!(heard.contains(&"Atlantic Service"));
}

#[test]
fn test_catalogue_assets_resolve_next_to_catalogue() {
    let dir = std::env::temp_dir().join(format!("shortwave-catalogue-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let asset = dir.join("relay.wav");
    save_wav(asset.to_str().unwrap(), &tone(800.0, 0.5, 0.4), 1, 22050).unwrap();

    let catalogue = dir.join("stations.json");
    std::fs::write(
        &catalogue,
        r#"[
            {"name": "Relay", "lat": 51.0, "lng": -0.10, "frequency_khz": 9600, "power_watts": 50000, "audio": "relay.wav"},
            {"name": "Broken", "lat": "north", "lng": 0.0, "frequency_khz": 7000, "power_watts": 1, "audio": "x.wav"}
        ]"#,
    )
    .unwrap();

    let stations = load_catalogue(catalogue.to_str().unwrap(), Duration::from_secs(1)).unwrap();
    assert_eq!(stations.len(), 1);
    assert_eq!(stations[0].audio, asset.to_string_lossy());

    let config = ReceiverConfig::default();
    let (output, handle) = OfflineOutput::new();
    let engine = AudioEngine::new(&config.audio, &config.mapping, Box::new(output));
    let mut session =
        ReceiverSession::new(config, engine, Box::new(FixedClock::at_utc_hour(12.0)));
    session.set_stations(stations);
    session.set_listener(LatLon::new(51.5, -0.12));

    let reading = session.tick(TICK, &mut Vec::<MeterReading>::new());
    assert_eq!(reading.station.as_deref(), Some("Relay"));
    render(&handle, 0.1);
    let playing = handle
        .with_graph(|g| g.current_asset().map(str::to_string))
        .flatten();
    assert_eq!(playing, Some(asset.to_string_lossy().into_owned()));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_stop_silences_and_start_recovers() {
    let (mut session, handle) = offline_session(12.0);
    session.set_stations(stations());
    session.set_listener(listener());
    run(&mut session, &handle, 3);

    session.stop();
    session.stop();
    assert!(!handle.is_running());

    // Ticking on does not bring the audio back
    let mut stepper = ManualStepper::new(TICK);
    for _ in 0..3 {
        stepper.step(&mut session, &mut Vec::<MeterReading>::new());
    }
    assert!(!handle.is_running());
    assert_eq!(handle.start_count(), 1);

    assert!(session.start());
    run(&mut session, &handle, 3);
    assert_eq!(session.engine().current_asset(), Some("relay.wav"));
    assert_eq!(handle.start_count(), 2);
}

#[test]
fn test_stop_fades_out_to_silence() {
    let (mut session, handle) = offline_session(12.0);
    session.set_stations(stations());
    session.set_listener(listener());
    run(&mut session, &handle, 10);

    session.stop();
    let tail = handle.take_release_tail();
    assert!(tail.len() > 4800);
    assert!(rms(&tail[..4800]) > 0.01, "release should start from the programme");
    let end = &tail[tail.len() - 64..];
    assert!(end.iter().all(|s| s.abs() < 1e-3), "release ends at {:?}", end.last());
}

#[test]
fn test_retune_after_stalled_output_reaches_graph() {
    let (mut session, handle) = offline_session(12.0);
    session.set_stations(stations());
    session.set_listener(listener());

    // The output stops pulling while the scheduler keeps ticking
    let mut stepper = ManualStepper::new(TICK);
    let mut display: Vec<MeterReading> = Vec::new();
    for _ in 0..30 {
        stepper.step(&mut session, &mut display);
    }
    session.dial_mut().set(6070.0);
    stepper.step(&mut session, &mut display);

    run(&mut session, &handle, 5);
    let playing = handle
        .with_graph(|g| g.current_asset().map(str::to_string))
        .flatten();
    assert_eq!(playing.as_deref(), Some("atlantic.wav"));
    assert_eq!(session.engine().current_asset(), Some("atlantic.wav"));
}
