use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use shortwave::audio::{AudioClip, AudioEngine, OfflineOutput};
use shortwave::display::{MeterReading, OutputFormat, create_formatter};
use shortwave::propagation::FixedClock;
use shortwave::scheduler::ManualStepper;
use shortwave::station::load_catalogue;
use shortwave::{LatLon, ReceiverConfig, ReceiverSession, save_wav};

#[derive(Parser, Debug)]
#[command(name = "render_wav")]
#[command(about = "Render a receiver sweep across the band to a WAV file")]
struct Args {
    /// Station catalogue (path or http(s) URL)
    catalogue: String,

    /// Output WAV file
    #[arg(short, long, default_value = "sweep.wav")]
    output: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listener latitude in degrees
    #[arg(long, allow_hyphen_values = true, default_value_t = 51.5074)]
    lat: f64,

    /// Listener longitude in degrees
    #[arg(long, allow_hyphen_values = true, default_value_t = -0.1278)]
    lon: f64,

    /// Sweep start in kHz
    #[arg(long, default_value_t = 5900.0)]
    from: f64,

    /// Sweep end in kHz
    #[arg(long, default_value_t = 6200.0)]
    to: f64,

    /// Sweep duration in seconds
    #[arg(short, long, default_value_t = 10.0)]
    duration: f32,

    /// UTC hour of day to simulate (decimal, e.g. 22.5)
    #[arg(long, default_value_t = 12.0)]
    utc_hour: f64,

    /// Seed for fading jitter and static
    #[arg(short, long, default_value_t = 1)]
    seed: u64,

    /// Print one meter line per tick: text, json, csv
    #[arg(short = 'f', long, value_enum)]
    meter: Option<OutputFormat>,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if args.duration <= 0.0 {
        bail!("duration must be positive");
    }

    let mut config = match &args.config {
        Some(path) => ReceiverConfig::load(path)?,
        None => ReceiverConfig::default(),
    };
    config.qsb.seed = Some(args.seed);

    let stations = load_catalogue(
        &args.catalogue,
        Duration::from_secs(config.catalogue.fetch_timeout_secs),
    )
    .with_context(|| format!("loading catalogue {}", args.catalogue))?;
    println!("Loaded {} stations", stations.len());

    let sample_rate = config.audio.sample_rate;
    let channels = config.audio.channels;
    let (output, handle) = OfflineOutput::new();
    let mut engine = AudioEngine::new(&config.audio, &config.mapping, Box::new(output))
        .with_noise_seed(args.seed);
    for station in &stations {
        match AudioClip::load_wav(&station.audio, sample_rate) {
            Ok(clip) => engine.preload(clip),
            Err(e) => log::warn!("{}: {}", station.label, e),
        }
    }

    let period = Duration::from_millis(config.scheduler.period_ms);
    let mut session = ReceiverSession::new(
        config,
        engine,
        Box::new(FixedClock::at_utc_hour(args.utc_hour)),
    );
    session.set_listener(LatLon::new(args.lat, args.lon));
    session.set_stations(stations);

    let total_ticks = ((args.duration as f64) / period.as_secs_f64()).ceil().max(1.0) as u64;
    let frames_per_tick = (sample_rate as f64 * period.as_secs_f64()).round() as usize;
    let mut samples = vec![0.0f32; total_ticks as usize * frames_per_tick * channels as usize];

    let formatter = args.meter.map(|f| create_formatter(f, args.verbose > 0));
    if let Some(header) = formatter.as_ref().and_then(|f| f.header()) {
        println!("{}", header);
    }

    let mut stepper = ManualStepper::new(period);
    let mut readings: Vec<MeterReading> = Vec::new();
    let chunk_len = frames_per_tick * channels as usize;

    for (i, chunk) in samples.chunks_mut(chunk_len).enumerate() {
        let t = i as f64 / (total_ticks.saturating_sub(1).max(1)) as f64;
        session.dial_mut().set(args.from + (args.to - args.from) * t);

        let reading = stepper.step(&mut session, &mut readings);
        if let Some(f) = &formatter {
            println!("{}", f.format(&reading));
        }

        if !handle.render(chunk, channels as usize) {
            log::warn!("Graph not running at tick {}", i);
        }
    }

    session.stop();
    samples.extend(handle.take_release_tail());

    let output = args.output.to_string_lossy();
    save_wav(&output, &samples, channels, sample_rate)
        .with_context(|| format!("writing {}", output))?;

    let peak = readings
        .iter()
        .max_by(|a, b| a.fraction.total_cmp(&b.fraction));
    println!(
        "Wrote {} ({:.1} s, {} ticks)",
        output,
        stepper.elapsed().as_secs_f32(),
        stepper.ticks()
    );
    if let Some(peak) = peak {
        println!(
            "Strongest: {} at {:.1} kHz ({:.0}%)",
            peak.station.as_deref().unwrap_or("(none)"),
            peak.tuned_khz,
            peak.percent()
        );
    }

    Ok(())
}
