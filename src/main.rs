use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::unbounded;

use shortwave::audio::{AudioEngine, CpalOutput};
use shortwave::display::{ConsoleDisplay, OutputFormat, create_formatter};
use shortwave::geo::{EnvPosition, FixedPosition, LatLon, PositionSource, acquire_or_default};
use shortwave::propagation::SystemClock;
use shortwave::scheduler::{Control, Scheduler};
use shortwave::station::load_catalogue_or_empty;
use shortwave::{ReceiverConfig, ReceiverSession};

#[derive(Parser, Debug)]
#[command(name = "shortwave")]
#[command(about = "Shortwave receiver simulator: tune across the band and listen for stations")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Station catalogue (path or http(s) URL), overrides the config
    #[arg(short = 'k', long)]
    catalogue: Option<String>,

    /// Listener latitude in degrees
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    lat: Option<f64>,

    /// Listener longitude in degrees
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    lon: Option<f64>,

    /// Initial tuned frequency in kHz
    #[arg(short, long)]
    freq: Option<f64>,

    /// Start scanning straight away
    #[arg(short, long)]
    scan: bool,

    /// Output format: text, json, csv
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Meter lines per second
    #[arg(long, default_value_t = 2.0)]
    output_rate: f32,

    /// Seed for the fading jitter and static
    #[arg(long)]
    seed: Option<u64>,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = match &args.config {
        Some(path) => ReceiverConfig::load(path)?,
        None => ReceiverConfig::default(),
    };
    if let Some(source) = args.catalogue {
        config.catalogue.source = source;
    }
    if let Some(seed) = args.seed {
        config.qsb.seed = Some(seed);
    }

    println!("=== Shortwave Receiver ===");
    println!(
        "Band: {:.0}-{:.0} kHz",
        config.tuning.min_khz, config.tuning.max_khz
    );
    println!("Catalogue: {}", config.catalogue.source);
    println!("Controls: +/- step, <kHz> tune, s scan, x stop scan, on/off audio, q quit");
    println!();

    let mut sources: Vec<Box<dyn PositionSource>> = Vec::new();
    if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        sources.push(Box::new(FixedPosition(LatLon::new(lat, lon))));
    }
    sources.push(Box::new(EnvPosition));
    let listener = acquire_or_default(
        sources,
        Duration::from_millis(config.listener.timeout_ms),
        config.listener.default_position,
    );

    let stations = load_catalogue_or_empty(&config.catalogue);

    let mut engine = AudioEngine::new(
        &config.audio,
        &config.mapping,
        Box::new(CpalOutput::new(&config.audio)),
    );
    if let Some(seed) = config.qsb.seed {
        engine = engine.with_noise_seed(seed);
    }
    let playable = engine.preload_assets(stations.iter().map(|s| s.audio.as_str()));
    log::info!("Decoded {} of {} station assets", playable, stations.len());

    let period = Duration::from_millis(config.scheduler.period_ms);
    let mut session = ReceiverSession::new(config, engine, Box::new(SystemClock));
    session.set_listener(listener);
    session.set_stations(stations);
    if let Some(freq) = args.freq {
        session.dial_mut().set(freq);
    }
    if args.scan {
        session.start_scan();
    }

    let (control_tx, control_rx) = unbounded();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match Control::parse(&line) {
                Some(control) => {
                    if control_tx.send(control).is_err() {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => eprintln!("Unknown command: {}", line.trim()),
            }
        }
    });

    let interval = Duration::from_secs_f32(1.0 / args.output_rate.max(0.1));
    let mut display = ConsoleDisplay::new(
        create_formatter(args.format, args.verbose > 0),
        interval,
    );

    Scheduler::new(period).run(&mut session, &mut display, &control_rx);
    session.stop();

    Ok(())
}
