//! Audio engine: owns the lifecycle of the [`RadioGraph`] and is the only
//! writer of its parameters.
//!
//! The engine never fails loudly. Parameter writes before the graph exists
//! are dropped (the next tick resends full state), a device that refuses to
//! start or a [`teardown`](AudioEngine::teardown) leaves the engine inert
//! until [`AudioEngine::resume`], and an asset that cannot be decoded plays
//! as silence.

use std::time::Duration;

use crossbeam_channel::{Sender, TrySendError, bounded};

use super::clip::{AudioClip, ClipLibrary};
use super::graph::{GraphCommand, RadioGraph};
use super::noise::{create_rng, white_noise_buffer};
use super::output::AudioOutput;
use crate::config::{AudioConfig, MappingConfig};

pub struct AudioEngine {
    audio: AudioConfig,
    mapping: MappingConfig,
    noise_seed: Option<u64>,
    output: Box<dyn AudioOutput>,
    commands: Option<Sender<GraphCommand>>,
    start_failed: bool,
    stopped: bool,
    library: ClipLibrary,
    current_asset: Option<String>,
}

impl AudioEngine {
    pub fn new(audio: &AudioConfig, mapping: &MappingConfig, output: Box<dyn AudioOutput>) -> Self {
        Self {
            audio: audio.clone(),
            mapping: mapping.clone(),
            noise_seed: None,
            output,
            commands: None,
            start_failed: false,
            stopped: false,
            library: ClipLibrary::new(audio.sample_rate),
            current_asset: None,
        }
    }

    /// Use a fixed seed for the static buffer
    pub fn with_noise_seed(mut self, seed: u64) -> Self {
        self.noise_seed = Some(seed);
        self
    }

    /// Make an already decoded clip available under its asset name
    pub fn preload(&mut self, clip: AudioClip) {
        self.library.insert(clip);
    }

    /// Decode every asset up front so a later switch never touches the disk
    ///
    /// Returns how many assets are now playable. Failures are remembered and
    /// play as silence.
    pub fn preload_assets<'a>(&mut self, assets: impl IntoIterator<Item = &'a str>) -> usize {
        assets
            .into_iter()
            .filter(|asset| self.library.get_or_load(asset).is_some())
            .count()
    }

    /// Build and start the graph once per session
    ///
    /// Returns whether the graph is running. Safe to call on every tick: once
    /// running it does nothing, and after a failed start or a
    /// [`teardown`](Self::teardown) it stays quiet until
    /// [`resume`](Self::resume) is called.
    pub fn init(&mut self) -> bool {
        if self.commands.is_some() {
            return true;
        }
        if self.start_failed || self.stopped {
            return false;
        }

        let mut rng = create_rng(self.noise_seed);
        let noise = white_noise_buffer(
            self.audio.noise_buffer_secs,
            self.audio.sample_rate,
            self.audio.noise_amplitude,
            &mut rng,
        );
        let (tx, rx) = bounded(self.audio.command_queue_len.max(1));

        let started = RadioGraph::new(&self.audio, &self.mapping, noise, rx)
            .and_then(|graph| self.output.start(graph));

        match started {
            Ok(()) => {
                log::info!(
                    "Audio engine running at {} Hz, {} channels",
                    self.audio.sample_rate,
                    self.audio.channels
                );
                self.commands = Some(tx);
                true
            }
            Err(e) => {
                log::warn!("Audio playback deferred: {}", e);
                self.start_failed = true;
                false
            }
        }
    }

    /// Allow another start after a failure or a stop (an explicit user action)
    pub fn resume(&mut self) -> bool {
        self.start_failed = false;
        self.stopped = false;
        self.init()
    }

    pub fn is_running(&self) -> bool {
        self.commands.is_some()
    }

    /// Queue a command without blocking; returns whether it was queued
    fn send(&mut self, command: GraphCommand) -> bool {
        let Some(tx) = self.commands.as_ref() else {
            return false;
        };
        match tx.try_send(command) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::trace!("Graph command queue full, dropping update");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                log::warn!("Audio graph went away");
                self.commands = None;
                self.current_asset = None;
                false
            }
        }
    }

    /// Retarget the station branch band-pass and gain (gain floored at 0)
    pub fn set_station_params(&mut self, filter_hz: f32, filter_q: f32, gain: f32) {
        self.send(GraphCommand::StationParams {
            filter_hz,
            q: filter_q,
            gain: gain.max(0.0),
        });
    }

    /// Retarget only the station gain (floored at 0)
    pub fn set_station_gain(&mut self, gain: f32) {
        self.send(GraphCommand::StationGain(gain.max(0.0)));
    }

    /// Retarget the noise low-pass cutoff and gain (gain floored at 0)
    pub fn set_noise_params(&mut self, cutoff_hz: f32, gain: f32) {
        self.send(GraphCommand::NoiseParams {
            cutoff_hz,
            gain: gain.max(0.0),
        });
    }

    /// Play `asset` on the station branch; `None` silences it
    ///
    /// Returns true only when a switch was queued. Requesting the asset that
    /// is already playing is a no-op and does not restart it. A switch that
    /// finds the queue full is not recorded, so the next call retries it.
    pub fn switch_station_source(&mut self, asset: Option<&str>) -> bool {
        if !self.is_running() || asset == self.current_asset.as_deref() {
            return false;
        }

        let clip = asset.and_then(|a| self.library.get_or_load(a));
        if !self.send(GraphCommand::SwitchSource(clip)) {
            return false;
        }
        log::debug!("Station source -> {}", asset.unwrap_or("(none)"));
        self.current_asset = asset.map(str::to_string);
        true
    }

    pub fn current_asset(&self) -> Option<&str> {
        self.current_asset.as_deref()
    }

    /// Ramp to silence, then release the output
    ///
    /// Waits at most `release_timeout_ms` for the graph to report silence.
    /// The engine stays stopped until [`resume`](Self::resume). Safe to call
    /// repeatedly.
    pub fn teardown(&mut self) {
        if let Some(tx) = self.commands.take() {
            let timeout = Duration::from_millis(self.audio.release_timeout_ms);
            let (silent_tx, silent_rx) = bounded(1);
            match tx.send_timeout(GraphCommand::Mute(Some(silent_tx)), timeout) {
                Ok(()) => self.output.release(&silent_rx, timeout),
                Err(e) => log::debug!("Mute not delivered: {}", e),
            }
            log::info!("Audio engine stopped");
        }
        self.output.stop();
        self.current_asset = None;
        self.stopped = true;
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.teardown();
    }
}
