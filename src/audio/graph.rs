//! Two-branch receiver audio graph
//!
//! ```text
//! station clip (loop) -> band-pass -> station gain -> switch ramp --+
//!                                                                   +-> master gain -> high-pass -> soft clip
//! white noise (loop)  -> low-pass  -> noise gain   ----------------+
//! ```
//!
//! The topology is fixed for the life of the graph. Every parameter change
//! arrives as a [`GraphCommand`] and is applied through a [`SmoothedParam`],
//! so nothing jumps. Filter parameters are smoothed at control rate
//! (`CONTROL_BLOCK` samples), gains per sample.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

use super::clip::{AudioClip, LoopingPlayer};
use super::smoothing::SmoothedParam;
use crate::config::{AudioConfig, MappingConfig};
use crate::constants::FILTER_RETUNE_EPSILON;
use crate::error::Result;
use crate::signal_processing::{Biquad, ButterworthHighpass, Filter};

/// Samples between filter coefficient updates
pub const CONTROL_BLOCK: usize = 64;

/// Parameter updates sent from the engine to the graph
#[derive(Debug, Clone)]
pub enum GraphCommand {
    /// Retarget the station band-pass and base gain
    StationParams { filter_hz: f32, q: f32, gain: f32 },
    /// Retarget only the station gain (QSB modulation)
    StationGain(f32),
    /// Retarget the noise low-pass and gain
    NoiseParams { cutoff_hz: f32, gain: f32 },
    /// Replace the station source; `None` silences the station branch
    SwitchSource(Option<Arc<AudioClip>>),
    /// Ramp both branches to silence; the sender hears once the output is silent
    Mute(Option<Sender<()>>),
}

pub struct RadioGraph {
    commands: Receiver<GraphCommand>,

    station: Option<LoopingPlayer>,
    pending_source: Option<Option<Arc<AudioClip>>>,
    switch_ramp: SmoothedParam,
    station_filter: Biquad,
    station_filter_hz: SmoothedParam,
    station_q: SmoothedParam,
    station_gain: SmoothedParam,

    noise: LoopingPlayer,
    noise_filter: Biquad,
    noise_cutoff: SmoothedParam,
    noise_gain: SmoothedParam,

    master_gain: f32,
    output_highpass: ButterworthHighpass,
    block_pos: usize,
    sample_rate: u32,
    silence_waiter: Option<Sender<()>>,
}

impl RadioGraph {
    /// Build the graph around a pre-rendered noise buffer
    ///
    /// Starts with the station branch silent and the static at its loudest,
    /// i.e. what a receiver sounds like before it finds anything.
    pub fn new(
        audio: &AudioConfig,
        mapping: &MappingConfig,
        noise: Vec<f32>,
        commands: Receiver<GraphCommand>,
    ) -> Result<Self> {
        let sr = audio.sample_rate as f32;
        // Filter parameters advance once per block
        let block_rate = sr / CONTROL_BLOCK as f32;

        Ok(Self {
            commands,
            station: None,
            pending_source: None,
            switch_ramp: SmoothedParam::new(0.0, audio.switch_ramp_ms, sr),
            station_filter: Biquad::band_pass(mapping.station_filter_hz, mapping.q_weak, sr),
            station_filter_hz: SmoothedParam::new(
                mapping.station_filter_hz,
                audio.station_smoothing_ms,
                block_rate,
            ),
            station_q: SmoothedParam::new(mapping.q_weak, audio.station_smoothing_ms, block_rate),
            station_gain: SmoothedParam::new(0.0, audio.station_smoothing_ms, sr),
            noise: LoopingPlayer::new(Arc::new(AudioClip::from_samples("white-noise", noise))),
            noise_filter: Biquad::low_pass(mapping.noise_cutoff_weak_hz, 0.707, sr),
            noise_cutoff: SmoothedParam::new(
                mapping.noise_cutoff_weak_hz,
                audio.noise_smoothing_ms,
                block_rate,
            ),
            noise_gain: SmoothedParam::new(
                mapping.noise_gain_loud,
                audio.noise_smoothing_ms,
                sr,
            ),
            master_gain: audio.master_gain,
            output_highpass: ButterworthHighpass::new(
                audio.output_highpass_hz,
                sr,
                audio.output_highpass_order,
            )?,
            block_pos: 0,
            sample_rate: audio.sample_rate,
            silence_waiter: None,
        })
    }

    /// Apply one command immediately (normally drained from the queue)
    pub fn apply(&mut self, command: GraphCommand) {
        match command {
            GraphCommand::StationParams { filter_hz, q, gain } => {
                self.station_filter_hz.set_target(filter_hz);
                self.station_q.set_target(q);
                self.station_gain.set_target(gain.max(0.0));
            }
            GraphCommand::StationGain(gain) => {
                self.station_gain.set_target(gain.max(0.0));
            }
            GraphCommand::NoiseParams { cutoff_hz, gain } => {
                self.noise_cutoff.set_target(cutoff_hz);
                self.noise_gain.set_target(gain.max(0.0));
            }
            GraphCommand::SwitchSource(clip) => self.switch_source(clip),
            GraphCommand::Mute(waiter) => {
                self.station_gain.set_target(0.0);
                self.noise_gain.set_target(0.0);
                self.silence_waiter = waiter;
            }
        }
    }

    fn switch_source(&mut self, clip: Option<Arc<AudioClip>>) {
        let requested = clip.as_ref().map(|c| c.asset());
        let unchanged = match &self.pending_source {
            Some(pending) => pending.as_ref().map(|c| c.asset()) == requested,
            None => self.current_asset() == requested,
        };
        if unchanged {
            return;
        }

        if self.station.is_none() {
            // Nothing audible to fade out
            self.pending_source = None;
            self.station = clip.map(LoopingPlayer::new);
            self.switch_ramp.set_immediate(0.0);
            self.switch_ramp.set_target(1.0);
        } else {
            self.pending_source = Some(clip);
            self.switch_ramp.set_target(0.0);
        }
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            self.apply(command);
        }
    }

    fn update_filters(&mut self) {
        let hz = self.station_filter_hz.advance(CONTROL_BLOCK);
        let q = self.station_q.advance(CONTROL_BLOCK);
        if (hz - self.station_filter.frequency()).abs() > FILTER_RETUNE_EPSILON
            || (q - self.station_filter.q()).abs() > FILTER_RETUNE_EPSILON
        {
            self.station_filter.set_params(hz, q);
        }

        let cutoff = self.noise_cutoff.advance(CONTROL_BLOCK);
        if (cutoff - self.noise_filter.frequency()).abs() > FILTER_RETUNE_EPSILON {
            self.noise_filter.set_params(cutoff, 0.707);
        }
    }

    fn next_sample(&mut self) -> f32 {
        if self.block_pos == 0 {
            self.update_filters();
        }
        self.block_pos = (self.block_pos + 1) % CONTROL_BLOCK;

        let ramp = self.switch_ramp.next_value();
        if self.pending_source.is_some() && ramp == 0.0 {
            self.station = self.pending_source.take().flatten().map(LoopingPlayer::new);
            self.station_filter.reset();
            self.switch_ramp.set_target(1.0);
        }

        let station_gain = self.station_gain.next_value();
        let station = match self.station.as_mut() {
            Some(player) => {
                let raw = player.next_sample();
                self.station_filter.process(raw) * station_gain * ramp
            }
            None => 0.0,
        };

        let noise_gain = self.noise_gain.next_value();
        let noise = self.noise_filter.process(self.noise.next_sample()) * noise_gain;

        let mixed = (station + noise) * self.master_gain;
        self.output_highpass.process(mixed).tanh()
    }

    /// Render interleaved frames, copying the mono mix to every channel
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        self.drain_commands();
        let channels = channels.max(1);
        for frame in out.chunks_mut(channels) {
            let sample = self.next_sample();
            frame.fill(sample);
        }

        if self.is_silent() {
            if let Some(waiter) = self.silence_waiter.take() {
                let _ = waiter.try_send(());
            }
        }
    }

    /// Both branch gains have settled at zero
    pub fn is_silent(&self) -> bool {
        self.station_gain.is_settled()
            && self.station_gain.value() == 0.0
            && self.noise_gain.is_settled()
            && self.noise_gain.value() == 0.0
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn current_asset(&self) -> Option<&str> {
        self.station.as_ref().map(|p| p.clip().asset())
    }

    /// Playhead of the current station source in samples
    pub fn station_position(&self) -> Option<usize> {
        self.station.as_ref().map(|p| p.position())
    }

    pub fn station_gain(&self) -> &SmoothedParam {
        &self.station_gain
    }

    pub fn noise_gain(&self) -> &SmoothedParam {
        &self.noise_gain
    }

    pub fn station_filter(&self) -> &Biquad {
        &self.station_filter
    }

    pub fn noise_filter(&self) -> &Biquad {
        &self.noise_filter
    }

    pub fn is_switching(&self) -> bool {
        self.pending_source.is_some()
    }
}
