use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use hound::WavReader;

use crate::error::{ReceiverError, Result};

/// Decoded mono audio at the output sample rate
#[derive(Debug)]
pub struct AudioClip {
    asset: String,
    samples: Arc<[f32]>,
}

impl AudioClip {
    /// Wrap samples that are already mono at the output rate
    ///
    /// An empty buffer becomes a single zero sample so looping stays defined.
    pub fn from_samples(asset: impl Into<String>, samples: Vec<f32>) -> Self {
        let samples = if samples.is_empty() { vec![0.0] } else { samples };
        Self {
            asset: asset.into(),
            samples: samples.into(),
        }
    }

    /// Decode a WAV asset, mixing down to mono and resampling to `sample_rate`
    pub fn load_wav<P: AsRef<Path>>(path: P, sample_rate: u32) -> Result<Self> {
        let path = path.as_ref();
        let asset = path.to_string_lossy().into_owned();
        let load_err = |reason: String| ReceiverError::AssetLoad {
            asset: asset.clone(),
            reason,
        };

        let reader = WavReader::open(path).map_err(|e| load_err(e.to_string()))?;
        let spec = reader.spec();
        let interleaved = read_samples(reader, &spec).map_err(|e| load_err(e.to_string()))?;

        let mono = mix_down(&interleaved, spec.channels as usize);
        if mono.is_empty() {
            return Err(load_err("no audio frames".into()));
        }
        let samples = resample_linear(&mono, spec.sample_rate, sample_rate);

        log::debug!(
            "Loaded {} ({} Hz, {} ch, {:.1}s)",
            asset,
            spec.sample_rate,
            spec.channels,
            mono.len() as f32 / spec.sample_rate as f32
        );

        Ok(Self::from_samples(asset, samples))
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}

fn read_samples(
    mut reader: WavReader<BufReader<File>>,
    spec: &hound::WavSpec,
) -> std::result::Result<Vec<f32>, hound::Error> {
    match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect(),
        hound::SampleFormat::Int => {
            // 2^31 does not fit in i32
            let bits = spec.bits_per_sample.clamp(1, 32) as u32;
            let max_val = (1_i64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect()
        }
    }
}

fn mix_down(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Linear-interpolation resampler; good enough for a lo-fi radio voice
pub fn resample_linear(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || input.len() < 2 || from_rate == 0 {
        return input.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = ((input.len() as f64) / ratio).floor().max(1.0) as usize;
    (0..out_len)
        .map(|i| {
            let pos = i as f64 * ratio;
            let idx = pos.floor() as usize;
            let frac = (pos - idx as f64) as f32;
            let a = input[idx.min(input.len() - 1)];
            let b = input[(idx + 1).min(input.len() - 1)];
            a + (b - a) * frac
        })
        .collect()
}

/// Endless playback of an [`AudioClip`]
pub struct LoopingPlayer {
    clip: Arc<AudioClip>,
    position: usize,
}

impl LoopingPlayer {
    pub fn new(clip: Arc<AudioClip>) -> Self {
        Self { clip, position: 0 }
    }

    pub fn next_sample(&mut self) -> f32 {
        let samples = self.clip.samples();
        let sample = samples[self.position];
        self.position += 1;
        if self.position >= samples.len() {
            self.position = 0;
        }
        sample
    }

    pub fn clip(&self) -> &Arc<AudioClip> {
        &self.clip
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

/// Decoded clips keyed by asset reference
///
/// Failed loads are remembered too, so a broken asset is reported once rather
/// than on every tick.
pub struct ClipLibrary {
    sample_rate: u32,
    clips: HashMap<String, Option<Arc<AudioClip>>>,
}

impl ClipLibrary {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            clips: HashMap::new(),
        }
    }

    /// Register an already decoded clip under its asset name
    pub fn insert(&mut self, clip: AudioClip) -> Arc<AudioClip> {
        let clip = Arc::new(clip);
        self.clips
            .insert(clip.asset().to_string(), Some(Arc::clone(&clip)));
        clip
    }

    pub fn get_or_load(&mut self, asset: &str) -> Option<Arc<AudioClip>> {
        if let Some(cached) = self.clips.get(asset) {
            return cached.clone();
        }

        let loaded = match AudioClip::load_wav(asset, self.sample_rate) {
            Ok(clip) => Some(Arc::new(clip)),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        };
        self.clips.insert(asset.to_string(), loaded.clone());
        loaded
    }
}
