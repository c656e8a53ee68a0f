use std::sync::{Arc, Mutex};
use std::time::Duration;

use audio_thread_priority::RtPriorityHandle;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Receiver;

use super::graph::RadioGraph;
use crate::config::AudioConfig;
use crate::error::{ReceiverError, Result};

/// Destination that drives a [`RadioGraph`]
///
/// `start` takes ownership of the graph; from then on the graph is reached
/// only through its command queue.
pub trait AudioOutput {
    fn start(&mut self, graph: RadioGraph) -> Result<()>;

    /// Keep the graph playing until `silent` fires or `timeout` passes
    ///
    /// Called after a mute so [`stop`](Self::stop) cuts an already silent
    /// stream. The default waits for the device callback to get there.
    fn release(&mut self, silent: &Receiver<()>, timeout: Duration) {
        if silent.recv_timeout(timeout).is_err() {
            log::debug!("Output not silent after {:?}, stopping anyway", timeout);
        }
    }

    fn stop(&mut self);
}

/// Default output device via cpal
pub struct CpalOutput {
    config: AudioConfig,
    stream: Option<cpal::Stream>,
    tick_thread_priority: Option<RtPriorityHandle>,
}

impl CpalOutput {
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            config: config.clone(),
            stream: None,
            tick_thread_priority: None,
        }
    }
}

/// Raise the calling thread to real-time priority
///
/// Called from `start`, i.e. on the thread that runs the tick loop and
/// feeds the command queue. cpal schedules its own callback thread.
/// Failure only costs timing, so it is logged and ignored.
fn promote_tick_thread(config: &AudioConfig) -> Option<RtPriorityHandle> {
    match audio_thread_priority::promote_current_thread_to_real_time(
        config.buffer_size as u32,
        config.sample_rate,
    ) {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::warn!("Could not set real-time priority for the tick thread: {}", e);
            None
        }
    }
}

/// Pause `stream`, logging a failure; returns whether it paused
fn pause_stream(stream: &impl StreamTrait) -> bool {
    match stream.pause() {
        Ok(()) => true,
        Err(e) => {
            log::debug!("Stream pause failed: {}", e);
            false
        }
    }
}

impl AudioOutput for CpalOutput {
    fn start(&mut self, mut graph: RadioGraph) -> Result<()> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| ReceiverError::AudioDevice("No output device found".into()))?;

        match device.description() {
            Ok(desc) => log::info!("Output device: {:?}", desc),
            Err(_) => log::info!("Output device: Unknown"),
        }

        let stream_config = cpal::StreamConfig {
            channels: self.config.channels,
            sample_rate: self.config.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(self.config.buffer_size as u32),
        };
        let channels = self.config.channels as usize;

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    graph.render(data, channels);
                },
                |err| log::error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| ReceiverError::AudioStream(format!("{}", e)))?;

        self.tick_thread_priority = promote_tick_thread(&self.config);

        stream
            .play()
            .map_err(|e| ReceiverError::AudioStream(format!("{}", e)))?;

        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            pause_stream(&stream);
        }
    }
}

impl Drop for CpalOutput {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Frames rendered per step while an offline output plays out a release
const RELEASE_BLOCK: usize = 256;

#[derive(Default)]
struct OfflineState {
    graph: Option<RadioGraph>,
    starts: usize,
    channels: usize,
    release_tail: Vec<f32>,
}

/// In-memory output: the graph is pulled by an [`OfflineHandle`]
///
/// Used for rendering to a file and for exercising the engine without an
/// audio device.
pub struct OfflineOutput {
    state: Arc<Mutex<OfflineState>>,
    fail_start: bool,
}

/// Pulls rendered audio out of an [`OfflineOutput`]
#[derive(Clone)]
pub struct OfflineHandle {
    state: Arc<Mutex<OfflineState>>,
}

impl OfflineOutput {
    pub fn new() -> (Self, OfflineHandle) {
        let state = Arc::new(Mutex::new(OfflineState::default()));
        (
            Self {
                state: Arc::clone(&state),
                fail_start: false,
            },
            OfflineHandle { state },
        )
    }

    /// An output whose `start` always fails, like a blocked autoplay
    pub fn failing() -> (Self, OfflineHandle) {
        let (mut output, handle) = Self::new();
        output.fail_start = true;
        (output, handle)
    }
}

impl AudioOutput for OfflineOutput {
    fn start(&mut self, graph: RadioGraph) -> Result<()> {
        if self.fail_start {
            return Err(ReceiverError::AudioDevice("playback not permitted".into()));
        }
        let mut state = self
            .state
            .lock()
            .map_err(|_| ReceiverError::AudioStream("offline state poisoned".into()))?;
        state.graph = Some(graph);
        state.starts += 1;
        Ok(())
    }

    /// Nothing pulls the graph between handle renders, so the release is
    /// rendered here and kept for [`OfflineHandle::take_release_tail`]
    fn release(&mut self, silent: &Receiver<()>, timeout: Duration) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        let channels = state.channels.max(1);
        let OfflineState {
            graph,
            release_tail,
            ..
        } = &mut *state;
        let Some(graph) = graph.as_mut() else {
            return;
        };

        let limit = (timeout.as_secs_f64() * graph.sample_rate() as f64) as usize * channels;
        let mut block = vec![0.0f32; RELEASE_BLOCK * channels];
        release_tail.clear();
        while release_tail.len() < limit {
            graph.render(&mut block, channels);
            release_tail.extend_from_slice(&block);
            if silent.try_recv().is_ok() {
                return;
            }
        }
        log::debug!("Offline release hit the {:?} limit", timeout);
    }

    fn stop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.graph = None;
        }
    }
}

impl OfflineHandle {
    /// Render interleaved frames; returns false (and leaves `out` untouched)
    /// while no graph is running
    pub fn render(&self, out: &mut [f32], channels: usize) -> bool {
        match self.state.lock() {
            Ok(mut state) => {
                state.channels = channels;
                match state.graph.as_mut() {
                    Some(graph) => {
                        graph.render(out, channels);
                        true
                    }
                    None => false,
                }
            }
            Err(_) => false,
        }
    }

    /// Interleaved audio rendered while the last graph faded out on stop
    ///
    /// Uses the channel count of the most recent [`render`](Self::render).
    pub fn take_release_tail(&self) -> Vec<f32> {
        self.state
            .lock()
            .map(|mut s| std::mem::take(&mut s.release_tail))
            .unwrap_or_default()
    }

    /// Inspect the running graph
    pub fn with_graph<R>(&self, f: impl FnOnce(&RadioGraph) -> R) -> Option<R> {
        let state = self.state.lock().ok()?;
        state.graph.as_ref().map(f)
    }

    pub fn is_running(&self) -> bool {
        self.with_graph(|_| ()).is_some()
    }

    /// Number of graphs ever started on this output
    pub fn start_count(&self) -> usize {
        self.state.lock().map(|s| s.starts).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FakeStream {
        device_gone: bool,
        pauses: Cell<usize>,
    }

    impl StreamTrait for FakeStream {
        fn play(&self) -> std::result::Result<(), cpal::PlayStreamError> {
            Ok(())
        }

        fn pause(&self) -> std::result::Result<(), cpal::PauseStreamError> {
            self.pauses.set(self.pauses.get() + 1);
            if self.device_gone {
                Err(cpal::PauseStreamError::DeviceNotAvailable)
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_pause_failure_is_reported_not_fatal() {
        let gone = FakeStream {
            device_gone: true,
            pauses: Cell::new(0),
        };
        assert!(!pause_stream(&gone));
        assert_eq!(gone.pauses.get(), 1);

        let live = FakeStream {
            device_gone: false,
            pauses: Cell::new(0),
        };
        assert!(pause_stream(&live));
    }

    #[test]
    fn test_tick_thread_promotion_is_optional() {
        // Without an rtkit/dbus session promotion fails and is only logged
        if let Some(handle) = promote_tick_thread(&AudioConfig::default()) {
            assert!(audio_thread_priority::demote_current_thread_from_real_time(handle).is_ok());
        }
    }

    #[test]
    fn test_offline_release_without_graph_keeps_no_tail() {
        let (mut output, handle) = OfflineOutput::new();
        let (_tx, rx) = crossbeam_channel::bounded::<()>(1);
        output.release(&rx, Duration::from_millis(50));
        assert!(handle.take_release_tail().is_empty());
    }
}
