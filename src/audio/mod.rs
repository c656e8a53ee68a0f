pub mod clip;
pub mod engine;
pub mod graph;
pub mod noise;
pub mod output;
pub mod smoothing;

pub use clip::{AudioClip, ClipLibrary, LoopingPlayer};
pub use engine::AudioEngine;
pub use graph::{GraphCommand, RadioGraph};
pub use noise::white_noise_buffer;
pub use output::{AudioOutput, CpalOutput, OfflineHandle, OfflineOutput};
pub use smoothing::SmoothedParam;
