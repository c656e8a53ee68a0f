use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReceiverError {
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio stream error: {0}")]
    AudioStream(String),

    #[error("Filter design failed: {0}")]
    FilterDesign(String),

    #[error("Failed to load audio asset {asset}: {reason}")]
    AssetLoad { asset: String, reason: String },

    #[error("Station catalogue error: {0}")]
    Catalogue(String),

    #[error("Listener position unavailable: {0}")]
    Position(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ReceiverError>;
