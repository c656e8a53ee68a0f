pub mod audio;
pub mod config;
pub mod constants;
pub mod display;
pub mod error;
pub mod fading;
pub mod geo;
pub mod propagation;
pub mod receiver;
pub mod scheduler;
pub mod signal_processing;
pub mod station;
pub mod wav;

pub use config::ReceiverConfig;
pub use error::{ReceiverError, Result};
pub use geo::LatLon;
pub use propagation::PropagationModel;
pub use receiver::ReceiverSession;
pub use station::Station;
pub use wav::save_wav;
