//! Numeric constants for numerical stability
//!
//! Thresholds and epsilon values shared by the propagation model and the
//! audio graph.

/// Added to every listener-to-station distance so a co-located station never
/// divides by zero.
pub const DISTANCE_EPSILON_KM: f64 = 1e-3;

/// Smoothed parameters closer than this to their target snap onto it, which
/// bounds every ramp to a finite duration.
pub const SMOOTHING_SNAP_EPSILON: f32 = 1e-5;

/// Filter coefficient updates are skipped for parameter moves smaller than this.
pub const FILTER_RETUNE_EPSILON: f32 = 1e-3;

/// Lowest cutoff/centre frequency any graph filter is tuned to, in Hz.
pub const MIN_FILTER_HZ: f32 = 20.0;

/// Highest cutoff as a fraction of the sample rate (kept below Nyquist).
pub const MAX_FILTER_NYQUIST_RATIO: f32 = 0.45;

/// Lowest resonance accepted by the biquads.
pub const MIN_FILTER_Q: f32 = 0.1;
