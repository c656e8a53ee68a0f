pub mod biquad;
pub mod butterworth;
pub mod filter;

pub use biquad::{Biquad, BiquadKind};
pub use butterworth::ButterworthHighpass;
pub use filter::Filter;
