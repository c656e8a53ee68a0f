use iir_filters::filter::{DirectForm2Transposed, Filter as IirFilter};
use iir_filters::filter_design::{FilterType, butter};
use iir_filters::sos::zpk2sos;

use super::Filter;
use crate::error::{ReceiverError, Result};

/// Butterworth highpass for the master output ("speaker" low cut)
///
/// Removes DC and rumble left by the looping sources before the soft clipper.
pub struct ButterworthHighpass {
    cutoff_hz: f32,
    sample_rate: f32,
    order: usize,
    filter: DirectForm2Transposed,
}

fn design(cutoff_hz: f32, sample_rate: f32, order: usize) -> Result<DirectForm2Transposed> {
    let zpk = butter(
        order as u32,
        FilterType::HighPass(cutoff_hz as f64),
        sample_rate as f64,
    )
    .map_err(|e| ReceiverError::FilterDesign(format!("{:?}", e)))?;

    let sos = zpk2sos(&zpk, None).map_err(|e| ReceiverError::FilterDesign(format!("{:?}", e)))?;

    Ok(DirectForm2Transposed::new(&sos))
}

impl ButterworthHighpass {
    pub fn new(cutoff_hz: f32, sample_rate: f32, order: usize) -> Result<Self> {
        Ok(Self {
            cutoff_hz,
            sample_rate,
            order,
            filter: design(cutoff_hz, sample_rate, order)?,
        })
    }

    pub fn cutoff_hz(&self) -> f32 {
        self.cutoff_hz
    }
}

impl Filter for ButterworthHighpass {
    fn process(&mut self, sample: f32) -> f32 {
        self.filter.filter(sample as f64) as f32
    }

    fn reset(&mut self) {
        // Parameters were validated in `new`
        if let Ok(filter) = design(self.cutoff_hz, self.sample_rate, self.order) {
            self.filter = filter;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highpass_design() {
        assert!(ButterworthHighpass::new(120.0, 48000.0, 2).is_ok());
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let mut filter = ButterworthHighpass::new(120.0, 48000.0, 2).unwrap();
        let mut buffer = vec![0.5f32; 48000];
        filter.process_buffer(&mut buffer);
        assert!(buffer[47999].abs() < 1e-3, "DC leaked: {}", buffer[47999]);
    }

    #[test]
    fn test_reset_matches_fresh_filter() {
        let mut used = ButterworthHighpass::new(120.0, 48000.0, 2).unwrap();
        let mut fresh = ButterworthHighpass::new(120.0, 48000.0, 2).unwrap();
        for _ in 0..100 {
            used.process(1.0);
        }
        used.reset();
        for i in 0..50 {
            let x = (i as f32 * 0.1).sin();
            assert_eq!(used.process(x), fresh.process(x));
        }
    }
}
