use crate::constants::SMOOTHING_SNAP_EPSILON;

/// Exponentially smoothed audio parameter
///
/// Moves toward its target with a one-pole response of the given time
/// constant. Once within `SMOOTHING_SNAP_EPSILON` of the target it lands on
/// it exactly, so every transition ends in finite time.
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    value: f32,
    target: f32,
    coeff: f32,
}

impl SmoothedParam {
    /// # Arguments
    /// * `initial` - Starting value (also the initial target)
    /// * `time_constant_ms` - Time to cover ~63% of a step; 0 means instant
    /// * `sample_rate` - Rate at which [`next_value`](Self::next_value) is called
    pub fn new(initial: f32, time_constant_ms: f32, sample_rate: f32) -> Self {
        let coeff = if time_constant_ms > 0.0 {
            1.0 - (-1000.0 / (time_constant_ms * sample_rate)).exp()
        } else {
            1.0
        };
        Self {
            value: initial,
            target: initial,
            coeff,
        }
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Jump to `value` with no ramp
    pub fn set_immediate(&mut self, value: f32) {
        self.value = value;
        self.target = value;
    }

    /// Advance one sample and return the new value
    pub fn next_value(&mut self) -> f32 {
        if self.value != self.target {
            self.value += (self.target - self.value) * self.coeff;
            self.snap();
        }
        self.value
    }

    /// Advance `samples` steps at once (control-rate parameters)
    pub fn advance(&mut self, samples: usize) -> f32 {
        if self.value != self.target {
            let remaining = (1.0 - self.coeff).powi(samples as i32);
            self.value = self.target + (self.value - self.target) * remaining;
            self.snap();
        }
        self.value
    }

    fn snap(&mut self) {
        if (self.target - self.value).abs() < SMOOTHING_SNAP_EPSILON {
            self.value = self.target;
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_settled(&self) -> bool {
        self.value == self.target
    }
}
