/// Stateful per-sample filter in the audio graph
pub trait Filter {
    fn process(&mut self, sample: f32) -> f32;

    /// Clear the delay line; coefficients are kept
    fn reset(&mut self);

    /// Filter `buffer` in place
    fn process_buffer(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }
}
