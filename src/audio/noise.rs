use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Uniform};

pub(crate) fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => rand::make_rng(),
    }
}

/// Fixed-length buffer of uniform white noise in `[-amplitude, amplitude]`
pub fn white_noise_buffer(
    duration_secs: f32,
    sample_rate: u32,
    amplitude: f32,
    rng: &mut ChaCha8Rng,
) -> Vec<f32> {
    let len = ((duration_secs * sample_rate as f32) as usize).max(1);
    let amplitude = amplitude.abs();
    match Uniform::new_inclusive(-1.0f32, 1.0) {
        Ok(dist) => (0..len).map(|_| dist.sample(rng) * amplitude).collect(),
        Err(_) => vec![0.0; len],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_length_and_range() {
        let mut rng = create_rng(Some(7));
        let noise = white_noise_buffer(0.5, 48000, 0.35, &mut rng);
        assert_eq!(noise.len(), 24000);
        assert!(noise.iter().all(|&x| (-0.35..=0.35).contains(&x)));
    }

    #[test]
    fn test_noise_is_roughly_zero_mean_and_flat() {
        let mut rng = create_rng(Some(42));
        let noise = white_noise_buffer(1.0, 48000, 1.0, &mut rng);

        let mean = noise.iter().sum::<f32>() / noise.len() as f32;
        assert!(mean.abs() < 0.02, "mean {}", mean);

        // Uniform on [-1, 1] has variance 1/3
        let var = noise.iter().map(|x| x * x).sum::<f32>() / noise.len() as f32;
        assert!((var - 1.0 / 3.0).abs() < 0.02, "variance {}", var);
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let a = white_noise_buffer(0.01, 48000, 0.5, &mut create_rng(Some(3)));
        let b = white_noise_buffer(0.01, 48000, 0.5, &mut create_rng(Some(3)));
        assert_eq!(a, b);
    }
}
