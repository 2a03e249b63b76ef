/// Number of waveform buckets the recording UI displays
pub const LEVEL_BUCKETS: usize = 40;

/// Reduce a batch of PCM samples to `buckets` normalized peak levels in
/// 0.0..=1.0 for waveform display.
pub fn amplitude_buckets(samples: &[i16], buckets: usize) -> Vec<f32> {
    if buckets == 0 {
        return Vec::new();
    }

    let mut levels = vec![0.0f32; buckets];
    if samples.is_empty() {
        return levels;
    }

    let chunk = samples.len().div_ceil(buckets);
    for (level, window) in levels.iter_mut().zip(samples.chunks(chunk)) {
        let peak = window
            .iter()
            .map(|s| (*s as i32).unsigned_abs())
            .max()
            .unwrap_or(0);
        *level = (peak as f32 / i16::MAX as f32).min(1.0);
    }

    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_silent_buckets() {
        let levels = amplitude_buckets(&[], LEVEL_BUCKETS);
        assert_eq!(levels.len(), LEVEL_BUCKETS);
        assert!(levels.iter().all(|l| *l == 0.0));
    }

    #[test]
    fn peaks_land_in_their_buckets() {
        // Two buckets: quiet first half, loud second half
        let mut samples = vec![100i16; 50];
        samples.extend(vec![i16::MAX; 50]);

        let levels = amplitude_buckets(&samples, 2);
        assert_eq!(levels.len(), 2);
        assert!(levels[0] < 0.01);
        assert!((levels[1] - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn extreme_negative_sample_clamps_to_one() {
        let levels = amplitude_buckets(&[i16::MIN], 1);
        assert_eq!(levels, vec![1.0]);
    }

    #[test]
    fn fewer_samples_than_buckets_leaves_tail_silent() {
        let levels = amplitude_buckets(&[1000, -2000], 40);
        assert_eq!(levels.len(), 40);
        assert!(levels[0] > 0.0);
        assert!(levels[2..].iter().all(|l| *l == 0.0));
    }
}
