//! PPG/BVP quality metrics: windowed skewness (Elgendi) and peak-height
//! variance

use sqa_core::{SamplingContext, SqaError, SqaResult};

use crate::stats;

/// Skewness window length in seconds
const SKEW_WINDOW_SECS: f64 = 2.0;
/// Reference pulse rate used to derive the minimum peak distance
const PEAK_DISTANCE_REFERENCE_HZ: f64 = 240.0;
/// Minimum peak height after mean-centring
const MIN_PEAK_HEIGHT: f64 = 0.0;

/// Windowed skewness quality index after Elgendi (2016)
///
/// Mean absolute skewness over 2-second windows sliding by one sample.
pub fn elgendi_skewness(values: &[f64], ctx: &SamplingContext) -> SqaResult<f64> {
    let n = values.len();
    let window = ctx.samples_in(SKEW_WINDOW_SECS).max(2);
    if n < window {
        return Err(SqaError::InvalidSignal {
            reason: format!(
                "skewness index requires at least one {}-second window ({} samples), got {}",
                SKEW_WINDOW_SECS, window, n
            ),
        });
    }

    let mut total = 0.0;
    let window_count = n - window + 1;
    for start in 0..window_count {
        total += stats::skewness(&values[start..start + window]).abs();
    }
    Ok(total / window_count as f64)
}

/// Peak-height-variance quality index
///
/// Mean-centre the signal, detect peaks, normalise by the mean peak height,
/// re-detect on the normalised signal and report the variance of the
/// normalised peak heights. Lower variance means more consistent pulses and
/// therefore higher quality.
pub fn peak_height_variance(values: &[f64], ctx: &SamplingContext) -> SqaResult<f64> {
    if values.len() < 3 {
        return Err(SqaError::InvalidSignal {
            reason: format!(
                "peak-height variance requires at least 3 samples, got {}",
                values.len()
            ),
        });
    }

    let min_distance =
        ((ctx.sampling_rate_hz / PEAK_DISTANCE_REFERENCE_HZ).round() as usize).max(1);

    let mean = stats::mean(values);
    let centered: Vec<f64> = values.iter().map(|v| v - mean).collect();

    let peaks = find_peaks(&centered, min_distance, MIN_PEAK_HEIGHT);
    if peaks.is_empty() {
        return Err(SqaError::NumericInstability {
            reason: "no peaks detected in the centred signal".to_string(),
        });
    }

    let heights: Vec<f64> = peaks.iter().map(|&i| centered[i]).collect();
    let mean_height = stats::mean(&heights);
    if mean_height.abs() < 1e-12 {
        return Err(SqaError::NumericInstability {
            reason: "mean peak height is zero, cannot normalise".to_string(),
        });
    }

    let normalized: Vec<f64> = centered.iter().map(|v| v / mean_height).collect();
    let peaks = find_peaks(&normalized, min_distance, MIN_PEAK_HEIGHT);
    if peaks.is_empty() {
        return Err(SqaError::NumericInstability {
            reason: "no peaks detected in the normalised signal".to_string(),
        });
    }

    let heights: Vec<f64> = peaks.iter().map(|&i| normalized[i]).collect();
    Ok(stats::variance(&heights))
}

/// Local-maxima peak detection with plateau handling and distance pruning
///
/// A peak is a sample strictly greater than its left neighbour whose next
/// differing sample to the right is lower; plateaus report their midpoint.
/// When `min_distance > 1`, peaks are pruned highest-first so no two
/// survivors are closer than `min_distance` samples. Endpoints are never
/// peaks.
pub(crate) fn find_peaks(values: &[f64], min_distance: usize, min_height: f64) -> Vec<usize> {
    let n = values.len();
    let mut peaks = Vec::new();

    let mut i = 1;
    while i + 1 < n {
        if values[i - 1] < values[i] {
            // Scan across a possible plateau
            let mut right = i;
            while right + 1 < n && values[right + 1] == values[i] {
                right += 1;
            }
            if right + 1 < n && values[right + 1] < values[i] {
                let mid = (i + right) / 2;
                if values[mid] >= min_height {
                    peaks.push(mid);
                }
            }
            i = right + 1;
        } else {
            i += 1;
        }
    }

    if min_distance > 1 && peaks.len() > 1 {
        let mut keep = vec![true; peaks.len()];
        let mut order: Vec<usize> = (0..peaks.len()).collect();
        order.sort_by(|&a, &b| {
            values[peaks[b]]
                .partial_cmp(&values[peaks[a]])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        for &k in &order {
            if !keep[k] {
                continue;
            }
            let mut left = k;
            while left > 0 {
                left -= 1;
                if peaks[k] - peaks[left] < min_distance {
                    keep[left] = false;
                } else {
                    break;
                }
            }
            let mut right = k + 1;
            while right < peaks.len() && peaks[right] - peaks[k] < min_distance {
                keep[right] = false;
                right += 1;
            }
        }

        peaks = peaks
            .into_iter()
            .zip(keep)
            .filter_map(|(p, k)| k.then_some(p))
            .collect();
    }

    peaks
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn ctx(rate: f64) -> SamplingContext {
        SamplingContext::new(rate).unwrap()
    }

    fn pulse_wave(rate: f64, beats_per_min: f64, samples: usize) -> Vec<f64> {
        let f = beats_per_min / 60.0;
        (0..samples)
            .map(|i| {
                let t = i as f64 / rate;
                (2.0 * PI * f * t).sin() + 0.3 * (4.0 * PI * f * t + 0.8).sin()
            })
            .collect()
    }

    #[test]
    fn test_find_peaks_simple() {
        let values = [0.0, 1.0, 0.0, 2.0, 0.0, 3.0, 0.0];
        assert_eq!(find_peaks(&values, 1, 0.0), vec![1, 3, 5]);
    }

    #[test]
    fn test_find_peaks_plateau_midpoint() {
        let values = [0.0, 1.0, 1.0, 1.0, 0.0];
        assert_eq!(find_peaks(&values, 1, 0.0), vec![2]);
    }

    #[test]
    fn test_find_peaks_endpoints_excluded() {
        // The global maximum sits on the boundary and is not a peak
        let values = [5.0, 1.0, 0.5, 1.0, 0.8];
        assert_eq!(find_peaks(&values, 1, 0.0), vec![3]);
    }

    #[test]
    fn test_find_peaks_height_filter() {
        let values = [0.0, 0.4, 0.0, 2.0, 0.0];
        assert_eq!(find_peaks(&values, 1, 1.0), vec![3]);
    }

    #[test]
    fn test_find_peaks_distance_keeps_highest() {
        let values = [0.0, 1.0, 0.5, 2.0, 0.0];
        // Peaks at 1 and 3 are 2 apart; min distance 3 keeps the higher one
        assert_eq!(find_peaks(&values, 3, 0.0), vec![3]);
    }

    #[test]
    fn test_skewness_requires_full_window() {
        let result = elgendi_skewness(&[0.0; 10], &ctx(64.0));
        assert!(matches!(result, Err(SqaError::InvalidSignal { .. })));
    }

    #[test]
    fn test_skewness_near_zero_for_symmetric_signal() {
        let values: Vec<f64> = (0..512)
            .map(|i| (2.0 * PI * i as f64 / 32.0).sin())
            .collect();
        let score = elgendi_skewness(&values, &ctx(16.0)).unwrap();
        assert!(score < 0.2, "score {}", score);
    }

    #[test]
    fn test_skewness_flags_asymmetric_artifacts() {
        let mut values: Vec<f64> = (0..512)
            .map(|i| (2.0 * PI * i as f64 / 32.0).sin())
            .collect();
        for i in (0..512).step_by(64) {
            values[i] += 25.0;
        }
        let clean: Vec<f64> = (0..512)
            .map(|i| (2.0 * PI * i as f64 / 32.0).sin())
            .collect();

        let spiky = elgendi_skewness(&values, &ctx(16.0)).unwrap();
        let baseline = elgendi_skewness(&clean, &ctx(16.0)).unwrap();
        assert!(spiky > baseline);
    }

    #[test]
    fn test_skewness_constant_signal_is_zero() {
        let score = elgendi_skewness(&[3.0; 128], &ctx(16.0)).unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_phv_uniform_pulses_score_near_zero() {
        let values = pulse_wave(64.0, 72.0, 1920);
        let score = peak_height_variance(&values, &ctx(64.0)).unwrap();
        assert!(score < 0.05, "score {}", score);
    }

    #[test]
    fn test_phv_irregular_pulses_score_higher() {
        let mut values = pulse_wave(64.0, 72.0, 1920);
        // Corrupt every third beat's amplitude
        for (i, v) in values.iter_mut().enumerate() {
            if (i / 160) % 3 == 0 {
                *v *= 3.0;
            }
        }
        let uniform = pulse_wave(64.0, 72.0, 1920);

        let corrupted = peak_height_variance(&values, &ctx(64.0)).unwrap();
        let baseline = peak_height_variance(&uniform, &ctx(64.0)).unwrap();
        assert!(corrupted > baseline);
    }

    #[test]
    fn test_phv_no_peaks_is_unstable() {
        // Monotone ramp has no interior local maxima
        let values: Vec<f64> = (0..64).map(|i| i as f64).collect();
        let result = peak_height_variance(&values, &ctx(64.0));
        assert!(matches!(result, Err(SqaError::NumericInstability { .. })));
    }

    #[test]
    fn test_phv_too_short_rejected() {
        let result = peak_height_variance(&[1.0, 2.0], &ctx(64.0));
        assert!(matches!(result, Err(SqaError::InvalidSignal { .. })));
    }
}
