//! EDA quality metrics: amplitude/stability (Böttcher) and automated
//! artifact detection (Kleckner)

use sqa_core::{SamplingContext, SqaError, SqaResult};

use crate::stats;

/// Minimum acceptable EDA amplitude in μS
const AMPLITUDE_FLOOR_US: f64 = 0.05;
/// Maximum physiologically plausible EDA amplitude in μS
const AMPLITUDE_CEILING_US: f64 = 60.0;
/// RAC window length in seconds
const RAC_WINDOW_SECS: f64 = 2.0;
/// RAC stability threshold
const RAC_THRESHOLD: f64 = 0.2;
/// Rolling-mean window length in seconds
const ROLLING_WINDOW_SECS: f64 = 60.0;
/// Guard against near-zero denominators
const EPSILON: f64 = 1e-10;
/// Kleckner smoothing window length in seconds
const SMOOTH_WINDOW_SECS: f64 = 2.0;
/// Maximum acceptable EDA slope in μS/s
const MAX_SLOPE_US_PER_SEC: f64 = 10.0;
/// Radius over which an invalid datum invalidates its neighbours, seconds
const INVALID_SPREAD_RADIUS_SECS: f64 = 5.0;

/// Amplitude/stability quality score after Böttcher et al. (2022)
///
/// Combines a per-sample amplitude threshold with a windowed
/// range-of-absolute-change stability criterion, smooths the combined
/// validity with a one-minute rolling mean and averages every
/// `60·fs`-th rolling-mean sample into the final score in [0, 1].
pub fn bottcher_rac(values: &[f64], ctx: &SamplingContext) -> SqaResult<f64> {
    let n = values.len();
    let window = ctx.samples_in(RAC_WINDOW_SECS).max(1);
    if n < window {
        return Err(SqaError::InvalidSignal {
            reason: format!(
                "amplitude/stability score requires at least one {}-second window ({} samples), got {}",
                RAC_WINDOW_SECS, window, n
            ),
        });
    }

    let rac = compute_rac(values, window);

    let combined: Vec<f64> = (0..n)
        .map(|i| {
            let amplitude_ok = values[i] >= AMPLITUDE_FLOOR_US;
            // A sample with no defined RAC history counts as stable: a flat
            // window has zero rate of change.
            let stability_ok = match rac[i] {
                Some(r) => r.abs() < RAC_THRESHOLD,
                None => true,
            };
            if amplitude_ok && stability_ok {
                1.0
            } else {
                0.0
            }
        })
        .collect();

    let stride = ctx.samples_in(ROLLING_WINDOW_SECS);
    let rolling = rolling_validity_mean(&combined, stride);

    let sampled: Vec<f64> = rolling.iter().copied().step_by(stride.max(1)).collect();
    Ok(stats::mean(&sampled))
}

/// Windowed range of absolute change, broadcast to the first sample of each
/// window and forward-filled
///
/// The sign encodes whether the window is net-rising (minimum before
/// maximum) or net-falling. Flat windows stay undefined and inherit the
/// most recent defined RAC; windows before any definition stay undefined.
pub(crate) fn compute_rac(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut rac: Vec<Option<f64>> = vec![None; n];

    let mut start = 0;
    while start + window <= n {
        let slice = &values[start..start + window];
        let (imin, vmin) = argmin(slice);
        let (imax, vmax) = argmax(slice);

        if imin < imax {
            rac[start] = Some((vmax - vmin) / (vmin.abs() + EPSILON));
        } else if imin > imax {
            rac[start] = Some((vmin - vmax) / (vmax.abs() + EPSILON));
        }
        start += window;
    }

    // Forward-fill from the most recent defined window
    let mut last: Option<f64> = None;
    for slot in rac.iter_mut() {
        match slot {
            Some(value) => last = Some(*value),
            None => *slot = last,
        }
    }
    rac
}

/// Rolling mean of the validity series over `stride + 1` samples, with a
/// shrinking trailing window covering the final `stride` samples
fn rolling_validity_mean(validity: &[f64], stride: usize) -> Vec<f64> {
    let n = validity.len();
    let full_window = stride + 1;
    let mut rolling = Vec::new();

    if n >= full_window {
        let mut window_sum: f64 = validity[..full_window].iter().sum();
        rolling.push(window_sum / full_window as f64);
        for i in full_window..n {
            window_sum += validity[i] - validity[i - full_window];
            rolling.push(window_sum / full_window as f64);
        }
    }

    for i in (1..=stride).rev() {
        let tail = &validity[n - i.min(n)..];
        rolling.push(stats::mean(tail));
    }
    rolling
}

fn argmin(slice: &[f64]) -> (usize, f64) {
    let mut index = 0;
    let mut best = slice[0];
    for (i, &v) in slice.iter().enumerate().skip(1) {
        if v < best {
            best = v;
            index = i;
        }
    }
    (index, best)
}

fn argmax(slice: &[f64]) -> (usize, f64) {
    let mut index = 0;
    let mut best = slice[0];
    for (i, &v) in slice.iter().enumerate().skip(1) {
        if v > best {
            best = v;
            index = i;
        }
    }
    (index, best)
}

/// Automated artifact detection after Kleckner et al. (2017), 2-second
/// smoothing variant
///
/// A sample is invalid when the box-smoothed amplitude leaves
/// [0.05, 60] μS or the instantaneous slope exceeds 10 μS/s; each invalid
/// sample invalidates its neighbourhood within a 5-second radius. The
/// score is the fraction of samples that remain valid.
pub fn kleckner_automated(values: &[f64], ctx: &SamplingContext) -> SqaResult<f64> {
    let n = values.len();
    if n < 2 {
        return Err(SqaError::InvalidSignal {
            reason: format!("artifact detection requires at least 2 samples, got {}", n),
        });
    }

    let smooth_window = ctx.samples_in(SMOOTH_WINDOW_SECS);
    let smoothed = if smooth_window >= 2 {
        stats::centered_moving_average(values, smooth_window / 2)
    } else {
        values.to_vec()
    };

    let rate = ctx.sampling_rate_hz;
    let mut invalid = vec![false; n];
    for i in 0..n {
        let slope = if i == 0 {
            0.0
        } else {
            (smoothed[i] - smoothed[i - 1]) * rate
        };
        invalid[i] = smoothed[i] < AMPLITUDE_FLOOR_US
            || smoothed[i] > AMPLITUDE_CEILING_US
            || slope.abs() > MAX_SLOPE_US_PER_SEC;
    }

    let radius = ctx.samples_in(INVALID_SPREAD_RADIUS_SECS);
    let dilated = dilate_invalid(&invalid, radius);

    let valid_count = dilated.iter().filter(|flag| !**flag).count();
    Ok(valid_count as f64 / n as f64)
}

/// Spread each invalid flag to every sample within `radius` indices,
/// inclusive in both directions
pub(crate) fn dilate_invalid(invalid: &[bool], radius: usize) -> Vec<bool> {
    let n = invalid.len();
    let mut out = vec![false; n];
    for (i, flag) in invalid.iter().enumerate() {
        if *flag {
            let start = i.saturating_sub(radius);
            let end = (i + radius + 1).min(n);
            for slot in &mut out[start..end] {
                *slot = true;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(rate: f64) -> SamplingContext {
        SamplingContext::new(rate).unwrap()
    }

    #[test]
    fn test_rac_rising_window_sign() {
        // One 4-sample window: min 0 at index 0 before max 5 at index 2
        let rac = compute_rac(&[0.0, 1.0, 5.0, 2.0], 4);
        let value = rac[0].unwrap();
        assert!((value - 5.0 / EPSILON).abs() / (5.0 / EPSILON) < 1e-9);
        // Forward fill propagates the window value across its samples
        assert_eq!(rac[3], rac[0]);
    }

    #[test]
    fn test_rac_falling_window_sign() {
        let rac = compute_rac(&[5.0, 4.0, 1.0, 2.0], 4);
        let value = rac[0].unwrap();
        assert!((value - (1.0 - 5.0) / (5.0 + EPSILON)).abs() < 1e-9);
        assert!(value < 0.0);
    }

    #[test]
    fn test_rac_flat_window_stays_undefined() {
        let rac = compute_rac(&[1.0, 1.0, 1.0, 1.0], 4);
        assert!(rac.iter().all(|r| r.is_none()));
    }

    #[test]
    fn test_rac_flat_window_inherits_previous() {
        // First window falls 2 -> 1, second window is flat
        let rac = compute_rac(&[2.0, 1.0, 1.5, 1.5], 2);
        let first = rac[0].unwrap();
        assert!(first < 0.0);
        assert_eq!(rac[2], Some(first));
    }

    #[test]
    fn test_bottcher_all_zero_scores_zero() {
        let values = vec![0.0; 240];
        let score = bottcher_rac(&values, &ctx(4.0)).unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_bottcher_constant_scores_one() {
        let values = vec![1.0; 240];
        let score = bottcher_rac(&values, &ctx(4.0)).unwrap();
        assert!((score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bottcher_bounded() {
        let values: Vec<f64> = (0..480)
            .map(|i| 1.0 + (i as f64 * 0.37).sin() * (if i % 17 == 0 { 30.0 } else { 0.2 }))
            .collect();
        let score = bottcher_rac(&values, &ctx(4.0)).unwrap();
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn test_bottcher_too_short_rejected() {
        let result = bottcher_rac(&[1.0, 1.0, 1.0], &ctx(4.0));
        assert!(matches!(result, Err(SqaError::InvalidSignal { .. })));
    }

    #[test]
    fn test_bottcher_strided_aggregation_fixture() {
        // At 1 Hz with 10 samples the rolling window never fills, so the
        // strided mean reduces to the first trailing mean: the mean of the
        // combined validity series. Hand-computed: sample 4 fails the
        // amplitude floor, samples 4..10 inherit |RAC| = 99 > 0.2 from the
        // window starting at index 4, so 4 of 10 samples stay valid.
        let values = [1.0, 1.0, 1.05, 1.0, 0.01, 1.0, 1.0, 1.0, 1.0, 1.0];
        let score = bottcher_rac(&values, &ctx(1.0)).unwrap();
        assert!((score - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_dilation_exact_boundaries() {
        // fs = 4 Hz -> radius = 20 samples
        let mut invalid = vec![false; 200];
        invalid[100] = true;
        let dilated = dilate_invalid(&invalid, 20);

        for (i, flag) in dilated.iter().enumerate() {
            let expected = (80..=120).contains(&i);
            assert_eq!(*flag, expected, "index {}", i);
        }
    }

    #[test]
    fn test_dilation_clips_at_edges() {
        let mut invalid = vec![false; 30];
        invalid[2] = true;
        let dilated = dilate_invalid(&invalid, 20);
        assert!(dilated[..23].iter().all(|f| *f));
        assert!(dilated[23..].iter().all(|f| !*f));
    }

    #[test]
    fn test_kleckner_clean_signal_scores_one() {
        let values = vec![1.0; 240];
        let score = kleckner_automated(&values, &ctx(4.0)).unwrap();
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_kleckner_floor_violation_spreads() {
        // A below-floor region invalidates its 5-second neighbourhood
        let mut values = vec![1.0; 240];
        for v in values.iter_mut().take(140).skip(100) {
            *v = 0.0;
        }
        let score = kleckner_automated(&values, &ctx(4.0)).unwrap();
        assert!(score < 1.0);
        // 40 invalid samples spread by ±20 plus smoothing edges
        assert!(score < (240.0 - 60.0) / 240.0 + 1e-9);
        assert!(score > 0.0);
    }

    #[test]
    fn test_kleckner_slope_violation() {
        // A step of 30 μS at 4 Hz is a 120 μS/s slope even after smoothing
        let mut values = vec![1.0; 240];
        for v in values.iter_mut().skip(120) {
            *v = 31.0;
        }
        let score = kleckner_automated(&values, &ctx(4.0)).unwrap();
        assert!(score < 1.0);
    }

    #[test]
    fn test_kleckner_too_short_rejected() {
        let result = kleckner_automated(&[1.0], &ctx(4.0));
        assert!(matches!(result, Err(SqaError::InvalidSignal { .. })));
    }
}
