//! Outlier detection and repair for physiological signals
//!
//! Two interchangeable policies: plain IQR fencing, and a Hampel smoothing
//! pre-pass followed by the same IQR fencing. Only the value channel is
//! corrected; timestamps are untouched.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqa_core::{Signal, SqaError, SqaResult};

use crate::stats;

/// Minimum series length for quartile-based fencing
pub const MIN_SAMPLES: usize = 4;

/// Fixed internal sampling assumption for the Hampel pre-pass, in Hz
const HAMPEL_ASSUMED_RATE_HZ: f64 = 4.0;
/// Hampel window length in seconds (centred)
const HAMPEL_WINDOW_SECS: f64 = 1.0;
/// Hampel rejection threshold in scaled-MAD units
const HAMPEL_N_SIGMA: f64 = 3.0;
/// Consistency constant relating MAD to the standard deviation
const MAD_SCALE: f64 = 1.4826;

/// Outlier correction strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierPolicy {
    /// Interquartile-range fencing on the raw series
    Iqr,
    /// Hampel smoothing pre-pass, then IQR fencing on the cleaned series
    Hampel,
}

impl std::fmt::Display for OutlierPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutlierPolicy::Iqr => write!(f, "iqr"),
            OutlierPolicy::Hampel => write!(f, "hampel"),
        }
    }
}

impl FromStr for OutlierPolicy {
    type Err = SqaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "iqr" => Ok(OutlierPolicy::Iqr),
            "hampel" => Ok(OutlierPolicy::Hampel),
            other => Err(SqaError::UnsupportedMethod {
                method: other.to_string(),
            }),
        }
    }
}

/// Detect and repair anomalous samples in a value series
pub fn correct(values: &[f64], policy: OutlierPolicy) -> SqaResult<Vec<f64>> {
    if values.len() < MIN_SAMPLES {
        return Err(SqaError::InvalidSignal {
            reason: format!(
                "outlier correction requires at least {} samples, got {}",
                MIN_SAMPLES,
                values.len()
            ),
        });
    }

    match policy {
        OutlierPolicy::Iqr => Ok(iqr_correct(values)),
        OutlierPolicy::Hampel => {
            let cleaned = hampel_smooth(values);
            Ok(iqr_correct(&cleaned))
        }
    }
}

/// Correct a signal's value channel, keeping timestamps untouched
pub fn correct_signal(signal: &Signal, policy: OutlierPolicy) -> SqaResult<Signal> {
    let corrected = correct(signal.values(), policy)?;
    signal.with_values(corrected)
}

/// IQR fences for a series: `(Q1 - 1.5·IQR, Q3 + 1.5·IQR)`
pub fn iqr_fences(values: &[f64]) -> (f64, f64) {
    let q1 = stats::percentile(values, 25.0);
    let q3 = stats::percentile(values, 75.0);
    let iqr = q3 - q1;
    (q1 - 1.5 * iqr, q3 + 1.5 * iqr)
}

fn iqr_correct(values: &[f64]) -> Vec<f64> {
    let (lower, upper) = iqr_fences(values);
    let missing: Vec<bool> = values.iter().map(|&v| v < lower || v > upper).collect();
    repair(values, &missing)
}

/// Fill samples marked missing
///
/// Interior gaps are linearly interpolated between the nearest valid
/// neighbours by index. Runs at either end with no valid neighbour on one
/// side fall back to the mean of the non-missing values. If every sample is
/// missing the whole series collapses to its global mean.
fn repair(values: &[f64], missing: &[bool]) -> Vec<f64> {
    let n = values.len();
    let valid_indices: Vec<usize> = (0..n).filter(|&i| !missing[i]).collect();

    if valid_indices.is_empty() {
        let fallback = stats::mean(values);
        tracing::warn!(
            samples = n,
            fallback,
            "every sample flagged as outlier, substituting global mean"
        );
        return vec![fallback; n];
    }

    let valid_mean = {
        let kept: Vec<f64> = valid_indices.iter().map(|&i| values[i]).collect();
        stats::mean(&kept)
    };

    let first_valid = valid_indices[0];
    let last_valid = valid_indices[valid_indices.len() - 1];

    let mut out = Vec::with_capacity(n);
    let mut cursor = 0; // position in valid_indices of the next valid index > i
    for i in 0..n {
        if !missing[i] {
            while cursor < valid_indices.len() && valid_indices[cursor] <= i {
                cursor += 1;
            }
            out.push(values[i]);
            continue;
        }

        if i < first_valid || i > last_valid {
            // No valid neighbour on one side
            out.push(valid_mean);
            continue;
        }

        while cursor < valid_indices.len() && valid_indices[cursor] < i {
            cursor += 1;
        }
        let right = valid_indices[cursor];
        let left = valid_indices[cursor - 1];
        let weight = (i - left) as f64 / (right - left) as f64;
        out.push(values[left] + weight * (values[right] - values[left]));
    }
    out
}

/// Hampel filter pass: replace spike samples with the local window median
///
/// The window is one second at the fixed internal sampling assumption,
/// centred; a sample deviating from the window median by more than
/// `3 · 1.4826 · MAD` is replaced.
fn hampel_smooth(values: &[f64]) -> Vec<f64> {
    let half = ((HAMPEL_ASSUMED_RATE_HZ * HAMPEL_WINDOW_SECS) / 2.0).round() as usize;
    let n = values.len();
    let mut out = values.to_vec();

    for i in 0..n {
        let start = i.saturating_sub(half);
        let end = (i + half + 1).min(n);
        let window = &values[start..end];

        let med = stats::median(window);
        let deviations: Vec<f64> = window.iter().map(|v| (v - med).abs()).collect();
        let mad = stats::median(&deviations);
        let threshold = HAMPEL_N_SIGMA * MAD_SCALE * mad;

        if (values[i] - med).abs() > threshold {
            out[i] = med;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_short_rejected() {
        for policy in [OutlierPolicy::Iqr, OutlierPolicy::Hampel] {
            let result = correct(&[1.0, 2.0, 3.0], policy);
            assert!(matches!(result, Err(SqaError::InvalidSignal { .. })));
        }
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("iqr".parse::<OutlierPolicy>().unwrap(), OutlierPolicy::Iqr);
        assert_eq!(
            "HAMPEL".parse::<OutlierPolicy>().unwrap(),
            OutlierPolicy::Hampel
        );
        assert!("zscore".parse::<OutlierPolicy>().is_err());
    }

    #[test]
    fn test_iqr_spike_repaired_within_fences() {
        let mut values = vec![1.0; 240];
        values[120] = 1000.0;

        let corrected = correct(&values, OutlierPolicy::Iqr).unwrap();
        let (lower, upper) = iqr_fences(&values);

        assert!(corrected[120] >= lower && corrected[120] <= upper);
        assert!((corrected[120] - 1.0).abs() < 1e-12);
        // All other samples untouched
        for (i, v) in corrected.iter().enumerate() {
            if i != 120 {
                assert_eq!(*v, 1.0);
            }
        }
    }

    #[test]
    fn test_iqr_idempotence() {
        let mut values: Vec<f64> = (0..100).map(|i| 1.0 + 0.01 * (i as f64).sin()).collect();
        values[10] = 50.0;
        values[70] = -40.0;

        let once = correct(&values, OutlierPolicy::Iqr).unwrap();
        let twice = correct(&once, OutlierPolicy::Iqr).unwrap();
        assert_eq!(once, twice);

        // A second pass flags zero samples
        let (lower, upper) = iqr_fences(&once);
        assert!(once.iter().all(|&v| v >= lower && v <= upper));
    }

    #[test]
    fn test_degenerate_identical_values() {
        let values = vec![3.3; 50];
        let corrected = correct(&values, OutlierPolicy::Iqr).unwrap();
        assert_eq!(corrected, values);
    }

    #[test]
    fn test_interior_gap_interpolated_by_index() {
        // Outlier flanked by 1.0 and 2.0 one index apart lands midway
        let mut values = vec![1.0, 1.0, 1.0, 1.0, 1.0, 500.0, 2.0, 2.0, 2.0, 2.0, 2.0];
        values[5] = 500.0;
        let corrected = correct(&values, OutlierPolicy::Iqr).unwrap();
        assert!((corrected[5] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_edge_outlier_gets_valid_mean() {
        let mut values = vec![1.0; 20];
        values[0] = 900.0;
        let corrected = correct(&values, OutlierPolicy::Iqr).unwrap();
        // No left neighbour: fallback is the mean of the 19 valid samples
        assert!((corrected[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_all_missing_collapses_to_global_mean() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let repaired = repair(&values, &[true, true, true, true]);
        assert_eq!(repaired, vec![2.5; 4]);
    }

    #[test]
    fn test_hampel_suppresses_spike_before_fencing() {
        let mut values: Vec<f64> = (0..120).map(|i| 1.0 + 0.05 * (i as f64 * 0.3).sin()).collect();
        values[60] = 200.0;

        let corrected = correct(&values, OutlierPolicy::Hampel).unwrap();
        assert!(corrected[60] < 2.0);
        assert!(corrected.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_hampel_preserves_clean_baseline() {
        let values = vec![1.0; 40];
        let corrected = correct(&values, OutlierPolicy::Hampel).unwrap();
        assert_eq!(corrected, values);
    }

    #[test]
    fn test_correct_signal_keeps_timestamps() {
        let mut values = vec![1.0; 16];
        values[8] = 100.0;
        let signal = Signal::uniform(0.0, 4.0, values).unwrap();

        let corrected = correct_signal(&signal, OutlierPolicy::Iqr).unwrap();
        assert_eq!(corrected.timestamps(), signal.timestamps());
        assert!((corrected.values()[8] - 1.0).abs() < 1e-12);
    }
}
