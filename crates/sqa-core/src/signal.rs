//! Signal: core container for physiological time-series data

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{SqaError, SqaResult};

/// Universal container for a single-channel physiological signal
///
/// Timestamps are seconds, values are the physical unit of the signal
/// (μS for EDA, arbitrary units for PPG/BVP). Both channels always have
/// the same non-zero length and contain only finite numbers. Ordering by
/// timestamp is a caller contract; operations that require strict
/// monotonicity (resampling) verify it explicitly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    /// Unique identifier for this signal entity
    pub id: Uuid,
    timestamps: Vec<f64>,
    values: Vec<f64>,
}

impl Signal {
    /// Create a new signal from parallel timestamp/value channels
    pub fn new(timestamps: Vec<f64>, values: Vec<f64>) -> SqaResult<Self> {
        if timestamps.is_empty() {
            return Err(SqaError::InvalidSignal {
                reason: "signal must contain at least one sample".to_string(),
            });
        }
        if timestamps.len() != values.len() {
            return Err(SqaError::InvalidSignal {
                reason: format!(
                    "timestamp channel has {} samples but value channel has {}",
                    timestamps.len(),
                    values.len()
                ),
            });
        }
        if timestamps.iter().any(|t| !t.is_finite()) {
            return Err(SqaError::InvalidSignal {
                reason: "timestamps must be finite".to_string(),
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(SqaError::InvalidSignal {
                reason: "values must be finite".to_string(),
            });
        }

        Ok(Signal {
            id: Uuid::new_v4(),
            timestamps,
            values,
        })
    }

    /// Create a signal from `(timestamp, value)` pairs, the transport form
    pub fn from_pairs(pairs: &[(f64, f64)]) -> SqaResult<Self> {
        let timestamps = pairs.iter().map(|(t, _)| *t).collect();
        let values = pairs.iter().map(|(_, v)| *v).collect();
        Signal::new(timestamps, values)
    }

    /// Create a uniformly sampled signal starting at `start_time`
    pub fn uniform(start_time: f64, sampling_rate_hz: f64, values: Vec<f64>) -> SqaResult<Self> {
        if !(sampling_rate_hz.is_finite() && sampling_rate_hz > 0.0) {
            return Err(SqaError::InvalidSignal {
                reason: format!("sampling rate must be positive, got {}", sampling_rate_hz),
            });
        }
        let period = 1.0 / sampling_rate_hz;
        let timestamps = (0..values.len())
            .map(|i| start_time + i as f64 * period)
            .collect();
        Signal::new(timestamps, values)
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the signal is empty (never true for a constructed signal)
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Timestamp channel
    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// Value channel
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// First timestamp
    pub fn start_time(&self) -> f64 {
        self.timestamps[0]
    }

    /// Last timestamp
    pub fn end_time(&self) -> f64 {
        self.timestamps[self.timestamps.len() - 1]
    }

    /// Signal duration in seconds
    pub fn duration(&self) -> f64 {
        self.end_time() - self.start_time()
    }

    /// Render the `[timestamp, value]` pair form consumed by transports
    pub fn pairs(&self) -> Vec<(f64, f64)> {
        self.timestamps
            .iter()
            .copied()
            .zip(self.values.iter().copied())
            .collect()
    }

    /// Replace the value channel, keeping timestamps untouched
    ///
    /// Used by outlier correction and filtering, which operate on the value
    /// channel only. The result is a fresh entity with a new id.
    pub fn with_values(&self, values: Vec<f64>) -> SqaResult<Self> {
        if values.len() != self.timestamps.len() {
            return Err(SqaError::InvalidSignal {
                reason: format!(
                    "replacement value channel has {} samples, expected {}",
                    values.len(),
                    self.timestamps.len()
                ),
            });
        }
        Signal::new(self.timestamps.clone(), values)
    }

    /// Verify strictly increasing timestamps
    ///
    /// Duplicate or decreasing timestamps are a contract violation for
    /// interpolation-based operations.
    pub fn ensure_strictly_increasing(&self) -> SqaResult<()> {
        for window in self.timestamps.windows(2) {
            if window[1] <= window[0] {
                return Err(SqaError::InvalidSignal {
                    reason: format!(
                        "timestamps must be strictly increasing, found {} after {}",
                        window[1], window[0]
                    ),
                });
            }
        }
        Ok(())
    }

    /// Mean spacing between consecutive timestamps
    pub fn mean_sample_interval(&self) -> Option<f64> {
        if self.timestamps.len() < 2 {
            return None;
        }
        Some(self.duration() / (self.timestamps.len() - 1) as f64)
    }

    /// Sampling rate estimate from the mean sample interval
    pub fn estimated_rate(&self) -> Option<f64> {
        self.mean_sample_interval()
            .filter(|dt| *dt > 0.0)
            .map(|dt| 1.0 / dt)
    }

    /// Calculate basic statistics over the value channel
    pub fn stats(&self) -> SignalStats {
        SignalStats::calculate(&self.values)
    }
}

/// Sampling-rate context carried alongside a signal
///
/// Windowed algorithms need a notion of "N samples per second" that is not
/// derivable from irregular timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingContext {
    /// Sampling rate in Hz
    pub sampling_rate_hz: f64,
}

impl SamplingContext {
    /// Create a validated sampling context
    pub fn new(sampling_rate_hz: f64) -> SqaResult<Self> {
        if !(sampling_rate_hz.is_finite() && sampling_rate_hz > 0.0) {
            return Err(SqaError::InvalidParameters {
                reason: format!(
                    "sampling rate must be a positive finite number, got {}",
                    sampling_rate_hz
                ),
            });
        }
        Ok(SamplingContext { sampling_rate_hz })
    }

    /// Sample period in seconds
    pub fn period(&self) -> f64 {
        1.0 / self.sampling_rate_hz
    }

    /// Number of samples covering `seconds` of data, rounded
    pub fn samples_in(&self, seconds: f64) -> usize {
        (seconds * self.sampling_rate_hz).round() as usize
    }
}

/// Basic statistics for a signal's value channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalStats {
    pub mean: f64,
    pub rms: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub peak_to_peak: f64,
}

impl SignalStats {
    pub fn calculate(data: &[f64]) -> Self {
        if data.is_empty() {
            return Self {
                mean: 0.0,
                rms: 0.0,
                std_dev: 0.0,
                min: 0.0,
                max: 0.0,
                peak_to_peak: 0.0,
            };
        }

        let sum: f64 = data.iter().sum();
        let mean = sum / data.len() as f64;

        let sum_sq: f64 = data.iter().map(|x| x * x).sum();
        let rms = (sum_sq / data.len() as f64).sqrt();

        let variance: f64 =
            data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / data.len() as f64;
        let std_dev = variance.sqrt();

        let min = data.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let max = data.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        let peak_to_peak = max - min;

        Self {
            mean,
            rms,
            std_dev,
            min,
            max,
            peak_to_peak,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_creation() {
        let signal = Signal::new(vec![0.0, 0.25, 0.5, 0.75], vec![1.0, 2.0, 3.0, 4.0]).unwrap();

        assert_eq!(signal.len(), 4);
        assert_eq!(signal.start_time(), 0.0);
        assert_eq!(signal.end_time(), 0.75);
        assert!((signal.duration() - 0.75).abs() < 1e-12);
        assert_eq!(signal.estimated_rate(), Some(4.0));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let result = Signal::new(vec![0.0, 1.0], vec![1.0]);
        assert!(matches!(result, Err(SqaError::InvalidSignal { .. })));
    }

    #[test]
    fn test_empty_rejected() {
        let result = Signal::new(vec![], vec![]);
        assert!(matches!(result, Err(SqaError::InvalidSignal { .. })));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(Signal::new(vec![0.0, f64::NAN], vec![1.0, 2.0]).is_err());
        assert!(Signal::new(vec![0.0, 1.0], vec![1.0, f64::INFINITY]).is_err());
    }

    #[test]
    fn test_pairs_round_trip() {
        let pairs = vec![(0.0, 0.5), (0.25, 0.7), (0.5, 0.6)];
        let signal = Signal::from_pairs(&pairs).unwrap();
        assert_eq!(signal.pairs(), pairs);
    }

    #[test]
    fn test_uniform_grid() {
        let signal = Signal::uniform(10.0, 4.0, vec![0.0; 9]).unwrap();
        assert_eq!(signal.start_time(), 10.0);
        assert!((signal.end_time() - 12.0).abs() < 1e-12);
        assert!(signal.ensure_strictly_increasing().is_ok());
    }

    #[test]
    fn test_with_values_keeps_timestamps() {
        let signal = Signal::uniform(0.0, 4.0, vec![1.0, 2.0, 3.0]).unwrap();
        let replaced = signal.with_values(vec![9.0, 9.0, 9.0]).unwrap();

        assert_eq!(replaced.timestamps(), signal.timestamps());
        assert_eq!(replaced.values(), &[9.0, 9.0, 9.0]);
        assert_ne!(replaced.id, signal.id);

        assert!(signal.with_values(vec![1.0]).is_err());
    }

    #[test]
    fn test_monotonicity_check() {
        let signal = Signal::new(vec![0.0, 1.0, 1.0, 2.0], vec![0.0; 4]).unwrap();
        assert!(signal.ensure_strictly_increasing().is_err());

        let signal = Signal::new(vec![0.0, 1.0, 0.5, 2.0], vec![0.0; 4]).unwrap();
        assert!(signal.ensure_strictly_increasing().is_err());
    }

    #[test]
    fn test_sampling_context() {
        let ctx = SamplingContext::new(4.0).unwrap();
        assert_eq!(ctx.period(), 0.25);
        assert_eq!(ctx.samples_in(2.0), 8);
        assert_eq!(ctx.samples_in(60.0), 240);

        assert!(SamplingContext::new(0.0).is_err());
        assert!(SamplingContext::new(-1.0).is_err());
        assert!(SamplingContext::new(f64::NAN).is_err());
    }

    #[test]
    fn test_stats() {
        let stats = SignalStats::calculate(&[1.0, 2.0, 3.0, 4.0]);
        assert!((stats.mean - 2.5).abs() < 1e-12);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        assert_eq!(stats.peak_to_peak, 3.0);
        assert!((stats.std_dev - 1.118033988749895).abs() < 1e-12);
    }
}
