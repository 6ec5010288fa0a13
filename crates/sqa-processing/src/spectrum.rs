//! One-sided power spectrum of a value series
//!
//! Display-oriented helper for callers that plot signals next to their
//! frequency content. The mean is removed before the transform so the DC
//! bin does not swamp the physiological bands.

use realfft::RealFftPlanner;
use rustfft::num_complex::Complex;
use serde::Serialize;
use sqa_core::{SamplingContext, SqaError, SqaResult};

use crate::stats;

/// One-sided spectrum with bin frequencies in Hz
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spectrum {
    pub frequencies: Vec<f64>,
    pub power: Vec<f64>,
}

impl Spectrum {
    /// Frequency of the highest-power bin
    pub fn peak_frequency(&self) -> Option<f64> {
        self.power
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| self.frequencies[i])
    }
}

/// Compute the one-sided power spectrum of the mean-removed series
pub fn power_spectrum(values: &[f64], ctx: &SamplingContext) -> SqaResult<Spectrum> {
    let n = values.len();
    if n < 2 {
        return Err(SqaError::InvalidSignal {
            reason: format!("spectrum requires at least 2 samples, got {}", n),
        });
    }

    let mean = stats::mean(values);
    let mut input: Vec<f64> = values.iter().map(|v| v - mean).collect();

    let mut planner = RealFftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    let mut output: Vec<Complex<f64>> = fft.make_output_vec();
    fft.process(&mut input, &mut output)
        .map_err(|e| SqaError::NumericInstability {
            reason: format!("forward FFT failed: {}", e),
        })?;

    let scale = 1.0 / (n as f64 * n as f64);
    let power: Vec<f64> = output.iter().map(|c| c.norm_sqr() * scale).collect();
    let frequencies: Vec<f64> = (0..output.len())
        .map(|k| k as f64 * ctx.sampling_rate_hz / n as f64)
        .collect();

    Ok(Spectrum { frequencies, power })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_too_short_rejected() {
        let ctx = SamplingContext::new(4.0).unwrap();
        assert!(matches!(
            power_spectrum(&[1.0], &ctx),
            Err(SqaError::InvalidSignal { .. })
        ));
    }

    #[test]
    fn test_sine_peak_bin() {
        let ctx = SamplingContext::new(64.0).unwrap();
        let values: Vec<f64> = (0..256)
            .map(|i| (2.0 * PI * 5.0 * i as f64 / 64.0).sin())
            .collect();

        let spectrum = power_spectrum(&values, &ctx).unwrap();
        assert_eq!(spectrum.power.len(), 129);
        assert_eq!(spectrum.frequencies.len(), 129);
        // 5 Hz lands exactly on bin 20 of a 256-point transform at 64 Hz
        assert!((spectrum.peak_frequency().unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_signal_has_no_power() {
        let ctx = SamplingContext::new(4.0).unwrap();
        let spectrum = power_spectrum(&[2.0; 64], &ctx).unwrap();
        assert!(spectrum.power.iter().all(|p| *p < 1e-18));
    }

    #[test]
    fn test_bin_spacing() {
        let ctx = SamplingContext::new(4.0).unwrap();
        let spectrum = power_spectrum(&[0.0; 16], &ctx).unwrap();
        assert_eq!(spectrum.frequencies[0], 0.0);
        assert!((spectrum.frequencies[1] - 0.25).abs() < 1e-12);
        assert!((spectrum.frequencies[8] - 2.0).abs() < 1e-12);
    }
}
