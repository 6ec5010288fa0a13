//! Synthetic signal generator with realistic noise and artifacts

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use sqa_core::{Signal, SqaError, SqaResult};

use crate::patterns::SignalPattern;

/// Noise model applied on top of the deterministic pattern
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Gaussian noise standard deviation (0.0 = no noise)
    pub gaussian_std: f64,
    /// Baseline wander amplitude (slow 0.05 Hz oscillation)
    pub baseline_wander: f64,
    /// Per-sample spike artifact probability (0.0 to 1.0)
    pub spike_probability: f64,
    /// Spike artifact amplitude
    pub spike_amplitude: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            gaussian_std: 0.02,
            baseline_wander: 0.05,
            spike_probability: 0.0,
            spike_amplitude: 10.0,
        }
    }
}

impl NoiseConfig {
    /// Completely clean output
    pub fn none() -> Self {
        Self {
            gaussian_std: 0.0,
            baseline_wander: 0.0,
            spike_probability: 0.0,
            spike_amplitude: 0.0,
        }
    }
}

/// Configuration for synthetic signal generation
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Sampling rate in Hz
    pub sampling_rate_hz: f64,
    /// Signal duration in seconds
    pub duration_secs: f64,
    /// Noise model
    pub noise: NoiseConfig,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl GeneratorConfig {
    /// Typical EDA recording setup: 4 Hz, one minute
    pub fn eda_default() -> Self {
        Self {
            sampling_rate_hz: 4.0,
            duration_secs: 60.0,
            noise: NoiseConfig::default(),
            seed: None,
        }
    }

    /// Typical PPG recording setup: 64 Hz, thirty seconds
    pub fn ppg_default() -> Self {
        Self {
            sampling_rate_hz: 64.0,
            duration_secs: 30.0,
            noise: NoiseConfig::default(),
            seed: None,
        }
    }
}

/// Frequency of the simulated baseline wander, Hz
const WANDER_FREQ_HZ: f64 = 0.05;

/// Seeded generator producing uniform signals from a pattern plus noise
pub struct SignalGenerator {
    config: GeneratorConfig,
    rng: StdRng,
}

impl SignalGenerator {
    /// Create a generator, validating the configuration
    pub fn new(config: GeneratorConfig) -> SqaResult<Self> {
        if !(config.sampling_rate_hz.is_finite() && config.sampling_rate_hz > 0.0) {
            return Err(SqaError::InvalidParameters {
                reason: format!(
                    "sampling rate must be positive, got {}",
                    config.sampling_rate_hz
                ),
            });
        }
        if !(config.duration_secs.is_finite() && config.duration_secs > 0.0) {
            return Err(SqaError::InvalidParameters {
                reason: format!("duration must be positive, got {}", config.duration_secs),
            });
        }
        if !(0.0..=1.0).contains(&config.noise.spike_probability) {
            return Err(SqaError::InvalidParameters {
                reason: format!(
                    "spike probability must be within [0, 1], got {}",
                    config.noise.spike_probability
                ),
            });
        }
        if config.noise.gaussian_std < 0.0 || config.noise.baseline_wander < 0.0 {
            return Err(SqaError::InvalidParameters {
                reason: "noise amplitudes must be non-negative".to_string(),
            });
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(SignalGenerator { config, rng })
    }

    /// Generate one signal realisation of the pattern
    pub fn generate(&mut self, pattern: &SignalPattern) -> SqaResult<Signal> {
        let rate = self.config.sampling_rate_hz;
        let samples = (rate * self.config.duration_secs).round() as usize;
        let noise = self.config.noise;

        let mut values = Vec::with_capacity(samples);
        for i in 0..samples {
            let t = i as f64 / rate;
            let mut value = pattern.value_at(t);

            if noise.baseline_wander > 0.0 {
                value += noise.baseline_wander
                    * (2.0 * std::f64::consts::PI * WANDER_FREQ_HZ * t).sin();
            }
            if noise.gaussian_std > 0.0 {
                let draw: f64 = self.rng.sample(StandardNormal);
                value += noise.gaussian_std * draw;
            }
            if noise.spike_probability > 0.0 && self.rng.gen_bool(noise.spike_probability) {
                value += noise.spike_amplitude;
            }

            values.push(value);
        }

        Signal::uniform(0.0, rate, values)
    }
}
