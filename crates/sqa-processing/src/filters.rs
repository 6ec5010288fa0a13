//! Smoothing and band-limiting filters
//!
//! Named built-in methods (Butterworth, Gaussian) plus a closed registry of
//! pre-vetted custom transforms. The engine never accepts or evaluates
//! caller-supplied source code; extension happens by registering a
//! [`CustomTransform`] ahead of time, and only when the engine was
//! configured to allow it.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqa_core::{Signal, SqaError, SqaResult};

use crate::config::EngineConfig;

/// Default IIR filter order
pub const DEFAULT_ORDER: usize = 2;
/// Default Gaussian smoothing width, sized for heavy EDA smoothing
pub const DEFAULT_GAUSSIAN_SIGMA: f64 = 400.0;
/// Highest accepted IIR filter order
const MAX_ORDER: usize = 8;
/// Kernel truncation radius in units of sigma
const GAUSSIAN_TRUNCATE: f64 = 4.0;

/// Named filter configuration
///
/// `lowcut` alone selects a high-pass, `highcut` alone a low-pass, both
/// together a band-pass. `sigma` applies to the Gaussian method only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Method name: `"butterworth"`, `"gaussian"`, or a registered custom name
    pub method: String,
    /// Lower passband edge in Hz
    pub lowcut: Option<f64>,
    /// Upper passband edge in Hz
    pub highcut: Option<f64>,
    /// IIR filter order
    #[serde(default = "default_order")]
    pub order: usize,
    /// Gaussian smoothing width in samples
    pub sigma: Option<f64>,
}

fn default_order() -> usize {
    DEFAULT_ORDER
}

impl FilterSpec {
    /// Butterworth low-pass configuration
    pub fn lowpass(highcut: f64, order: usize) -> Self {
        FilterSpec {
            method: "butterworth".to_string(),
            lowcut: None,
            highcut: Some(highcut),
            order,
            sigma: None,
        }
    }

    /// Butterworth high-pass configuration
    pub fn highpass(lowcut: f64, order: usize) -> Self {
        FilterSpec {
            method: "butterworth".to_string(),
            lowcut: Some(lowcut),
            highcut: None,
            order,
            sigma: None,
        }
    }

    /// Butterworth band-pass configuration
    pub fn bandpass(lowcut: f64, highcut: f64, order: usize) -> Self {
        FilterSpec {
            method: "butterworth".to_string(),
            lowcut: Some(lowcut),
            highcut: Some(highcut),
            order,
            sigma: None,
        }
    }

    /// Gaussian smoothing configuration
    pub fn gaussian(sigma: f64) -> Self {
        FilterSpec {
            method: "gaussian".to_string(),
            lowcut: None,
            highcut: None,
            order: DEFAULT_ORDER,
            sigma: Some(sigma),
        }
    }

    /// Configuration for a registered custom transform
    pub fn custom(name: &str) -> Self {
        FilterSpec {
            method: name.to_string(),
            lowcut: None,
            highcut: None,
            order: DEFAULT_ORDER,
            sigma: None,
        }
    }
}

/// A pre-vetted, pure `values -> values'` transform
///
/// Implementations must be stateless across calls and must return a series
/// of the same length as the input.
pub trait CustomTransform: Send + Sync {
    fn apply(&self, values: &[f64]) -> SqaResult<Vec<f64>>;
}

impl<F> CustomTransform for F
where
    F: Fn(&[f64]) -> SqaResult<Vec<f64>> + Send + Sync,
{
    fn apply(&self, values: &[f64]) -> SqaResult<Vec<f64>> {
        self(values)
    }
}

/// Dispatches named filter methods over value series
pub struct FilterEngine {
    custom: HashMap<String, Arc<dyn CustomTransform>>,
    allow_custom: bool,
}

impl FilterEngine {
    /// Built-in method names reserved by the engine
    pub const BUILTIN_METHODS: [&'static str; 2] = ["butterworth", "gaussian"];

    /// Create an engine from configuration
    pub fn new(config: &EngineConfig) -> Self {
        FilterEngine {
            custom: HashMap::new(),
            allow_custom: config.allow_custom_transforms,
        }
    }

    /// Create an engine with built-in methods only
    pub fn with_defaults() -> Self {
        FilterEngine::new(&EngineConfig::default())
    }

    /// Register a named custom transform
    ///
    /// Fails when the extension point is disabled or the name collides with
    /// a built-in method.
    pub fn register(&mut self, name: &str, transform: Arc<dyn CustomTransform>) -> SqaResult<()> {
        if !self.allow_custom {
            return Err(SqaError::InvalidParameters {
                reason: "custom transforms are disabled by configuration".to_string(),
            });
        }
        if Self::BUILTIN_METHODS.contains(&name) {
            return Err(SqaError::InvalidParameters {
                reason: format!("'{}' is a built-in method name", name),
            });
        }
        self.custom.insert(name.to_string(), transform);
        Ok(())
    }

    /// Apply a named filter to a value series
    pub fn apply(
        &self,
        values: &[f64],
        spec: &FilterSpec,
        sampling_rate_hz: f64,
    ) -> SqaResult<Vec<f64>> {
        if values.len() < 2 {
            return Err(SqaError::InvalidSignal {
                reason: format!("filtering requires at least 2 samples, got {}", values.len()),
            });
        }
        if !(sampling_rate_hz.is_finite() && sampling_rate_hz > 0.0) {
            return Err(SqaError::InvalidParameters {
                reason: format!("sampling rate must be positive, got {}", sampling_rate_hz),
            });
        }

        match spec.method.as_str() {
            "butterworth" => {
                butterworth(values, spec.lowcut, spec.highcut, spec.order, sampling_rate_hz)
            }
            "gaussian" => gaussian_smooth(values, spec.sigma.unwrap_or(DEFAULT_GAUSSIAN_SIGMA)),
            name => {
                let transform = self
                    .custom
                    .get(name)
                    .filter(|_| self.allow_custom)
                    .ok_or_else(|| SqaError::UnsupportedMethod {
                        method: name.to_string(),
                    })?;
                let out = transform.apply(values)?;
                if out.len() != values.len() {
                    return Err(SqaError::InvalidParameters {
                        reason: format!(
                            "custom transform '{}' returned {} samples for {} inputs",
                            name,
                            out.len(),
                            values.len()
                        ),
                    });
                }
                Ok(out)
            }
        }
    }

    /// Filter a signal's value channel, keeping timestamps untouched
    pub fn filter_signal(
        &self,
        signal: &Signal,
        spec: &FilterSpec,
        sampling_rate_hz: f64,
    ) -> SqaResult<Signal> {
        let filtered = self.apply(signal.values(), spec, sampling_rate_hz)?;
        signal.with_values(filtered)
    }
}

/// Single second-order IIR section in direct form I
///
/// `y[n] = b0·x[n] + b1·x[n-1] + b2·x[n-2] - a1·y[n-1] - a2·y[n-2]`
#[derive(Debug, Clone)]
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl Biquad {
    fn new(b0: f64, b1: f64, b2: f64, a1: f64, a2: f64) -> Self {
        Biquad {
            b0,
            b1,
            b2,
            a1,
            a2,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    fn process_sample(&mut self, input: f64) -> f64 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BandEdge {
    Lowpass,
    Highpass,
}

fn validate_cutoff(cutoff: f64, sampling_rate_hz: f64, label: &str) -> SqaResult<()> {
    let nyquist = sampling_rate_hz / 2.0;
    if !(cutoff.is_finite() && cutoff > 0.0 && cutoff < nyquist) {
        return Err(SqaError::InvalidParameters {
            reason: format!(
                "{} must lie in (0, {} Hz), got {}",
                label, nyquist, cutoff
            ),
        });
    }
    Ok(())
}

/// Design a Butterworth cascade for one band edge
///
/// Section Q values come from the Butterworth pole angles; odd orders add a
/// trailing first-order section expressed as a degenerate biquad.
fn design_butterworth(
    cutoff: f64,
    sampling_rate_hz: f64,
    order: usize,
    edge: BandEdge,
) -> Vec<Biquad> {
    // Pre-warp the analog cutoff for the bilinear transform
    let k = (PI * cutoff / sampling_rate_hz).tan();
    let k2 = k * k;
    let n = order as f64;

    let mut sections = Vec::with_capacity((order + 1) / 2);
    for pair in 0..order / 2 {
        let theta = PI * (2.0 * pair as f64 + 1.0) / (2.0 * n);
        let q = 1.0 / (2.0 * theta.cos());
        let norm = 1.0 / (1.0 + k / q + k2);
        let a1 = 2.0 * (k2 - 1.0) * norm;
        let a2 = (1.0 - k / q + k2) * norm;
        match edge {
            BandEdge::Lowpass => {
                let b0 = k2 * norm;
                sections.push(Biquad::new(b0, 2.0 * b0, b0, a1, a2));
            }
            BandEdge::Highpass => {
                let b0 = norm;
                sections.push(Biquad::new(b0, -2.0 * b0, b0, a1, a2));
            }
        }
    }

    if order % 2 == 1 {
        let norm = 1.0 / (k + 1.0);
        let a1 = (k - 1.0) * norm;
        match edge {
            BandEdge::Lowpass => {
                let b0 = k * norm;
                sections.push(Biquad::new(b0, b0, 0.0, a1, 0.0));
            }
            BandEdge::Highpass => {
                sections.push(Biquad::new(norm, -norm, 0.0, a1, 0.0));
            }
        }
    }

    sections
}

/// Zero-phase Butterworth filtering
///
/// The cascade runs forward over the series, then backward with reset
/// state, cancelling the phase shift of the IIR sections.
fn butterworth(
    values: &[f64],
    lowcut: Option<f64>,
    highcut: Option<f64>,
    order: usize,
    sampling_rate_hz: f64,
) -> SqaResult<Vec<f64>> {
    if order == 0 || order > MAX_ORDER {
        return Err(SqaError::InvalidParameters {
            reason: format!("filter order must be in 1..={}, got {}", MAX_ORDER, order),
        });
    }

    let mut sections = Vec::new();
    match (lowcut, highcut) {
        (None, None) => {
            return Err(SqaError::InvalidParameters {
                reason: "butterworth requires lowcut, highcut or both".to_string(),
            });
        }
        (Some(low), Some(high)) => {
            validate_cutoff(low, sampling_rate_hz, "lowcut")?;
            validate_cutoff(high, sampling_rate_hz, "highcut")?;
            if low >= high {
                return Err(SqaError::InvalidParameters {
                    reason: format!("lowcut {} must be below highcut {}", low, high),
                });
            }
            sections.extend(design_butterworth(
                low,
                sampling_rate_hz,
                order,
                BandEdge::Highpass,
            ));
            sections.extend(design_butterworth(
                high,
                sampling_rate_hz,
                order,
                BandEdge::Lowpass,
            ));
        }
        (Some(low), None) => {
            validate_cutoff(low, sampling_rate_hz, "lowcut")?;
            sections = design_butterworth(low, sampling_rate_hz, order, BandEdge::Highpass);
        }
        (None, Some(high)) => {
            validate_cutoff(high, sampling_rate_hz, "highcut")?;
            sections = design_butterworth(high, sampling_rate_hz, order, BandEdge::Lowpass);
        }
    }

    tracing::debug!(
        sections = sections.len(),
        order,
        lowcut,
        highcut,
        "designed butterworth cascade"
    );

    // Forward pass
    let mut forward = Vec::with_capacity(values.len());
    for &v in values {
        let mut sample = v;
        for section in &mut sections {
            sample = section.process_sample(sample);
        }
        forward.push(sample);
    }

    // Backward pass with cleared state
    for section in &mut sections {
        section.reset();
    }
    let mut out = vec![0.0; forward.len()];
    for (i, &v) in forward.iter().rev().enumerate() {
        let mut sample = v;
        for section in &mut sections {
            sample = section.process_sample(sample);
        }
        out[forward.len() - 1 - i] = sample;
    }

    Ok(out)
}

/// Gaussian smoothing with a reflected boundary
fn gaussian_smooth(values: &[f64], sigma: f64) -> SqaResult<Vec<f64>> {
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(SqaError::InvalidParameters {
            reason: format!("sigma must be a positive finite number, got {}", sigma),
        });
    }

    let radius = (GAUSSIAN_TRUNCATE * sigma).trunc() as i64;
    let radius = radius.max(1);

    let mut kernel = Vec::with_capacity(2 * radius as usize + 1);
    for offset in -radius..=radius {
        let x = offset as f64 / sigma;
        kernel.push((-0.5 * x * x).exp());
    }
    let norm: f64 = kernel.iter().sum();

    let n = values.len() as i64;
    let mut out = Vec::with_capacity(values.len());
    for i in 0..n {
        let mut acc = 0.0;
        for (j, weight) in kernel.iter().enumerate() {
            let idx = reflect_index(i + j as i64 - radius, n);
            acc += weight * values[idx];
        }
        out.push(acc / norm);
    }
    Ok(out)
}

/// Map an out-of-range index into the series by edge reflection
fn reflect_index(i: i64, n: i64) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * n;
    let mut idx = i.rem_euclid(period);
    if idx >= n {
        idx = period - 1 - idx;
    }
    idx as usize
}
