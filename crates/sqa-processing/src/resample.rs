//! Resampling onto a uniform time grid
//!
//! Interpolates a (possibly irregular) signal onto a grid starting at the
//! first timestamp with step `1/target_rate_hz`. The grid never extends
//! past the last timestamp, so no technique extrapolates.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqa_core::{Signal, SqaError, SqaResult};

/// Interpolation techniques for resampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleTechnique {
    /// Piecewise-linear interpolation through every sample
    Linear,
    /// Smoothing spline: a fixed binomial pre-smooth followed by a natural
    /// cubic spline, so the result need not pass through every raw sample
    Spline,
}

impl std::fmt::Display for ResampleTechnique {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResampleTechnique::Linear => write!(f, "linear"),
            ResampleTechnique::Spline => write!(f, "spline"),
        }
    }
}

impl FromStr for ResampleTechnique {
    type Err = SqaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" | "1d" => Ok(ResampleTechnique::Linear),
            "spline" => Ok(ResampleTechnique::Spline),
            other => Err(SqaError::UnsupportedMethod {
                method: other.to_string(),
            }),
        }
    }
}

/// Resample a signal onto a uniform grid at `target_rate_hz`
pub fn resample(
    signal: &Signal,
    target_rate_hz: f64,
    technique: ResampleTechnique,
) -> SqaResult<Signal> {
    if signal.len() < 2 {
        return Err(SqaError::InvalidSignal {
            reason: format!("resampling requires at least 2 samples, got {}", signal.len()),
        });
    }
    signal.ensure_strictly_increasing()?;
    if !(target_rate_hz.is_finite() && target_rate_hz > 0.0) {
        return Err(SqaError::InvalidSignal {
            reason: format!("target rate must be positive, got {}", target_rate_hz),
        });
    }

    let start = signal.start_time();
    let duration = signal.duration();
    let sample_count = (duration * target_rate_hz).floor() as usize + 1;
    let grid: Vec<f64> = (0..sample_count)
        .map(|i| start + i as f64 / target_rate_hz)
        .collect();

    let values = match technique {
        ResampleTechnique::Linear => {
            interp_linear(signal.timestamps(), signal.values(), &grid)
        }
        ResampleTechnique::Spline => {
            let smoothed = binomial_smooth(signal.values());
            let spline = NaturalCubicSpline::fit(signal.timestamps(), &smoothed);
            grid.iter().map(|&t| spline.evaluate(t)).collect()
        }
    };

    Signal::new(grid, values)
}

/// Piecewise-linear interpolation; query points outside the knot range are
/// clamped to the edge values (the grid construction keeps them inside)
fn interp_linear(xs: &[f64], ys: &[f64], queries: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let mut out = Vec::with_capacity(queries.len());
    let mut segment = 0;
    for &q in queries {
        if q <= xs[0] {
            out.push(ys[0]);
            continue;
        }
        if q >= xs[n - 1] {
            out.push(ys[n - 1]);
            continue;
        }
        while segment + 2 < n && xs[segment + 1] < q {
            segment += 1;
        }
        let (x0, x1) = (xs[segment], xs[segment + 1]);
        let weight = (q - x0) / (x1 - x0);
        out.push(ys[segment] + weight * (ys[segment + 1] - ys[segment]));
    }
    out
}

/// Fixed 3-point binomial smoothing `[1/4, 1/2, 1/4]`, endpoints untouched
fn binomial_smooth(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 3 {
        return values.to_vec();
    }
    let mut out = Vec::with_capacity(n);
    out.push(values[0]);
    for i in 1..n - 1 {
        out.push(0.25 * values[i - 1] + 0.5 * values[i] + 0.25 * values[i + 1]);
    }
    out.push(values[n - 1]);
    out
}

/// Natural cubic spline through a set of strictly increasing knots
///
/// Second derivatives at the ends are zero; the tridiagonal system is
/// solved with the Thomas algorithm.
struct NaturalCubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    second_derivatives: Vec<f64>,
}

impl NaturalCubicSpline {
    fn fit(xs: &[f64], ys: &[f64]) -> Self {
        let n = xs.len();
        let mut m = vec![0.0; n];
        if n > 2 {
            let interior = n - 2;
            let mut diag = vec![0.0; interior];
            let mut upper = vec![0.0; interior];
            let mut lower = vec![0.0; interior];
            let mut rhs = vec![0.0; interior];

            for i in 0..interior {
                let h0 = xs[i + 1] - xs[i];
                let h1 = xs[i + 2] - xs[i + 1];
                lower[i] = h0;
                diag[i] = 2.0 * (h0 + h1);
                upper[i] = h1;
                rhs[i] = 6.0
                    * ((ys[i + 2] - ys[i + 1]) / h1 - (ys[i + 1] - ys[i]) / h0);
            }

            // Thomas forward sweep
            for i in 1..interior {
                let factor = lower[i] / diag[i - 1];
                diag[i] -= factor * upper[i - 1];
                rhs[i] -= factor * rhs[i - 1];
            }
            // Back substitution
            m[interior] = rhs[interior - 1] / diag[interior - 1];
            for i in (1..interior).rev() {
                m[i] = (rhs[i - 1] - upper[i - 1] * m[i + 1]) / diag[i - 1];
            }
        }

        NaturalCubicSpline {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            second_derivatives: m,
        }
    }

    fn evaluate(&self, x: f64) -> f64 {
        let n = self.xs.len();
        if x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[n - 1] {
            return self.ys[n - 1];
        }

        // Binary search for the segment containing x
        let mut lo = 0;
        let mut hi = n - 1;
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            if self.xs[mid] <= x {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        let h = self.xs[hi] - self.xs[lo];
        let t = x - self.xs[lo];
        let (m0, m1) = (self.second_derivatives[lo], self.second_derivatives[hi]);
        let slope = (self.ys[hi] - self.ys[lo]) / h - h / 6.0 * (2.0 * m0 + m1);
        self.ys[lo] + slope * t + m0 / 2.0 * t * t + (m1 - m0) / (6.0 * h) * t * t * t
    }
}
