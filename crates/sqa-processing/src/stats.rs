//! Shared statistical helpers for windowed signal algorithms

/// Arithmetic mean; 0.0 for an empty slice
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population variance (ddof = 0); 0.0 for an empty slice
pub fn variance(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64
}

/// Median of a slice; 0.0 for an empty slice
pub fn median(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Percentile with linear interpolation between closest ranks
///
/// `q` is in percent (0–100). Matches the numpy default method used by the
/// quartile-based outlier fences.
pub fn percentile(data: &[f64], q: f64) -> f64 {
    debug_assert!(!data.is_empty());
    debug_assert!((0.0..=100.0).contains(&q));

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = (sorted.len() - 1) as f64 * q / 100.0;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = rank - lower as f64;
    sorted[lower] + weight * (sorted[upper] - sorted[lower])
}

/// Biased sample skewness `m3 / m2^(3/2)`
///
/// A zero-variance window has undefined skewness; 0.0 is the safe fallback
/// (a constant window is perfectly symmetric).
pub fn skewness(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let m = mean(data);
    let n = data.len() as f64;
    let m2 = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / n;
    if m2 < 1e-30 {
        return 0.0;
    }
    let m3 = data.iter().map(|x| (x - m).powi(3)).sum::<f64>() / n;
    m3 / m2.powf(1.5)
}

/// Centred moving average with shrinking windows at both edges
///
/// The window at index `i` covers `[i - half, i + half]` clipped to the
/// series, so the output has zero phase shift and the same length as the
/// input.
pub fn centered_moving_average(data: &[f64], half_width: usize) -> Vec<f64> {
    let n = data.len();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let start = i.saturating_sub(half_width);
        let end = (i + half_width + 1).min(n);
        out.push(mean(&data[start..end]));
    }
    out
}
