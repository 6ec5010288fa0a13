//! Quality metric engine
//!
//! Literature-defined scalar quality scores for EDA and PPG signals, plus
//! the report assembly consumed by transports and the pipeline search.

pub mod eda;
pub mod ppg;

use sqa_core::{MetricId, QualityReport, SamplingContext, Signal, SignalKind, SqaResult};

pub use eda::{bottcher_rac, kleckner_automated};
pub use ppg::{elgendi_skewness, peak_height_variance};

/// Compute a single metric over a value series
pub fn score(values: &[f64], metric: MetricId, ctx: &SamplingContext) -> SqaResult<f64> {
    match metric {
        MetricId::BottcherRac => eda::bottcher_rac(values, ctx),
        MetricId::KlecknerAutomated => eda::kleckner_automated(values, ctx),
        MetricId::ElgendiSkewness => ppg::elgendi_skewness(values, ctx),
        MetricId::PhvVariance => ppg::peak_height_variance(values, ctx),
    }
}

/// Compute the fixed metric set for a signal kind into a report
pub fn assess(values: &[f64], kind: SignalKind, ctx: &SamplingContext) -> SqaResult<QualityReport> {
    let mut report = QualityReport::new();
    for &metric in MetricId::for_kind(kind) {
        let value = score(values, metric, ctx)?;
        tracing::debug!(metric = %metric, score = value, "computed quality metric");
        report.insert(metric, value);
    }
    Ok(report)
}

/// Convenience wrapper assessing a signal's value channel
pub fn assess_signal(
    signal: &Signal,
    kind: SignalKind,
    ctx: &SamplingContext,
) -> SqaResult<QualityReport> {
    assess(signal.values(), kind, ctx)
}
