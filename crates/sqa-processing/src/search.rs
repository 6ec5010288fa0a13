//! Pipeline grid search
//!
//! Composes outlier-correction × filter combinations, scores each candidate
//! with a quality metric and returns every candidate in stable grid order.
//! No winner is selected here; ranking is a caller decision.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use serde::Serialize;
use sqa_core::{MetricId, SamplingContext, Signal, SqaError, SqaResult};

use crate::filters::{FilterEngine, FilterSpec, DEFAULT_GAUSSIAN_SIGMA, DEFAULT_ORDER};
use crate::metrics;
use crate::outliers::{self, OutlierPolicy};

/// One scored preprocessing pipeline produced by the search
#[derive(Debug, Clone, Serialize)]
pub struct PipelineCandidate {
    /// Human-readable combination label, unique within one search
    pub title: String,
    /// Fully corrected and filtered signal
    pub signal: Signal,
    /// Quality score of the processed signal
    pub score: f64,
}

/// Default outlier-policy axis of the search grid
pub fn default_policies() -> Vec<OutlierPolicy> {
    vec![OutlierPolicy::Iqr, OutlierPolicy::Hampel]
}

/// Default filter axis of the search grid
///
/// A Butterworth low-pass at a quarter of the sampling rate (1 Hz at the
/// typical 4 Hz EDA rate) and a heavy Gaussian smooth.
pub fn default_filter_specs(ctx: &SamplingContext) -> Vec<FilterSpec> {
    vec![
        FilterSpec::lowpass(ctx.sampling_rate_hz / 4.0, DEFAULT_ORDER),
        FilterSpec::gaussian(DEFAULT_GAUSSIAN_SIGMA),
    ]
}

/// Run every combination sequentially, in grid order
pub fn search(
    signal: &Signal,
    ctx: &SamplingContext,
    policies: &[OutlierPolicy],
    specs: &[FilterSpec],
    metric: MetricId,
    engine: &FilterEngine,
) -> SqaResult<Vec<PipelineCandidate>> {
    let grid = build_grid(policies, specs)?;

    let mut candidates = Vec::with_capacity(grid.len());
    for (index, (policy, spec)) in grid.iter().enumerate() {
        let (processed, score) = run_branch(signal, ctx, *policy, spec, metric, engine)?;
        tracing::debug!(
            pipeline = index + 1,
            policy = %policy,
            method = %spec.method,
            score,
            "scored pipeline candidate"
        );
        candidates.push(PipelineCandidate {
            title: branch_title(index, *policy, spec),
            signal: processed,
            score,
        });
    }
    Ok(candidates)
}

/// Run the grid on a scoped worker pool, optionally bounded by a timeout
///
/// Branches are atomic: each either produces a complete candidate or does
/// not run at all. Once the deadline passes, workers stop claiming new
/// branches; finished candidates are returned in grid order and skipped
/// branches are omitted. Branch errors propagate in grid order, exactly as
/// in the sequential search.
pub fn search_parallel(
    signal: &Signal,
    ctx: &SamplingContext,
    policies: &[OutlierPolicy],
    specs: &[FilterSpec],
    metric: MetricId,
    engine: &FilterEngine,
    timeout: Option<Duration>,
) -> SqaResult<Vec<PipelineCandidate>> {
    let grid = build_grid(policies, specs)?;
    let deadline = timeout.map(|t| Instant::now() + t);

    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(grid.len())
        .max(1);

    let next_branch = AtomicUsize::new(0);
    let (sender, receiver) = mpsc::channel::<(usize, SqaResult<(Signal, f64)>)>();

    std::thread::scope(|scope| {
        for _ in 0..workers {
            let sender = sender.clone();
            let grid = &grid;
            let next_branch = &next_branch;
            scope.spawn(move || loop {
                if let Some(deadline) = deadline {
                    if Instant::now() >= deadline {
                        break;
                    }
                }
                let index = next_branch.fetch_add(1, Ordering::Relaxed);
                if index >= grid.len() {
                    break;
                }
                let (policy, spec) = &grid[index];
                let outcome = run_branch(signal, ctx, *policy, spec, metric, engine);
                if sender.send((index, outcome)).is_err() {
                    break;
                }
            });
        }
    });
    drop(sender);

    let mut slots: Vec<Option<SqaResult<(Signal, f64)>>> = (0..grid.len()).map(|_| None).collect();
    for (index, outcome) in receiver {
        slots[index] = Some(outcome);
    }

    let mut candidates = Vec::new();
    for (index, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(Ok((processed, score))) => {
                let (policy, spec) = &grid[index];
                candidates.push(PipelineCandidate {
                    title: branch_title(index, *policy, spec),
                    signal: processed,
                    score,
                });
            }
            Some(Err(error)) => return Err(error),
            None => {
                tracing::debug!(pipeline = index + 1, "branch skipped by deadline");
            }
        }
    }
    Ok(candidates)
}

fn build_grid<'s>(
    policies: &[OutlierPolicy],
    specs: &'s [FilterSpec],
) -> SqaResult<Vec<(OutlierPolicy, &'s FilterSpec)>> {
    if policies.is_empty() || specs.is_empty() {
        return Err(SqaError::InvalidParameters {
            reason: "search grid requires at least one outlier policy and one filter spec"
                .to_string(),
        });
    }
    let mut grid = Vec::with_capacity(policies.len() * specs.len());
    for &policy in policies {
        for spec in specs {
            grid.push((policy, spec));
        }
    }
    Ok(grid)
}

fn branch_title(index: usize, policy: OutlierPolicy, spec: &FilterSpec) -> String {
    format!("Pipeline {}: {} + {}", index + 1, policy, spec.method)
}

fn run_branch(
    signal: &Signal,
    ctx: &SamplingContext,
    policy: OutlierPolicy,
    spec: &FilterSpec,
    metric: MetricId,
    engine: &FilterEngine,
) -> SqaResult<(Signal, f64)> {
    let corrected = outliers::correct_signal(signal, policy)?;
    let filtered = engine.filter_signal(&corrected, spec, ctx.sampling_rate_hz)?;
    let score = metrics::score(filtered.values(), metric, ctx)?;
    Ok((filtered, score))
}
