//! SQA-Processing: preprocessing and quality scoring for physiological
//! signals
//!
//! Resampling, outlier correction, filtering, literature-defined quality
//! metrics and the pipeline grid search that combines and ranks them.

pub mod config;
pub mod filters;
pub mod metrics;
pub mod outliers;
pub mod resample;
pub mod search;
pub mod spectrum;
pub mod stats;

pub use config::{EngineConfig, CUSTOM_TRANSFORMS_ENV};
pub use filters::{
    CustomTransform, FilterEngine, FilterSpec, DEFAULT_GAUSSIAN_SIGMA, DEFAULT_ORDER,
};
pub use outliers::OutlierPolicy;
pub use resample::{resample, ResampleTechnique};
pub use search::{
    default_filter_specs, default_policies, search, search_parallel, PipelineCandidate,
};
pub use spectrum::{power_spectrum, Spectrum};
