//! SQA-Core: Foundation types for physiological signal quality assessment
//!
//! Signal container, sampling context, error system and the quality-report
//! data model shared by the processing and simulation crates.

pub mod error;
pub mod report;
pub mod signal;

pub use error::{ErrorDescriptor, SqaError, SqaResult};
pub use report::{MetricId, MetricScore, QualityReport, SignalKind};
pub use signal::{SamplingContext, Signal, SignalStats};
