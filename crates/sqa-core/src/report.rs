//! Quality-report data model
//!
//! Metric identifiers are fixed per signal kind and carry their literature
//! citation so reports are self-describing for downstream consumers.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SqaError;

/// Physiological signal classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// Electrodermal activity (skin conductance, μS)
    Eda,
    /// Photoplethysmography / blood volume pulse
    Ppg,
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalKind::Eda => write!(f, "EDA"),
            SignalKind::Ppg => write!(f, "PPG"),
        }
    }
}

impl FromStr for SignalKind {
    type Err = SqaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EDA" | "GSR" => Ok(SignalKind::Eda),
            "PPG" | "BVP" => Ok(SignalKind::Ppg),
            other => Err(SqaError::UnsupportedMethod {
                method: other.to_string(),
            }),
        }
    }
}

/// Literature-defined quality metric identifiers
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MetricId {
    /// EDA amplitude/stability score (Böttcher et al. 2022)
    BottcherRac,
    /// EDA automated artifact detection, 2-second variant (Kleckner et al. 2017)
    KlecknerAutomated,
    /// PPG windowed skewness index (Elgendi 2016)
    ElgendiSkewness,
    /// PPG peak-height-variance quality index
    PhvVariance,
}

impl MetricId {
    /// Stable string identifier used in reports and by transports
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricId::BottcherRac => "bottcher_rac",
            MetricId::KlecknerAutomated => "kleckner_automated",
            MetricId::ElgendiSkewness => "elgendi_skewness",
            MetricId::PhvVariance => "phv_variance",
        }
    }

    /// Signal kind this metric is defined for
    pub fn signal_kind(&self) -> SignalKind {
        match self {
            MetricId::BottcherRac | MetricId::KlecknerAutomated => SignalKind::Eda,
            MetricId::ElgendiSkewness | MetricId::PhvVariance => SignalKind::Ppg,
        }
    }

    /// Literature citation for the metric
    pub fn citation(&self) -> &'static str {
        match self {
            MetricId::BottcherRac => {
                "Böttcher, S., Vieluf, S., Bruno, E., Joseph, B., Epitashvili, N., \
                 Biondi, A., et al. (2022). Data quality evaluation in wearable \
                 monitoring. Scientific Reports, 12(1), 21412."
            }
            MetricId::KlecknerAutomated => {
                "Kleckner, I. R., et al. (2017). Simple, transparent, and flexible \
                 automated quality assessment procedures for ambulatory \
                 electrodermal activity data. IEEE Transactions on Biomedical \
                 Engineering, 65(7), 1460-1467."
            }
            MetricId::ElgendiSkewness => {
                "Elgendi, M. (2016). Optimal signal quality index for \
                 photoplethysmogram signals. Bioengineering, 3(4), 21."
            }
            MetricId::PhvVariance => {
                "Maki, Y., et al. (2020). Peak-height variance quality index for \
                 photoplethysmographic signals."
            }
        }
    }

    /// Human-readable description of what the metric measures
    pub fn description(&self) -> &'static str {
        match self {
            MetricId::BottcherRac => {
                "Evaluates EDA signal quality using amplitude thresholding and RAC \
                 (range of absolute change) stability over 2-second windows."
            }
            MetricId::KlecknerAutomated => {
                "Assesses EDA signal quality using automated range and slope \
                 heuristics over short 2-second windows, spreading each invalid \
                 datum over a 5-second radius."
            }
            MetricId::ElgendiSkewness => {
                "Skewness is a measure of the symmetry (or the lack of it) of a \
                 probability distribution; averaged over sliding 2-second windows."
            }
            MetricId::PhvVariance => {
                "Quantifies the consistency of peak amplitudes in a BVP/PPG \
                 signal, with lower PHV values indicating higher signal \
                 reliability."
            }
        }
    }

    /// The fixed set of metrics for a signal kind, in report order
    pub fn for_kind(kind: SignalKind) -> &'static [MetricId] {
        match kind {
            SignalKind::Eda => &[MetricId::BottcherRac, MetricId::KlecknerAutomated],
            SignalKind::Ppg => &[MetricId::ElgendiSkewness, MetricId::PhvVariance],
        }
    }
}

impl std::fmt::Display for MetricId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricId {
    type Err = SqaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bottcher_rac" => Ok(MetricId::BottcherRac),
            "kleckner_automated" => Ok(MetricId::KlecknerAutomated),
            "elgendi_skewness" => Ok(MetricId::ElgendiSkewness),
            "phv_variance" => Ok(MetricId::PhvVariance),
            other => Err(SqaError::UnsupportedMethod {
                method: other.to_string(),
            }),
        }
    }
}

/// Score entry for a single metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    /// Scalar quality score
    pub score: f64,
    /// Literature citation for the metric definition
    pub citation: String,
    /// Human-readable description of the metric
    pub description: String,
}

/// Mapping from metric identifier to score, citation and description
///
/// Backed by an ordered map so report and JSON ordering are stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QualityReport {
    #[serde(flatten)]
    scores: BTreeMap<MetricId, MetricScore>,
}

impl QualityReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a score for a metric, filling citation and description
    pub fn insert(&mut self, metric: MetricId, score: f64) {
        self.scores.insert(
            metric,
            MetricScore {
                score,
                citation: metric.citation().to_string(),
                description: metric.description().to_string(),
            },
        );
    }

    /// Look up a metric's score entry
    pub fn get(&self, metric: MetricId) -> Option<&MetricScore> {
        self.scores.get(&metric)
    }

    /// Number of metric entries
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Check if the report contains no entries
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Iterate entries in stable identifier order
    pub fn iter(&self) -> impl Iterator<Item = (MetricId, &MetricScore)> {
        self.scores.iter().map(|(id, score)| (*id, score))
    }
}
