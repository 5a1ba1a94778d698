//! Triage benchmark: scores a finding classifier against labelled data.
//!
//! A dataset holds security findings with a ground-truth label each. A
//! `Classifier` predicts a label per finding; the benchmark folds the
//! predictions into confusion matrices (overall and per CWE), binary
//! precision/recall for the TP and FP classes, and a failure list.

mod dataset;
mod metrics;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use dataset::{Classifier, Dataset, Finding, GroundTruth, Prediction, PredictionSet};
pub use metrics::{run_benchmark, BenchmarkResult, BinaryMetrics, ConfusionMatrix, Failure, DEFAULT_ACCURACY_TARGET};

/// Three-way triage label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Classification {
    /// Real issue
    #[serde(rename = "TP", alias = "tp")]
    TruePositive,
    /// Not an issue
    #[serde(rename = "FP", alias = "fp")]
    FalsePositive,
    /// Needs investigation
    #[serde(rename = "NI", alias = "ni")]
    NeedsInvestigation,
}

impl Classification {
    pub const ALL: [Classification; 3] = [
        Classification::TruePositive,
        Classification::FalsePositive,
        Classification::NeedsInvestigation,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Classification::TruePositive => "TP",
            Classification::FalsePositive => "FP",
            Classification::NeedsInvestigation => "NI",
        }
    }

    fn index(&self) -> usize {
        match self {
            Classification::TruePositive => 0,
            Classification::FalsePositive => 1,
            Classification::NeedsInvestigation => 2,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error type for loading triage inputs.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}
