//! Benchmark scoring.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use super::dataset::{Classifier, Dataset};
use super::Classification;

/// Accuracy a classifier must reach to pass.
pub const DEFAULT_ACCURACY_TARGET: f64 = 0.85;

/// 3×3 counts indexed by (actual, predicted).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    counts: [[usize; 3]; 3],
}

impl ConfusionMatrix {
    pub fn record(&mut self, actual: Classification, predicted: Classification) {
        self.counts[actual.index()][predicted.index()] += 1;
    }

    pub fn count(&self, actual: Classification, predicted: Classification) -> usize {
        self.counts[actual.index()][predicted.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..3).map(|i| self.counts[i][i]).sum()
    }

    /// `correct / total`, 0.0 when empty.
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct(), self.total())
    }
}

impl Serialize for ConfusionMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(3))?;
        for actual in Classification::ALL {
            let row: BTreeMap<&str, usize> = Classification::ALL
                .iter()
                .map(|predicted| (predicted.code(), self.count(actual, *predicted)))
                .collect();
            map.serialize_entry(actual.code(), &row)?;
        }
        map.end()
    }
}

/// One-vs-rest counts for a single label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BinaryMetrics {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_negatives: usize,
}

impl BinaryMetrics {
    fn record(&mut self, is_actual: bool, is_predicted: bool) {
        match (is_actual, is_predicted) {
            (true, true) => self.true_positives += 1,
            (true, false) => self.false_negatives += 1,
            (false, true) => self.false_positives += 1,
            (false, false) => self.true_negatives += 1,
        }
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r > 0.0 {
            2.0 * p * r / (p + r)
        } else {
            0.0
        }
    }
}

/// A misclassified finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    pub finding_id: String,
    pub cwe_id: String,
    pub ground_truth: Classification,
    pub predicted: Classification,
    pub confidence: f64,
    pub reasoning: String,
    pub code_snippet: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BenchmarkResult {
    pub total: usize,
    pub correct: usize,
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
    pub per_cwe: BTreeMap<String, ConfusionMatrix>,
    pub tp_metrics: BinaryMetrics,
    pub fp_metrics: BinaryMetrics,
    pub failures: Vec<Failure>,
}

impl BenchmarkResult {
    pub fn per_cwe_accuracy(&self) -> BTreeMap<&str, f64> {
        self.per_cwe
            .iter()
            .map(|(cwe, matrix)| (cwe.as_str(), matrix.accuracy()))
            .collect()
    }

    /// Failure counts by (actual, predicted), most frequent first.
    pub fn failure_breakdown(&self) -> Vec<((Classification, Classification), usize)> {
        let mut counts: BTreeMap<(Classification, Classification), usize> = BTreeMap::new();
        for failure in &self.failures {
            *counts.entry((failure.ground_truth, failure.predicted)).or_default() += 1;
        }
        let mut breakdown: Vec<_> = counts.into_iter().collect();
        breakdown.sort_by(|a, b| b.1.cmp(&a.1));
        breakdown
    }

    pub fn meets_target(&self, target: f64) -> bool {
        self.accuracy >= target
    }
}

/// Classify every finding in `dataset` and score the predictions.
pub fn run_benchmark<C: Classifier + ?Sized>(dataset: &Dataset, classifier: &C) -> BenchmarkResult {
    let mut result = BenchmarkResult::default();

    for (i, finding) in dataset.findings.iter().enumerate() {
        let actual = finding.ground_truth.classification;
        let prediction = classifier.classify(finding);
        let predicted = prediction.classification;

        result.confusion.record(actual, predicted);
        result
            .per_cwe
            .entry(finding.cwe().to_string())
            .or_default()
            .record(actual, predicted);
        result.tp_metrics.record(
            actual == Classification::TruePositive,
            predicted == Classification::TruePositive,
        );
        result.fp_metrics.record(
            actual == Classification::FalsePositive,
            predicted == Classification::FalsePositive,
        );

        if actual != predicted {
            result.failures.push(Failure {
                finding_id: finding.id.clone(),
                cwe_id: finding.cwe().to_string(),
                ground_truth: actual,
                predicted,
                confidence: prediction.confidence,
                reasoning: prediction.reasoning,
                code_snippet: finding.code_snippet.clone(),
            });
        }

        if (i + 1) % 10 == 0 {
            tracing::debug!("[Triage] Scored {}/{} findings", i + 1, dataset.findings.len());
        }
    }

    result.total = result.confusion.total();
    result.correct = result.confusion.correct();
    result.accuracy = result.confusion.accuracy();
    result
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triage::{Finding, GroundTruth, Prediction};

    use crate::triage::Classification::{FalsePositive as FP, NeedsInvestigation as NI, TruePositive as TP};

    fn finding(id: &str, cwe: Option<&str>, label: Classification) -> Finding {
        Finding {
            id: id.to_string(),
            scanner: "semgrep".to_string(),
            severity: "high".to_string(),
            title: String::new(),
            description: String::new(),
            file: "app.py".to_string(),
            line_start: 1,
            line_end: 1,
            code_snippet: format!("snippet {}", id),
            cwe_id: cwe.map(str::to_string),
            ground_truth: GroundTruth { classification: label, extra: Default::default() },
        }
    }

    /// Predicts a fixed label per finding id.
    struct Table(Vec<(&'static str, Classification)>);

    impl Classifier for Table {
        fn classify(&self, finding: &Finding) -> Prediction {
            let label = self
                .0
                .iter()
                .find(|(id, _)| *id == finding.id)
                .map(|(_, c)| *c)
                .unwrap_or(NI);
            Prediction {
                finding_id: finding.id.clone(),
                classification: label,
                confidence: 0.7,
                reasoning: "table".to_string(),
            }
        }
    }

    fn dataset() -> Dataset {
        Dataset {
            metadata: Default::default(),
            findings: vec![
                finding("a", Some("CWE-89"), TP),
                finding("b", Some("CWE-89"), FP),
                finding("c", Some("CWE-79"), TP),
                finding("d", None, NI),
            ],
        }
    }

    #[test]
    fn test_confusion_and_accuracy() {
        let classifier = Table(vec![("a", TP), ("b", TP), ("c", TP), ("d", NI)]);
        let result = run_benchmark(&dataset(), &classifier);

        assert_eq!(result.total, 4);
        assert_eq!(result.correct, 3);
        assert_eq!(result.accuracy, 0.75);
        assert_eq!(result.confusion.count(FP, TP), 1);
        assert!(!result.meets_target(DEFAULT_ACCURACY_TARGET));
        assert!(result.meets_target(0.75));

        let per_cwe = result.per_cwe_accuracy();
        assert_eq!(per_cwe["CWE-89"], 0.5);
        assert_eq!(per_cwe["CWE-79"], 1.0);
        assert_eq!(per_cwe["unknown"], 1.0);
    }

    #[test]
    fn test_binary_metrics() {
        let classifier = Table(vec![("a", TP), ("b", TP), ("c", FP), ("d", NI)]);
        let result = run_benchmark(&dataset(), &classifier);

        // TP class: a hit, b false alarm, c missed
        assert_eq!(result.tp_metrics.true_positives, 1);
        assert_eq!(result.tp_metrics.false_positives, 1);
        assert_eq!(result.tp_metrics.false_negatives, 1);
        assert_eq!(result.tp_metrics.true_negatives, 1);
        assert_eq!(result.tp_metrics.precision(), 0.5);
        assert_eq!(result.tp_metrics.recall(), 0.5);
        assert_eq!(result.tp_metrics.f1(), 0.5);

        // FP class: never predicted correctly
        assert_eq!(result.fp_metrics.precision(), 0.0);
        assert_eq!(result.fp_metrics.f1(), 0.0);
    }

    #[test]
    fn test_failures_and_breakdown() {
        let classifier = Table(vec![("a", FP), ("b", TP), ("c", FP), ("d", NI)]);
        let result = run_benchmark(&dataset(), &classifier);

        assert_eq!(result.failures.len(), 3);
        assert_eq!(result.failures[0].finding_id, "a");
        assert_eq!(result.failures[0].code_snippet, "snippet a");
        assert_eq!(result.failures[0].reasoning, "table");

        let breakdown = result.failure_breakdown();
        assert_eq!(breakdown[0], ((TP, FP), 2));
        assert_eq!(breakdown[1], ((FP, TP), 1));
    }

    #[test]
    fn test_empty_dataset_scores_zero() {
        let result = run_benchmark(&Dataset::default(), &Table(vec![]));
        assert_eq!(result.total, 0);
        assert_eq!(result.accuracy, 0.0);
        assert!(result.failures.is_empty());
    }

    #[test]
    fn test_confusion_matrix_serializes_by_label() {
        let mut matrix = ConfusionMatrix::default();
        matrix.record(TP, NI);
        let json = serde_json::to_value(matrix).unwrap();
        assert_eq!(json["TP"]["NI"], 1);
        assert_eq!(json["NI"]["NI"], 0);
    }
}
