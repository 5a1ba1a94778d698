//! Benchmark inputs: the labelled dataset and classifier predictions.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Classification, TriageError};

/// Labelled findings plus free-form metadata (`version`, `created`, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    #[serde(default)]
    pub scanner: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line_start: u32,
    #[serde(default)]
    pub line_end: u32,
    #[serde(default)]
    pub code_snippet: String,
    #[serde(default)]
    pub cwe_id: Option<String>,
    pub ground_truth: GroundTruth,
}

impl Finding {
    /// CWE bucket for per-CWE metrics.
    pub fn cwe(&self) -> &str {
        self.cwe_id.as_deref().unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundTruth {
    pub classification: Classification,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Dataset {
    pub fn from_json(json: &str) -> Result<Self, TriageError> {
        serde_json::from_str(json).map_err(|e| TriageError::Parse(format!("Invalid dataset: {}", e)))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TriageError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| TriageError::Io(format!("Failed to read '{}': {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    /// Dataset version from metadata, if present.
    pub fn version(&self) -> Option<&str> {
        self.metadata.get("version").and_then(|v| v.as_str())
    }
}

/// One classifier verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub finding_id: String,
    pub classification: Classification,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
}

/// Produces a verdict for a finding.
pub trait Classifier {
    fn classify(&self, finding: &Finding) -> Prediction;
}

/// Precomputed predictions, keyed by finding id.
#[derive(Debug, Clone, Default)]
pub struct PredictionSet {
    predictions: HashMap<String, Prediction>,
}

impl PredictionSet {
    /// Parse JSONL predictions. Blank lines are ignored; a later line for
    /// the same finding replaces an earlier one.
    pub fn from_jsonl(content: &str) -> Result<Self, TriageError> {
        let mut predictions = HashMap::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let prediction: Prediction = serde_json::from_str(line).map_err(|e| {
                TriageError::Parse(format!("Invalid prediction on line {}: {}", line_no + 1, e))
            })?;
            predictions.insert(prediction.finding_id.clone(), prediction);
        }
        Ok(Self { predictions })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TriageError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| TriageError::Io(format!("Failed to read '{}': {}", path.display(), e)))?;
        Self::from_jsonl(&content)
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}

impl Classifier for PredictionSet {
    fn classify(&self, finding: &Finding) -> Prediction {
        match self.predictions.get(&finding.id) {
            Some(prediction) => prediction.clone(),
            None => {
                tracing::warn!("[Triage] No prediction for finding {}, treating as NI", finding.id);
                Prediction {
                    finding_id: finding.id.clone(),
                    classification: Classification::NeedsInvestigation,
                    confidence: 0.0,
                    reasoning: "no prediction".to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATASET: &str = r#"{
  "metadata": {"version": "1.0", "created": "2025-12-01"},
  "findings": [
    {
      "id": "SQL-001",
      "scanner": "semgrep",
      "severity": "high",
      "title": "SQL injection",
      "description": "string concatenation in query",
      "file": "app/db.py",
      "line_start": 10,
      "line_end": 12,
      "code_snippet": "cursor.execute('SELECT ' + q)",
      "cwe_id": "CWE-89",
      "ground_truth": {"classification": "TP", "notes": "user input"}
    },
    {
      "id": "MISC-001",
      "scanner": "bandit",
      "severity": "low",
      "title": "assert used",
      "description": "",
      "file": "tests/t.py",
      "line_start": 3,
      "line_end": 3,
      "code_snippet": "assert x",
      "ground_truth": {"classification": "FP"}
    }
  ]
}"#;

    #[test]
    fn test_parse_dataset() {
        let dataset = Dataset::from_json(DATASET).unwrap();
        assert_eq!(dataset.version(), Some("1.0"));
        assert_eq!(dataset.findings.len(), 2);
        assert_eq!(dataset.findings[0].cwe(), "CWE-89");
        assert_eq!(dataset.findings[1].cwe(), "unknown");
        assert_eq!(dataset.findings[0].ground_truth.classification, Classification::TruePositive);
        assert_eq!(dataset.findings[0].ground_truth.extra["notes"], "user input");
    }

    #[test]
    fn test_rejects_unknown_label() {
        let bad = DATASET.replace(r#""classification": "FP""#, r#""classification": "MAYBE""#);
        assert!(matches!(Dataset::from_json(&bad), Err(TriageError::Parse(_))));
    }

    #[test]
    fn test_prediction_set_defaults_missing_to_ni() {
        let predictions = PredictionSet::from_jsonl(
            "{\"finding_id\": \"SQL-001\", \"classification\": \"TP\", \"confidence\": 0.9, \"reasoning\": \"tainted\"}\n\n",
        )
        .unwrap();
        assert_eq!(predictions.len(), 1);

        let dataset = Dataset::from_json(DATASET).unwrap();
        let hit = predictions.classify(&dataset.findings[0]);
        assert_eq!(hit.classification, Classification::TruePositive);
        assert_eq!(hit.confidence, 0.9);

        let miss = predictions.classify(&dataset.findings[1]);
        assert_eq!(miss.classification, Classification::NeedsInvestigation);
        assert_eq!(miss.confidence, 0.0);
    }

    #[test]
    fn test_malformed_prediction_reports_line() {
        let err = PredictionSet::from_jsonl("{\"finding_id\": \"a\", \"classification\": \"TP\"}\nnot json\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
