//! `flowspec triage`: score classifier predictions against ground truth.

use std::path::Path;

use console::style;

use flowspec_core::triage::{run_benchmark, BenchmarkResult, Dataset, PredictionSet};

/// Score `predictions` against `dataset`; fails when accuracy misses `target`.
pub async fn score(dataset: &Path, predictions: &Path, target: f64, json: bool) -> Result<(), String> {
    let result = evaluate(dataset, predictions)?;

    if json {
        let mut value = serde_json::to_value(&result).map_err(|e| e.to_string())?;
        value["target"] = serde_json::json!(target);
        value["meets_target"] = serde_json::json!(result.meets_target(target));
        let out = serde_json::to_string_pretty(&value).map_err(|e| e.to_string())?;
        println!("{}", out);
    } else {
        print_summary(&result, target);
    }

    if result.meets_target(target) {
        Ok(())
    } else {
        Err(format!(
            "Accuracy {:.2}% is below target {:.2}%",
            result.accuracy * 100.0,
            target * 100.0
        ))
    }
}

/// Load both inputs and run the benchmark.
pub fn evaluate(dataset: &Path, predictions: &Path) -> Result<BenchmarkResult, String> {
    let dataset = Dataset::from_file(dataset).map_err(|e| e.to_string())?;
    let predictions = PredictionSet::from_file(predictions).map_err(|e| e.to_string())?;
    tracing::info!(
        "[Triage] Scoring {} findings against {} predictions",
        dataset.findings.len(),
        predictions.len()
    );
    Ok(run_benchmark(&dataset, &predictions))
}

fn print_summary(result: &BenchmarkResult, target: f64) {
    let status = if result.meets_target(target) {
        style("PASS").green()
    } else {
        style("FAIL").red()
    };
    println!(
        "Accuracy: {:.2}% ({}/{}) target {:.0}% {}",
        result.accuracy * 100.0,
        result.correct,
        result.total,
        target * 100.0,
        status
    );
    println!(
        "TP  precision {:.2}  recall {:.2}  f1 {:.2}",
        result.tp_metrics.precision(),
        result.tp_metrics.recall(),
        result.tp_metrics.f1()
    );
    println!(
        "FP  precision {:.2}  recall {:.2}  f1 {:.2}",
        result.fp_metrics.precision(),
        result.fp_metrics.recall(),
        result.fp_metrics.f1()
    );

    println!("\nPer CWE:");
    for (cwe, matrix) in &result.per_cwe {
        println!(
            "  {:<10} {:>6.2}% ({}/{})",
            cwe,
            matrix.accuracy() * 100.0,
            matrix.correct(),
            matrix.total()
        );
    }

    let breakdown = result.failure_breakdown();
    if !breakdown.is_empty() {
        println!("\nFailures ({}):", result.failures.len());
        for ((actual, predicted), count) in breakdown {
            println!("  {} → {}: {}", actual, predicted, count);
        }
    }
}
