//! Integration tests for the flowspec-cli commands.
//!
//! These tests exercise the same code paths as the binary against a
//! temporary workspace holding a definition file and its audit logs.

use std::path::Path;

use flowspec_cli::commands::workflow::{execute, DryRunDelegate, ProcessDelegate};
use flowspec_cli::commands::{build_context, Workspace};
use flowspec_core::audit::{AuditReader, Decision, EventKind};
use flowspec_core::workflow::{ExecutionContext, SkipKind, DEFAULT_WORKFLOW_FILE};

const DEFINITION: &str = r#"
version: "2.0"
roles:
  primary: dev
  definitions:
    dev:
      display_name: Developer
      commands: [specify, implement]
states: ["To Do", "Specified", "Researched", "Implemented", "Validated"]
workflows:
  specify:
    command: "/flow:specify"
    input_states: ["To Do"]
    output_state: "Specified"
  research:
    command: "/flow:research"
    input_states: ["Specified"]
    output_state: "Researched"
  implement:
    command: "/flow:implement"
    output_state: "Implemented"
  validate:
    command: "/flow:validate"
    output_state: "Validated"
custom_workflows:
  quick_build:
    description: "Lightweight path for small changes"
    mode: vibing
    steps:
      - workflow: specify
      - workflow: implement
      - workflow: validate
  full_design:
    description: "Research only when the change is complex"
    mode: spec-ing
    steps:
      - workflow: specify
      - workflow: research
        condition: "complexity >= 7"
"#;

fn workspace(dir: &Path, session: &str) -> Workspace {
    std::fs::write(dir.join(DEFAULT_WORKFLOW_FILE), DEFINITION).unwrap();
    Workspace::new(dir, DEFAULT_WORKFLOW_FILE, ".logs", Some(session.to_string()))
}

#[test]
fn test_quick_build_runs_every_step() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(dir.path(), "quick");
    let orch = ws.orchestrator().unwrap();

    let result = orch.execute_custom_workflow("quick_build", &ExecutionContext::new());
    assert!(result.success);
    assert_eq!(result.steps_executed, 3);
    assert_eq!(result.steps_skipped, 0);
    let commands: Vec<_> = result
        .step_results
        .iter()
        .map(|s| s.command.as_deref().unwrap())
        .collect();
    assert_eq!(commands, vec!["/flow:specify", "/flow:implement", "/flow:validate"]);
}

#[test]
fn test_full_design_gated_by_complexity() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(dir.path(), "gated");
    let orch = ws.orchestrator().unwrap();

    let low = build_context(&["complexity=5".to_string()], None).unwrap();
    let result = orch.execute_custom_workflow("full_design", &low);
    assert!(result.success);
    assert_eq!((result.steps_executed, result.steps_skipped), (1, 1));
    let research = &result.step_results[1];
    assert!(research.skipped);
    assert_eq!(research.skip_kind, Some(SkipKind::ConditionNotMet));
    assert!(!research.skip_reason.as_deref().unwrap_or_default().is_empty());

    let high = build_context(&[], Some(r#"{"complexity": 8}"#)).unwrap();
    let result = orch.execute_custom_workflow("full_design", &high);
    assert_eq!((result.steps_executed, result.steps_skipped), (2, 0));
}

#[test]
fn test_unknown_workflow_lists_available() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(dir.path(), "unknown");
    let orch = ws.orchestrator().unwrap();

    let result = orch.execute_custom_workflow("does_not_exist", &ExecutionContext::new());
    assert!(!result.success);
    assert_eq!(result.steps_executed, 0);
    assert_eq!(result.steps_skipped, 0);
    assert!(result.step_results.is_empty());
    let error = result.error.unwrap();
    assert!(error.contains("full_design"));
    assert!(error.contains("quick_build"));

    let reader = ws.reader();
    assert!(reader.decisions("unknown").unwrap().is_empty());
    assert_eq!(reader.events("unknown").unwrap()[0].kind, EventKind::WorkflowFailed);
}

#[test]
fn test_listing_is_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let orch = workspace(dir.path(), "list").orchestrator().unwrap();
    assert_eq!(orch.list_custom_workflows(), vec!["full_design", "quick_build"]);
}

#[test]
fn test_decision_log_matches_results() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(dir.path(), "consistency");
    let orch = ws.orchestrator().unwrap();

    let ctx = ExecutionContext::new().with("complexity", 5);
    let full = orch.execute_custom_workflow("full_design", &ctx);
    let quick = orch.execute_custom_workflow("quick_build", &ctx);

    let decisions = ws.reader().decisions("consistency").unwrap();
    assert_eq!(decisions.len(), full.step_results.len() + quick.step_results.len());

    let all_steps = full.step_results.iter().chain(quick.step_results.iter());
    for (decision, step) in decisions.iter().zip(all_steps) {
        assert_eq!(decision.session_id, "consistency");
        assert_eq!(decision.workflow_name, step.workflow_name);
        assert_eq!(decision.decision == Decision::Skipped, step.skipped);
    }
    assert!(decisions.windows(2).all(|w| w[0].seq < w[1].seq));
}

#[test]
fn test_planning_twice_gives_same_result() {
    let dir = tempfile::tempdir().unwrap();
    let orch = workspace(dir.path(), "det").orchestrator().unwrap();
    let ctx = ExecutionContext::new().with("complexity", 7);
    assert_eq!(
        orch.execute_custom_workflow("full_design", &ctx),
        orch.execute_custom_workflow("full_design", &ctx)
    );
}

#[tokio::test]
async fn test_dry_run_emits_task_updates() {
    let dir = tempfile::tempdir().unwrap();
    let orch = workspace(dir.path(), "dry").orchestrator().unwrap();
    let mut delegate = DryRunDelegate::default();

    let ctx = ExecutionContext::new().with("complexity", 8);
    let report = execute(&orch, "full_design", &ctx, &mut delegate, Some("task-42")).await;

    assert!(report.summary.is_success());
    assert_eq!(delegate.invoked, vec!["flow:specify", "flow:research"]);

    let notes: Vec<_> = report.task_updates.iter().map(|u| u.notes.as_str()).collect();
    assert_eq!(
        notes,
        vec![
            "Executing workflow: full_design",
            "Completed: specify",
            "Completed: research",
            "Workflow full_design completed successfully",
        ]
    );
    assert_eq!(report.task_updates[0].status.as_deref(), Some("In Progress"));
    assert_eq!(report.task_updates[3].status.as_deref(), Some("Done"));
    assert!(report.task_updates.iter().all(|u| u.task_id == "task-42"));
}

#[tokio::test]
async fn test_unknown_workflow_run_sends_no_updates() {
    let dir = tempfile::tempdir().unwrap();
    let orch = workspace(dir.path(), "none").orchestrator().unwrap();
    let mut delegate = DryRunDelegate::default();

    let report = execute(&orch, "missing", &ExecutionContext::new(), &mut delegate, Some("t")).await;
    assert!(!report.plan.success);
    assert!(report.task_updates.is_empty());
    assert!(delegate.invoked.is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_process_runner_stops_on_failure() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(dir.path(), "proc");
    let orch = ws.orchestrator().unwrap();

    let mut ok = ProcessDelegate::new("true", dir.path());
    let report = execute(&orch, "quick_build", &ExecutionContext::new(), &mut ok, None).await;
    assert!(report.summary.is_success());
    assert_eq!(report.summary.succeeded, 3);

    let mut failing = ProcessDelegate::new("false", dir.path());
    let report = execute(&orch, "quick_build", &ExecutionContext::new(), &mut failing, Some("t")).await;
    assert_eq!(report.summary.failed_step, Some(0));
    assert_eq!(report.summary.invoked, 1);
    assert!(report.task_updates.iter().all(|u| u.status.as_deref() != Some("Done")));

    let events = ws.reader().events("proc").unwrap();
    assert_eq!(events.last().map(|e| e.kind), Some(EventKind::StepFailed));
}

#[tokio::test]
async fn test_validate_rejects_broken_definition() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(dir.path(), "lint");
    assert!(flowspec_cli::commands::workflow::validate(&ws).await.is_ok());

    std::fs::write(
        dir.path().join(DEFAULT_WORKFLOW_FILE),
        "custom_workflows:\n  bad:\n    steps:\n      - workflow: nowhere\n",
    )
    .unwrap();
    let err = flowspec_cli::commands::workflow::validate(&ws).await.unwrap_err();
    assert!(err.contains("1 error(s)"));
}

#[test]
fn test_sessions_are_listed_from_log_dir() {
    let dir = tempfile::tempdir().unwrap();
    for session in ["20250101-090000", "20250102-090000"] {
        let orch = workspace(dir.path(), session).orchestrator().unwrap();
        orch.execute_custom_workflow("quick_build", &ExecutionContext::new());
    }
    let reader = AuditReader::for_workspace(dir.path());
    assert_eq!(reader.sessions().unwrap(), vec!["20250102-090000", "20250101-090000"]);
}

#[test]
fn test_triage_evaluate_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("ground_truth.json");
    let predictions = dir.path().join("predictions.jsonl");

    std::fs::write(
        &dataset,
        serde_json::json!({
            "metadata": {"version": "1.0"},
            "findings": [
                {"id": "F1", "cwe_id": "CWE-89", "code_snippet": "q + x", "ground_truth": {"classification": "TP"}},
                {"id": "F2", "cwe_id": "CWE-79", "code_snippet": "html(x)", "ground_truth": {"classification": "FP"}},
                {"id": "F3", "code_snippet": "eval(x)", "ground_truth": {"classification": "TP"}}
            ]
        })
        .to_string(),
    )
    .unwrap();
    std::fs::write(
        &predictions,
        concat!(
            "{\"finding_id\": \"F1\", \"classification\": \"TP\", \"confidence\": 0.9, \"reasoning\": \"tainted\"}\n",
            "{\"finding_id\": \"F2\", \"classification\": \"TP\", \"confidence\": 0.6, \"reasoning\": \"unsure\"}\n",
        ),
    )
    .unwrap();

    let result = flowspec_cli::commands::triage::evaluate(&dataset, &predictions).unwrap();
    assert_eq!(result.total, 3);
    assert_eq!(result.correct, 1);
    assert_eq!(result.failures.len(), 2);
    assert!(result.per_cwe.contains_key("unknown"));
    assert!(!result.meets_target(0.85));
}
