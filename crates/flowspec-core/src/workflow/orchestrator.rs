//! Workflow Orchestrator: turns a custom workflow plus a context into an
//! auditable execution plan.
//!
//! The orchestrator:
//! 1. Compiles the named workflow (fatal errors short-circuit here)
//! 2. Evaluates each step's condition against the context, in order
//! 3. Records one decision per step and run-level events
//! 4. Returns an `ExecutionResult` the caller drives step by step
//!
//! It never calls the execution delegate itself.

use std::path::Path;

use serde::Serialize;

use crate::audit::{AuditLogger, Decision, DecisionRecord, EventKind, EventRecord};
use crate::error::WorkflowError;
use crate::workflow::compiler::{self, Step};
use crate::workflow::context::ExecutionContext;
use crate::workflow::delegate::skill_name;
use crate::workflow::schema::{WorkflowConfig, DEFAULT_WORKFLOW_FILE};

/// Reason recorded for steps that resolve to no command.
pub const MISSING_COMMAND_REASON: &str = "no command resolved for step";

/// Why a step was left out of execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    ConditionNotMet,
    MissingCommand,
}

/// Outcome of planning a single step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    pub workflow_name: String,
    pub command: Option<String>,
    pub skipped: bool,
    pub skip_reason: Option<String>,
    pub skip_kind: Option<SkipKind>,
}

impl StepResult {
    fn planned(step: &Step) -> Self {
        Self {
            workflow_name: step.workflow_name.clone(),
            command: step.command.clone(),
            skipped: false,
            skip_reason: None,
            skip_kind: None,
        }
    }

    fn skipped(step: &Step, kind: SkipKind, reason: String) -> Self {
        Self {
            workflow_name: step.workflow_name.clone(),
            command: step.command.clone(),
            skipped: true,
            skip_reason: Some(reason),
            skip_kind: Some(kind),
        }
    }

    /// Skill name for the delegate: the command without its leading `/`.
    pub fn skill_name(&self) -> Option<&str> {
        self.command.as_deref().map(skill_name)
    }
}

/// Result of planning a whole workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub workflow_name: String,
    pub success: bool,
    pub error: Option<String>,
    pub steps_executed: usize,
    pub steps_skipped: usize,
    pub step_results: Vec<StepResult>,
}

impl ExecutionResult {
    fn failed(workflow_name: &str, error: &WorkflowError) -> Self {
        Self {
            workflow_name: workflow_name.to_string(),
            success: false,
            error: Some(error.to_string()),
            steps_executed: 0,
            steps_skipped: 0,
            step_results: Vec::new(),
        }
    }

    /// Steps the caller should hand to the delegate, in compiled order,
    /// with their zero-based plan index.
    pub fn executable_steps(&self) -> impl Iterator<Item = (usize, &StepResult)> {
        self.step_results
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.skipped && r.command.is_some())
    }
}

/// Plans custom workflows from a definition graph and audits every decision.
pub struct WorkflowOrchestrator {
    config: WorkflowConfig,
    audit: AuditLogger,
}

impl WorkflowOrchestrator {
    pub fn new(config: WorkflowConfig, audit: AuditLogger) -> Self {
        Self { config, audit }
    }

    /// Load `<workspace_root>/flowspec_workflow.yml` and log under
    /// `<workspace_root>/.logs`.
    pub fn from_workspace(
        workspace_root: impl AsRef<Path>,
        session_id: impl Into<String>,
    ) -> Result<Self, WorkflowError> {
        let root = workspace_root.as_ref();
        let config = WorkflowConfig::from_file(root.join(DEFAULT_WORKFLOW_FILE))?;
        Ok(Self::new(config, AuditLogger::for_workspace(root, session_id)))
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    pub fn session_id(&self) -> &str {
        self.audit.session_id()
    }

    /// Names of every custom workflow, sorted.
    pub fn list_custom_workflows(&self) -> Vec<String> {
        self.config.custom_workflow_names()
    }

    /// Plan `workflow_name` against `context`.
    ///
    /// Compile failures return `success == false` with no step results and
    /// no decision records. Otherwise every compiled step yields exactly one
    /// `StepResult` and one decision record, in order.
    pub fn execute_custom_workflow(
        &self,
        workflow_name: &str,
        context: &ExecutionContext,
    ) -> ExecutionResult {
        let steps = match compiler::compile(&self.config, workflow_name) {
            Ok(steps) => steps,
            Err(e) => {
                tracing::warn!("[Orchestrator] Cannot plan '{}': {}", workflow_name, e);
                self.audit.record_event(
                    EventRecord::new(EventKind::WorkflowFailed)
                        .with("workflow", workflow_name)
                        .with("error", e.to_string()),
                );
                return ExecutionResult::failed(workflow_name, &e);
            }
        };

        tracing::info!(
            "[Orchestrator] Planning '{}' ({} steps, session {})",
            workflow_name,
            steps.len(),
            self.session_id()
        );
        self.audit.record_event(
            EventRecord::new(EventKind::WorkflowStarted)
                .with("workflow", workflow_name)
                .with("steps", steps.len())
                .with("context", serde_json::to_value(context).unwrap_or_default()),
        );

        let mut step_results = Vec::with_capacity(steps.len());
        let mut steps_executed = 0;
        let mut steps_skipped = 0;

        for (index, step) in steps.iter().enumerate() {
            let result = plan_step(step, context);

            if result.skipped {
                steps_skipped += 1;
                if result.skip_kind == Some(SkipKind::MissingCommand) {
                    tracing::warn!(
                        "[Orchestrator] {} step {} ({}): {}",
                        workflow_name,
                        index + 1,
                        step.workflow_name,
                        MISSING_COMMAND_REASON
                    );
                }
            } else {
                steps_executed += 1;
            }

            tracing::debug!(
                "[Orchestrator] {} step {} ({}): {}",
                workflow_name,
                index + 1,
                step.workflow_name,
                result.skip_reason.as_deref().unwrap_or("planned")
            );

            self.audit.record_decision(DecisionRecord::new(
                workflow_name,
                index,
                result.workflow_name.clone(),
                result.command.clone(),
                if result.skipped { Decision::Skipped } else { Decision::Executed },
                result.skip_reason.clone(),
            ));

            step_results.push(result);
        }

        self.audit.record_event(
            EventRecord::new(EventKind::WorkflowCompleted)
                .with("workflow", workflow_name)
                .with("steps_executed", steps_executed)
                .with("steps_skipped", steps_skipped),
        );

        ExecutionResult {
            workflow_name: workflow_name.to_string(),
            success: true,
            error: None,
            steps_executed,
            steps_skipped,
            step_results,
        }
    }
}

/// Classify one step. Condition is checked before the command so an
/// excluded step reports its condition even when it also lacks a command.
fn plan_step(step: &Step, context: &ExecutionContext) -> StepResult {
    if let Some(condition) = &step.condition {
        if !condition.evaluate(context) {
            return StepResult::skipped(step, SkipKind::ConditionNotMet, condition.skip_reason(context));
        }
    }

    if step.command.is_none() {
        return StepResult::skipped(step, SkipKind::MissingCommand, MISSING_COMMAND_REASON.to_string());
    }

    StepResult::planned(step)
}
