//! Workflow compiler: resolves a custom workflow into an ordered step list.
//!
//! Compilation is lookup-and-copy: steps keep the author's order, nothing is
//! merged or deduplicated, and a step that references another custom
//! workflow is not expanded. Every condition is parsed here so the planner
//! never sees a malformed expression.

use serde::Serialize;

use crate::error::WorkflowError;
use crate::workflow::condition::Condition;
use crate::workflow::schema::{StepTemplate, WorkflowConfig};

/// A compiled step, immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    /// Referenced base workflow (or the custom workflow itself when the
    /// template names no workflow)
    pub workflow_name: String,
    /// Exact command identifier for the execution delegate
    pub command: Option<String>,
    pub condition: Option<Condition>,
}

/// Compile `workflow_name` from the definition graph.
pub fn compile(config: &WorkflowConfig, workflow_name: &str) -> Result<Vec<Step>, WorkflowError> {
    let custom = config
        .custom_workflow(workflow_name)
        .ok_or_else(|| WorkflowError::UnknownWorkflow {
            name: workflow_name.to_string(),
            available: config.custom_workflow_names(),
        })?;

    custom
        .steps
        .iter()
        .enumerate()
        .map(|(position, template)| compile_step(config, workflow_name, position + 1, template))
        .collect()
}

fn compile_step(
    config: &WorkflowConfig,
    workflow_name: &str,
    position: usize,
    template: &StepTemplate,
) -> Result<Step, WorkflowError> {
    let condition = match template.condition.as_deref() {
        Some(expression) => Some(Condition::parse(expression).map_err(|e| {
            WorkflowError::InvalidCondition {
                workflow: workflow_name.to_string(),
                position,
                expression: expression.to_string(),
                reason: e.to_string(),
            }
        })?),
        None => None,
    };

    // A blank explicit command counts as unset and falls back to the base workflow's.
    let command = template
        .command
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .or_else(|| template.workflow.as_deref().and_then(|w| config.command_for(w)))
        .filter(|c| !c.trim().is_empty())
        .map(str::to_string);

    Ok(Step {
        workflow_name: template
            .workflow
            .clone()
            .unwrap_or_else(|| workflow_name.to_string()),
        command,
        condition,
    })
}
