//! Core error type for workflow compilation and planning.
//!
//! `WorkflowError` covers everything that prevents a step plan from being
//! computed. The planner never lets it escape `execute_custom_workflow`;
//! it is folded into `ExecutionResult::error` instead.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkflowError {
    #[error("Unknown workflow '{name}'. Available: {}", .available.join(", "))]
    UnknownWorkflow { name: String, available: Vec<String> },

    #[error("Invalid condition in workflow '{workflow}' step {position}: '{expression}' ({reason})")]
    InvalidCondition {
        workflow: String,
        position: usize,
        expression: String,
        reason: String,
    },

    #[error("Definition error: {0}")]
    Definition(String),
}

impl WorkflowError {
    /// True when the error can be recovered from by listing known workflows.
    pub fn is_unknown_workflow(&self) -> bool {
        matches!(self, WorkflowError::UnknownWorkflow { .. })
    }
}
