//! Workflow engine: plans custom workflows from a YAML definition graph.
//!
//! Custom workflows sequence base workflows, each step optionally gated by a
//! condition over caller-supplied context. Planning is synchronous and
//! side-effect free apart from audit records; executing the plan is the
//! caller's job.
//!
//! # Architecture
//!
//! ```text
//! flowspec_workflow.yml ──► WorkflowConfig ──► compile() ──► Vec<Step>
//!                                                              │
//!                          ExecutionContext ──► WorkflowOrchestrator ──► AuditLogger
//!                                                              │
//!                                                       ExecutionResult
//!                                                              │
//!                                               drive_plan(ExecutionDelegate)
//! ```

pub mod schema;
pub mod context;
pub mod condition;
pub mod compiler;
pub mod orchestrator;
pub mod delegate;
pub mod lint;

pub use schema::{CustomWorkflow, RoleDefinition, RolesConfig, StepTemplate, WorkflowConfig, WorkflowDef, DEFAULT_WORKFLOW_FILE};
pub use context::{ContextValue, ExecutionContext};
pub use condition::{CompareOp, Condition, ConditionError};
pub use compiler::{compile, Step};
pub use orchestrator::{ExecutionResult, SkipKind, StepResult, WorkflowOrchestrator, MISSING_COMMAND_REASON};
pub use delegate::{drive_plan, skill_name, DriveSummary, ExecutionDelegate};
pub use lint::{lint, LintIssue, Severity};
