//! Flowspec Core: planning and auditing for role-scoped custom workflows.
//!
//! This crate holds the domain logic shared by the `flowspec` CLI:
//!
//! - `workflow`: definition schema, condition language, compiler, planner
//!   and the execution delegate seam
//! - `audit`: append-only JSONL decision and event logs per session
//! - `triage`: accuracy benchmark for finding classifiers
//!
//! Planning is synchronous. Only `workflow::drive_plan` is async, so callers
//! pick their own runtime.

pub mod audit;
pub mod error;
pub mod triage;
pub mod workflow;

// Convenience re-exports
pub use audit::{AuditLogger, AuditReader};
pub use error::WorkflowError;
pub use workflow::{ExecutionContext, ExecutionResult, StepResult, WorkflowConfig, WorkflowOrchestrator};
