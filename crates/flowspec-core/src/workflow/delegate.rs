//! Execution delegate seam.
//!
//! The orchestrator only plans. Callers drive the plan through an
//! `ExecutionDelegate`, one executable step at a time, and stop at the
//! first failure.

use crate::audit::{AuditLogger, EventKind, EventRecord};
use crate::workflow::orchestrator::ExecutionResult;

/// Runs a single step command. Returns `true` on success.
#[allow(async_fn_in_trait)]
pub trait ExecutionDelegate {
    async fn invoke(&mut self, command: &str) -> bool;
}

/// Skill identifier for a command: the command without its leading `/`.
pub fn skill_name(command: &str) -> &str {
    command.strip_prefix('/').unwrap_or(command)
}

/// Outcome of driving a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriveSummary {
    /// Steps handed to the delegate
    pub invoked: usize,
    pub succeeded: usize,
    /// Zero-based plan index of the step that failed, if any
    pub failed_step: Option<usize>,
}

impl DriveSummary {
    pub fn is_success(&self) -> bool {
        self.failed_step.is_none()
    }
}

/// Drive every executable step of `plan` through `delegate`, in order,
/// emitting step events. Skipped steps are never invoked.
pub async fn drive_plan<D: ExecutionDelegate>(
    plan: &ExecutionResult,
    delegate: &mut D,
    audit: &AuditLogger,
) -> DriveSummary {
    let mut summary = DriveSummary::default();
    if !plan.success {
        return summary;
    }

    for (index, step) in plan.executable_steps() {
        let Some(command) = step.command.as_deref() else {
            continue;
        };

        audit.record_event(
            EventRecord::new(EventKind::StepStarted)
                .with("workflow", plan.workflow_name.as_str())
                .with("step", index)
                .with("command", command),
        );
        summary.invoked += 1;

        if delegate.invoke(command).await {
            summary.succeeded += 1;
            audit.record_event(
                EventRecord::new(EventKind::StepCompleted)
                    .with("workflow", plan.workflow_name.as_str())
                    .with("step", index)
                    .with("command", command),
            );
        } else {
            tracing::warn!(
                "[Delegate] Step {} ({}) failed, stopping {}",
                index + 1,
                command,
                plan.workflow_name
            );
            audit.record_event(
                EventRecord::new(EventKind::StepFailed)
                    .with("workflow", plan.workflow_name.as_str())
                    .with("step", index)
                    .with("command", command),
            );
            summary.failed_step = Some(index);
            break;
        }
    }

    summary
}
