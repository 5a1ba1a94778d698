//! `flowspec workflow`: list, plan, run and validate custom workflows.

use std::path::PathBuf;

use console::style;
use serde::Serialize;

use flowspec_core::workflow::{
    drive_plan, lint, skill_name, DriveSummary, ExecutionContext, ExecutionDelegate, ExecutionResult, SkipKind,
    WorkflowOrchestrator,
};

use super::Workspace;

/// List custom workflows with their step counts.
pub async fn list(workspace: &Workspace) -> Result<(), String> {
    let config = workspace.load_config()?;
    let names = config.custom_workflow_names();

    if names.is_empty() {
        println!("No custom workflows defined in {}", workspace.config.display());
        return Ok(());
    }

    println!("Custom workflows ({}):", names.len());
    for name in &names {
        let Some(custom) = config.custom_workflow(name) else {
            continue;
        };
        let mode = custom.mode.as_deref().map(|m| format!(" [{}]", m)).unwrap_or_default();
        println!("  {} ({} steps){}", style(name).bold(), custom.steps.len(), mode);
        if let Some(description) = custom.description.as_deref() {
            println!("      {}", description);
        }
    }
    Ok(())
}

/// Plan a workflow and print the decision per step.
pub async fn plan(
    workspace: &Workspace,
    name: &str,
    context: &ExecutionContext,
    json: bool,
) -> Result<(), String> {
    let orchestrator = workspace.orchestrator()?;
    let result = orchestrator.execute_custom_workflow(name, context);

    if json {
        let out = serde_json::to_string_pretty(&result).map_err(|e| e.to_string())?;
        println!("{}", out);
    } else {
        print_plan(&result);
    }

    if result.success {
        Ok(())
    } else {
        Err(result.error.unwrap_or_else(|| format!("Failed to plan '{}'", name)))
    }
}

/// Plan a workflow and drive it through a delegate.
pub async fn run(
    workspace: &Workspace,
    name: &str,
    context: &ExecutionContext,
    runner: Option<&str>,
    task_id: Option<&str>,
) -> Result<(), String> {
    let orchestrator = workspace.orchestrator()?;
    let report = match runner {
        Some(program) => {
            let mut delegate = ProcessDelegate::new(program, &workspace.root);
            execute(&orchestrator, name, context, &mut delegate, task_id).await
        }
        None => {
            let mut delegate = DryRunDelegate::default();
            execute(&orchestrator, name, context, &mut delegate, task_id).await
        }
    };

    for update in &report.task_updates {
        let line = serde_json::to_string(update).map_err(|e| e.to_string())?;
        println!("{}", line);
    }

    if !report.plan.success {
        return Err(report
            .plan
            .error
            .unwrap_or_else(|| format!("Failed to plan '{}'", name)));
    }

    match report.summary.failed_step {
        Some(index) => {
            let step = &report.plan.step_results[index];
            Err(format!(
                "Workflow '{}' stopped at step {} ({})",
                name,
                index + 1,
                step.command.as_deref().unwrap_or(&step.workflow_name)
            ))
        }
        None => {
            println!(
                "\n{} Workflow '{}' completed: {} step(s) run, {} skipped (session {})",
                style("✓").green(),
                name,
                report.summary.succeeded,
                report.plan.steps_skipped,
                orchestrator.session_id()
            );
            Ok(())
        }
    }
}

/// Lint the definition file.
pub async fn validate(workspace: &Workspace) -> Result<(), String> {
    let config = workspace.load_config()?;
    let issues = lint(&config);

    for issue in &issues {
        if issue.is_error() {
            println!("  {} {}", style("✗").red(), issue.message);
        } else {
            println!("  {} {}", style("!").yellow(), issue.message);
        }
    }

    let errors = issues.iter().filter(|i| i.is_error()).count();
    if errors > 0 {
        return Err(format!(
            "{} has {} error(s), {} warning(s)",
            workspace.config.display(),
            errors,
            issues.len() - errors
        ));
    }

    println!(
        "✅ {} is valid ({} custom workflow(s), {} warning(s))",
        workspace.config.display(),
        config.custom_workflows.len(),
        issues.len()
    );
    Ok(())
}

/// Tracker update a task integration would apply for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskUpdate {
    pub task_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub notes: String,
}

impl TaskUpdate {
    fn new(task_id: &str, status: Option<&str>, notes: String) -> Self {
        Self {
            task_id: task_id.to_string(),
            status: status.map(str::to_string),
            notes,
        }
    }
}

/// Everything a run produced.
#[derive(Debug)]
pub struct RunReport {
    pub plan: ExecutionResult,
    pub summary: DriveSummary,
    pub task_updates: Vec<TaskUpdate>,
}

/// Plan `name`, print the plan, then drive it through `delegate` and
/// collect task updates.
pub async fn execute<D: ExecutionDelegate>(
    orchestrator: &WorkflowOrchestrator,
    name: &str,
    context: &ExecutionContext,
    delegate: &mut D,
    task_id: Option<&str>,
) -> RunReport {
    let plan = orchestrator.execute_custom_workflow(name, context);
    print_plan(&plan);
    let (summary, task_updates) = drive(orchestrator, &plan, delegate, task_id).await;
    RunReport { plan, summary, task_updates }
}

/// Drive an existing plan, collecting the task updates a tracker would get.
async fn drive<D: ExecutionDelegate>(
    orchestrator: &WorkflowOrchestrator,
    plan: &ExecutionResult,
    delegate: &mut D,
    task_id: Option<&str>,
) -> (DriveSummary, Vec<TaskUpdate>) {
    let summary = drive_plan(plan, delegate, orchestrator.audit()).await;

    let mut task_updates = Vec::new();
    if let Some(task_id) = task_id.filter(|_| plan.success) {
        task_updates.push(TaskUpdate::new(
            task_id,
            Some("In Progress"),
            format!("Executing workflow: {}", plan.workflow_name),
        ));

        for (_, step) in plan.executable_steps().take(summary.succeeded) {
            task_updates.push(TaskUpdate::new(
                task_id,
                None,
                format!("Completed: {}", step.workflow_name),
            ));
        }

        if summary.is_success() {
            task_updates.push(TaskUpdate::new(
                task_id,
                Some("Done"),
                format!("Workflow {} completed successfully", plan.workflow_name),
            ));
        }
    }

    (summary, task_updates)
}

fn print_plan(result: &ExecutionResult) {
    if !result.success {
        return;
    }

    println!(
        "📋 {}: {} to execute, {} skipped",
        style(&result.workflow_name).bold(),
        result.steps_executed,
        result.steps_skipped
    );
    for (i, step) in result.step_results.iter().enumerate() {
        let command = step.command.as_deref().unwrap_or("-");
        match step.skip_kind {
            None => println!("  {}. {} {} ({})", i + 1, style("▶").green(), step.workflow_name, command),
            Some(SkipKind::ConditionNotMet) => println!(
                "  {}. {} {} ({})",
                i + 1,
                style("⏭").dim(),
                step.workflow_name,
                step.skip_reason.as_deref().unwrap_or("skipped")
            ),
            Some(SkipKind::MissingCommand) => println!(
                "  {}. {} {} ({})",
                i + 1,
                style("!").yellow(),
                step.workflow_name,
                step.skip_reason.as_deref().unwrap_or("skipped")
            ),
        }
    }
}

/// Prints the skill each step would invoke and reports success.
#[derive(Debug, Default)]
pub struct DryRunDelegate {
    pub invoked: Vec<String>,
}

impl ExecutionDelegate for DryRunDelegate {
    async fn invoke(&mut self, command: &str) -> bool {
        let skill = skill_name(command);
        println!("  → would invoke skill '{}'", skill);
        self.invoked.push(skill.to_string());
        true
    }
}

/// Runs `<program> <skill>` in the workspace root for every step.
#[derive(Debug, Clone)]
pub struct ProcessDelegate {
    program: String,
    cwd: PathBuf,
}

impl ProcessDelegate {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            cwd: cwd.into(),
        }
    }
}

impl ExecutionDelegate for ProcessDelegate {
    async fn invoke(&mut self, command: &str) -> bool {
        let skill = skill_name(command);
        tracing::info!("[Runner] {} {}", self.program, skill);

        let status = tokio::process::Command::new(&self.program)
            .arg(skill)
            .current_dir(&self.cwd)
            .status()
            .await;

        match status {
            Ok(status) => status.success(),
            Err(e) => {
                tracing::warn!("[Runner] Failed to spawn '{}': {}", self.program, e);
                false
            }
        }
    }
}
