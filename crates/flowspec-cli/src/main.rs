//! Flowspec CLI: plan, drive and audit role-scoped custom workflows.
//!
//! Reuses the flowspec-core planner and audit log; every subcommand
//! resolves the same workspace settings.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use flowspec_cli::commands::{self, Workspace};
use flowspec_core::audit::DEFAULT_LOG_DIR;
use flowspec_core::triage::DEFAULT_ACCURACY_TARGET;
use flowspec_core::workflow::DEFAULT_WORKFLOW_FILE;

/// Flowspec CLI: declarative agent workflows with an audit trail
#[derive(Parser)]
#[command(name = "flowspec", version, about = "Flowspec CLI: declarative agent workflows with an audit trail")]
pub struct Cli {
    /// Workspace root
    #[arg(long, global = true, env = "FLOWSPEC_WORKSPACE", default_value = ".")]
    workspace: PathBuf,

    /// Workflow definition file, relative to the workspace
    #[arg(long, global = true, env = "FLOWSPEC_WORKFLOW_FILE", default_value = DEFAULT_WORKFLOW_FILE)]
    config: PathBuf,

    /// Audit log directory, relative to the workspace
    #[arg(long, global = true, env = "FLOWSPEC_LOG_DIR", default_value = DEFAULT_LOG_DIR)]
    log_dir: PathBuf,

    /// Session ID for audit logs (defaults to a timestamp)
    #[arg(long, global = true, env = "FLOWSPEC_SESSION_ID")]
    session: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan and run custom workflows
    Workflow {
        #[command(subcommand)]
        action: WorkflowAction,
    },

    /// Inspect audit logs
    Logs {
        #[command(subcommand)]
        action: LogsAction,
    },

    /// Benchmark finding triage
    Triage {
        #[command(subcommand)]
        action: TriageAction,
    },
}

#[derive(clap::Args)]
struct ContextArgs {
    /// Context value as key=value (repeatable)
    #[arg(long = "context", value_name = "KEY=VALUE")]
    context: Vec<String>,

    /// Context as a JSON object; --context values override it
    #[arg(long)]
    context_json: Option<String>,
}

#[derive(Subcommand)]
enum WorkflowAction {
    /// List custom workflows
    List,
    /// Show which steps would run for a context
    Plan {
        /// Custom workflow name
        name: String,
        #[command(flatten)]
        context: ContextArgs,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Plan a workflow and invoke each executable step
    Run {
        /// Custom workflow name
        name: String,
        #[command(flatten)]
        context: ContextArgs,
        /// Program invoked as `<runner> <skill>` per step (dry run if omitted)
        #[arg(long)]
        runner: Option<String>,
        /// Emit task-tracker updates for this task ID
        #[arg(long)]
        task_id: Option<String>,
    },
    /// Lint the workflow definition
    Validate,
}

#[derive(Subcommand)]
enum LogsAction {
    /// Show a session's decisions (--session, or the newest session)
    Show {
        /// Show events instead of decisions
        #[arg(long)]
        events: bool,
    },
    /// List recorded sessions
    Sessions,
}

#[derive(Subcommand)]
enum TriageAction {
    /// Score predictions against a ground-truth dataset
    Score {
        /// Ground-truth dataset JSON
        #[arg(long)]
        dataset: PathBuf,
        /// Predictions JSONL
        #[arg(long)]
        predictions: PathBuf,
        /// Required accuracy (0.0 - 1.0)
        #[arg(long, default_value_t = DEFAULT_ACCURACY_TARGET)]
        target: f64,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flowspec_core=warn,flowspec_cli=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let workspace = Workspace::new(&cli.workspace, &cli.config, &cli.log_dir, cli.session.clone());

    let result = match cli.command {
        Some(Commands::Workflow { action }) => match action {
            WorkflowAction::List => commands::workflow::list(&workspace).await,
            WorkflowAction::Plan { name, context, json } => {
                match commands::build_context(&context.context, context.context_json.as_deref()) {
                    Ok(ctx) => commands::workflow::plan(&workspace, &name, &ctx, json).await,
                    Err(e) => Err(e),
                }
            }
            WorkflowAction::Run {
                name,
                context,
                runner,
                task_id,
            } => match commands::build_context(&context.context, context.context_json.as_deref()) {
                Ok(ctx) => {
                    commands::workflow::run(&workspace, &name, &ctx, runner.as_deref(), task_id.as_deref())
                        .await
                }
                Err(e) => Err(e),
            },
            WorkflowAction::Validate => commands::workflow::validate(&workspace).await,
        },

        Some(Commands::Logs { action }) => match action {
            LogsAction::Show { events } => {
                commands::logs::show(&workspace, cli.session.as_deref(), events).await
            }
            LogsAction::Sessions => commands::logs::sessions(&workspace).await,
        },

        Some(Commands::Triage { action }) => match action {
            TriageAction::Score {
                dataset,
                predictions,
                target,
                json,
            } => commands::triage::score(&dataset, &predictions, target, json).await,
        },

        None => {
            // No subcommand: show help
            use clap::CommandFactory;
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
