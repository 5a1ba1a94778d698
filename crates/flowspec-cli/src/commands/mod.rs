//! CLI command implementations.
//!
//! Each submodule corresponds to a top-level CLI command and reuses the
//! flowspec-core domain logic through a `Workspace`.

pub mod logs;
pub mod triage;
pub mod workflow;

use std::path::{Path, PathBuf};

use flowspec_core::audit::{AuditLogger, AuditReader, LogLayout};
use flowspec_core::workflow::{ExecutionContext, WorkflowConfig, WorkflowOrchestrator};

/// Resolved workspace settings shared by every command.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub config: PathBuf,
    pub log_dir: PathBuf,
    pub session: Option<String>,
}

impl Workspace {
    /// `config` and `log_dir` are taken relative to `root` unless absolute.
    pub fn new(
        root: impl Into<PathBuf>,
        config: impl AsRef<Path>,
        log_dir: impl AsRef<Path>,
        session: Option<String>,
    ) -> Self {
        let root = root.into();
        Self {
            config: root.join(config),
            log_dir: root.join(log_dir),
            root,
            session,
        }
    }

    /// Explicit session id, or a fresh timestamp-derived one.
    pub fn session_id(&self) -> String {
        self.session.clone().unwrap_or_else(default_session_id)
    }

    pub fn layout(&self) -> LogLayout {
        LogLayout::new(&self.log_dir)
    }

    pub fn reader(&self) -> AuditReader {
        AuditReader::new(self.layout())
    }

    pub fn load_config(&self) -> Result<WorkflowConfig, String> {
        WorkflowConfig::from_file(&self.config).map_err(|e| e.to_string())
    }

    /// Orchestrator for a new planning session.
    pub fn orchestrator(&self) -> Result<WorkflowOrchestrator, String> {
        let config = self.load_config()?;
        let audit = AuditLogger::new(&self.layout(), self.session_id());
        Ok(WorkflowOrchestrator::new(config, audit))
    }
}

/// Session ids are local timestamps, so they sort chronologically.
pub fn default_session_id() -> String {
    chrono::Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Build the planning context: the JSON object first, then `key=value`
/// assignments on top.
pub fn build_context(assignments: &[String], json: Option<&str>) -> Result<ExecutionContext, String> {
    let mut context = match json {
        Some(raw) => {
            let value: serde_json::Value = serde_json::from_str(raw)
                .map_err(|e| format!("Invalid --context-json: {}", e))?;
            ExecutionContext::from_json(&value)?
        }
        None => ExecutionContext::new(),
    };

    for assignment in assignments {
        let (key, value) = ExecutionContext::parse_assignment(assignment)?;
        context.insert(key, value);
    }
    Ok(context)
}
