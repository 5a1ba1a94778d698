//! Audit record types.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default log root, relative to the workspace.
pub const DEFAULT_LOG_DIR: &str = ".logs";

/// Whether a step was planned for execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Executed,
    Skipped,
}

/// One record per evaluated step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Session this record belongs to (stamped by the logger)
    pub session_id: String,

    /// Write order within the session (stamped by the logger)
    #[serde(default)]
    pub seq: u64,

    pub timestamp: DateTime<Utc>,

    /// Custom workflow being planned
    pub custom_workflow: String,

    /// Zero-based position of the step in the compiled plan
    pub step: usize,

    /// Step's workflow name
    pub workflow_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    pub decision: Decision,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl DecisionRecord {
    pub fn new(
        custom_workflow: impl Into<String>,
        step: usize,
        workflow_name: impl Into<String>,
        command: Option<String>,
        decision: Decision,
        reason: Option<String>,
    ) -> Self {
        Self {
            session_id: String::new(),
            seq: 0,
            timestamp: Utc::now(),
            custom_workflow: custom_workflow.into(),
            step,
            workflow_name: workflow_name.into(),
            command,
            decision,
            reason,
        }
    }
}

/// Orchestration-level event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    WorkflowStarted,
    WorkflowCompleted,
    WorkflowFailed,
    StepStarted,
    StepCompleted,
    StepFailed,
}

/// A free-form structured trace entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub session_id: String,

    #[serde(default)]
    pub seq: u64,

    pub timestamp: DateTime<Utc>,

    pub kind: EventKind,

    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

impl EventRecord {
    pub fn new(kind: EventKind) -> Self {
        Self {
            session_id: String::new(),
            seq: 0,
            timestamp: Utc::now(),
            kind,
            payload: serde_json::Map::new(),
        }
    }

    /// Add a payload field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }
}

/// File layout of a log root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLayout {
    root: PathBuf,
}

impl LogLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// `<workspace_root>/.logs`
    pub fn for_workspace(workspace_root: impl AsRef<Path>) -> Self {
        Self::new(workspace_root.as_ref().join(DEFAULT_LOG_DIR))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn decisions_dir(&self) -> PathBuf {
        self.root.join("decisions")
    }

    pub fn events_dir(&self) -> PathBuf {
        self.root.join("events")
    }

    pub fn decisions_path(&self, session_id: &str) -> PathBuf {
        self.decisions_dir().join(session_file_name(session_id))
    }

    pub fn events_path(&self, session_id: &str) -> PathBuf {
        self.events_dir().join(session_file_name(session_id))
    }
}

fn session_file_name(session_id: &str) -> String {
    format!("session-{}.jsonl", session_id)
}

/// Session id derived from a file name such as `session-20250101-120000.jsonl`.
pub fn session_id_from_file_name(name: &str) -> Option<&str> {
    name.strip_prefix("session-")?.strip_suffix(".jsonl")
}
