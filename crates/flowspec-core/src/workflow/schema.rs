//! Schema types for the workflow definition graph.
//!
//! A definition file declares role-scoped base workflows (each mapping to a
//! single command) and named custom workflows that sequence them:
//!
//! ```yaml
//! version: "2.0"
//!
//! roles:
//!   primary: dev
//!   show_all_commands: false
//!   definitions:
//!     dev:
//!       display_name: "Developer"
//!       icon: "💻"
//!       commands: [build, debug]
//!       agents: [backend-engineer]
//!
//! states: ["To Do", "Specified", "Researched", "Done"]
//!
//! workflows:
//!   specify:
//!     command: "/flow:specify"
//!     agents: [pm-planner]
//!     input_states: ["To Do"]
//!     output_state: "Specified"
//!   research:
//!     command: "/flow:research"
//!     agents: [researcher]
//!
//! custom_workflows:
//!   full_design:
//!     description: "Specify, then research complex features"
//!     mode: spec-ing
//!     steps:
//!       - workflow: specify
//!       - workflow: research
//!         condition: "complexity >= 7"
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;

/// Default definition file name, resolved relative to the workspace root.
pub const DEFAULT_WORKFLOW_FILE: &str = "flowspec_workflow.yml";

/// Top-level definition graph loaded from YAML or JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Version string
    #[serde(default = "default_version")]
    pub version: String,

    /// Role definitions (read by surrounding tooling, lint-checked here)
    #[serde(default)]
    pub roles: RolesConfig,

    /// Known task states
    #[serde(default)]
    pub states: Vec<String>,

    /// Base workflows keyed by name
    #[serde(default)]
    pub workflows: HashMap<String, WorkflowDef>,

    /// Composed workflows keyed by name; sorted so listings are stable
    #[serde(default)]
    pub custom_workflows: BTreeMap<String, CustomWorkflow>,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// The `roles` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RolesConfig {
    /// Role whose commands are surfaced first
    #[serde(default)]
    pub primary: Option<String>,

    #[serde(default)]
    pub show_all_commands: bool,

    #[serde(default)]
    pub definitions: BTreeMap<String, RoleDefinition>,
}

/// A single role definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleDefinition {
    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub icon: Option<String>,

    #[serde(default)]
    pub commands: Vec<String>,

    #[serde(default)]
    pub agents: Vec<String>,
}

/// A base workflow: one role-scoped command plus its agents and state transition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowDef {
    /// Command identifier handed to the execution delegate (e.g. `/flow:specify`)
    #[serde(default)]
    pub command: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Agents required by this workflow
    #[serde(default)]
    pub agents: Vec<String>,

    #[serde(default)]
    pub input_states: Vec<String>,

    #[serde(default)]
    pub output_state: Option<String>,
}

/// A named, ordered sequence of step templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomWorkflow {
    /// Display name (defaults to the map key)
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Free-form mode label (e.g. "vibing", "spec-ing")
    #[serde(default)]
    pub mode: Option<String>,

    /// Steps, in execution order
    #[serde(default)]
    pub steps: Vec<StepTemplate>,
}

/// One step of a custom workflow, before compilation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepTemplate {
    /// Reference to a base workflow in `workflows`
    #[serde(default)]
    pub workflow: Option<String>,

    /// Explicit command; wins over the referenced workflow's command
    #[serde(default)]
    pub command: Option<String>,

    /// Inclusion condition, e.g. `complexity >= 7`
    #[serde(default)]
    pub condition: Option<String>,

    #[serde(default)]
    pub agents: Vec<String>,

    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl WorkflowConfig {
    /// Parse a definition graph from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, WorkflowError> {
        serde_yaml::from_str(yaml)
            .map_err(|e| WorkflowError::Definition(format!("Failed to parse workflow YAML: {}", e)))
    }

    /// Parse a definition graph from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, WorkflowError> {
        serde_json::from_str(json)
            .map_err(|e| WorkflowError::Definition(format!("Failed to parse workflow JSON: {}", e)))
    }

    /// Load a definition graph from disk. `.json` files are parsed as JSON,
    /// everything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, WorkflowError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            WorkflowError::Definition(format!(
                "Failed to read workflow file '{}': {}",
                path.display(),
                e
            ))
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    /// Look up a custom workflow by name.
    pub fn custom_workflow(&self, name: &str) -> Option<&CustomWorkflow> {
        self.custom_workflows.get(name)
    }

    /// Names of all custom workflows, sorted.
    pub fn custom_workflow_names(&self) -> Vec<String> {
        self.custom_workflows.keys().cloned().collect()
    }

    /// Command of a base workflow, if both exist.
    pub fn command_for(&self, workflow: &str) -> Option<&str> {
        self.workflows
            .get(workflow)
            .and_then(|w| w.command.as_deref())
    }
}
