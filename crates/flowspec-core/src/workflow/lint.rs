//! Static checks over a definition graph.
//!
//! Errors are problems that would make planning fail or silently skip a
//! step. Warnings flag definitions that are legal but probably unintended.

use std::fmt;

use serde::Serialize;

use crate::workflow::condition::Condition;
use crate::workflow::schema::WorkflowConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintIssue {
    pub severity: Severity,
    pub message: String,
}

impl LintIssue {
    fn error(message: impl Into<String>) -> Self {
        Self { severity: Severity::Error, message: message.into() }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self { severity: Severity::Warning, message: message.into() }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Check a definition graph. Issues come back errors first, then in
/// definition order.
pub fn lint(config: &WorkflowConfig) -> Vec<LintIssue> {
    let mut issues = Vec::new();

    for (name, custom) in &config.custom_workflows {
        if custom.steps.is_empty() {
            issues.push(LintIssue::warning(format!("Custom workflow '{}' has no steps", name)));
        }

        for (index, step) in custom.steps.iter().enumerate() {
            let position = index + 1;

            if let Some(expression) = step.condition.as_deref() {
                if let Err(e) = Condition::parse(expression) {
                    issues.push(LintIssue::error(format!(
                        "{} step {}: invalid condition '{}' ({})",
                        name, position, expression, e
                    )));
                }
            }

            let has_command = step.command.as_deref().is_some_and(|c| !c.trim().is_empty());
            match step.workflow.as_deref() {
                None if !has_command => issues.push(LintIssue::error(format!(
                    "{} step {}: neither workflow nor command is set",
                    name, position
                ))),
                Some(target) if !has_command && !config.workflows.contains_key(target) => {
                    let message = if config.custom_workflows.contains_key(target) {
                        format!(
                            "{} step {}: '{}' is a custom workflow; nested custom workflows are not expanded",
                            name, position, target
                        )
                    } else {
                        format!("{} step {}: unknown workflow '{}'", name, position, target)
                    };
                    issues.push(LintIssue::error(message));
                }
                _ => {}
            }
        }
    }

    let mut base_names: Vec<&String> = config.workflows.keys().collect();
    base_names.sort();
    for name in base_names {
        let def = &config.workflows[name];
        if config.command_for(name).map_or(true, |c| c.trim().is_empty()) {
            issues.push(LintIssue::warning(format!("Workflow '{}' has no command", name)));
        }

        if !config.states.is_empty() {
            let referenced = def.input_states.iter().chain(def.output_state.iter());
            for state in referenced {
                if !config.states.contains(state) {
                    issues.push(LintIssue::warning(format!(
                        "Workflow '{}' references undeclared state '{}'",
                        name, state
                    )));
                }
            }
        }
    }

    if let Some(primary) = config.roles.primary.as_deref() {
        if !config.roles.definitions.contains_key(primary) {
            issues.push(LintIssue::warning(format!(
                "Primary role '{}' is not defined under roles.definitions",
                primary
            )));
        }
    }

    issues.sort_by_key(|issue| issue.severity);
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_definition_has_no_issues() {
        let config = WorkflowConfig::from_yaml(
            r#"
states: [To Do, Specified, Done]
roles:
  primary: dev
  definitions:
    dev: { display_name: Developer }
workflows:
  specify: { command: "/flow:specify", input_states: [To Do], output_state: Specified }
custom_workflows:
  quick:
    steps:
      - workflow: specify
        condition: "complexity < 5"
      - command: "/ops:ship"
"#,
        )
        .unwrap();
        assert!(lint(&config).is_empty());
    }

    #[test]
    fn test_reports_errors_before_warnings() {
        let config = WorkflowConfig::from_yaml(
            r#"
states: [To Do]
roles:
  primary: pm
workflows:
  specify: { command: "/flow:specify", output_state: Specified }
  draft: {}
custom_workflows:
  inner:
    steps:
      - workflow: specify
  outer:
    steps:
      - workflow: missing
      - workflow: inner
      - condition: "exists(x)"
      - workflow: specify
        condition: "complexity >>= 7"
  hollow:
    steps: []
"#,
        )
        .unwrap();

        let issues = lint(&config);
        let errors: Vec<_> = issues.iter().filter(|i| i.is_error()).collect();
        assert_eq!(errors.len(), 4);
        assert!(issues[..4].iter().all(LintIssue::is_error));
        assert!(errors.iter().any(|i| i.message.contains("unknown workflow 'missing'")));
        assert!(errors.iter().any(|i| i.message.contains("not expanded")));
        assert!(errors.iter().any(|i| i.message.contains("neither workflow nor command")));
        assert!(errors.iter().any(|i| i.message.contains("invalid condition")));

        let warnings: Vec<_> = issues.iter().filter(|i| !i.is_error()).map(|i| i.message.as_str()).collect();
        assert!(warnings.iter().any(|m| m.contains("'hollow' has no steps")));
        assert!(warnings.iter().any(|m| m.contains("'draft' has no command")));
        assert!(warnings.iter().any(|m| m.contains("undeclared state 'Specified'")));
        assert!(warnings.iter().any(|m| m.contains("Primary role 'pm'")));
    }

    #[test]
    fn test_explicit_command_satisfies_unknown_workflow() {
        let config = WorkflowConfig::from_yaml(
            r#"
custom_workflows:
  adhoc:
    steps:
      - workflow: deploy
        command: "/ops:deploy"
"#,
        )
        .unwrap();
        assert!(lint(&config).is_empty());
        assert_eq!(
            LintIssue::warning("x").to_string(),
            "warning: x"
        );
    }
}
