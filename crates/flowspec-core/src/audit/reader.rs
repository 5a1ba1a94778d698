//! AuditReader: read session audit logs back from a log root.
//!
//! Malformed lines are skipped so a partially corrupted log still yields
//! every intact record, in write order.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use super::types::{session_id_from_file_name, DecisionRecord, EventRecord, LogLayout};

#[derive(Debug, Clone)]
pub struct AuditReader {
    layout: LogLayout,
}

impl AuditReader {
    pub fn new(layout: LogLayout) -> Self {
        Self { layout }
    }

    /// Reader rooted at `<workspace_root>/.logs`.
    pub fn for_workspace(workspace_root: impl AsRef<Path>) -> Self {
        Self::new(LogLayout::for_workspace(workspace_root))
    }

    /// Decision records of a session, ordered by `seq`.
    pub fn decisions(&self, session_id: &str) -> Result<Vec<DecisionRecord>, AuditReadError> {
        let mut records: Vec<DecisionRecord> = read_jsonl(&self.layout.decisions_path(session_id))?;
        records.sort_by_key(|r| r.seq);
        Ok(records)
    }

    /// Event records of a session, ordered by `seq`.
    pub fn events(&self, session_id: &str) -> Result<Vec<EventRecord>, AuditReadError> {
        let mut records: Vec<EventRecord> = read_jsonl(&self.layout.events_path(session_id))?;
        records.sort_by_key(|r| r.seq);
        Ok(records)
    }

    /// All session ids with a decision or event log, newest first
    /// (timestamp-derived ids sort chronologically).
    pub fn sessions(&self) -> Result<Vec<String>, AuditReadError> {
        let mut sessions = Vec::new();
        for dir in [self.layout.decisions_dir(), self.layout.events_dir()] {
            for file in collect_jsonl_files(&dir)? {
                let id = file
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(session_id_from_file_name)
                    .map(str::to_string);
                if let Some(id) = id {
                    if !sessions.contains(&id) {
                        sessions.push(id);
                    }
                }
            }
        }
        sessions.sort_by(|a, b| b.cmp(a));
        Ok(sessions)
    }
}

fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, AuditReadError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| AuditReadError::Io(format!("Failed to read '{}': {}", path.display(), e)))?;

    let mut records = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::debug!("[AuditReader] Skipping malformed line {} in {}: {}", line_no + 1, path.display(), e);
            }
        }
    }
    Ok(records)
}

fn collect_jsonl_files(dir: &Path) -> Result<Vec<PathBuf>, AuditReadError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    let entries = std::fs::read_dir(dir)
        .map_err(|e| AuditReadError::Io(format!("Failed to read directory: {}", e)))?;
    for entry in entries {
        let path = entry
            .map_err(|e| AuditReadError::Io(format!("Failed to read dir entry: {}", e)))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "jsonl") {
            files.push(path);
        }
    }
    Ok(files)
}

/// Error type for audit reads.
#[derive(Debug, thiserror::Error)]
pub enum AuditReadError {
    #[error("IO error: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::types::{Decision, EventKind};
    use crate::audit::AuditLogger;

    #[test]
    fn test_reads_back_records_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let logger = AuditLogger::for_workspace(dir.path(), "20250101-120000");
        logger.record_event(EventRecord::new(EventKind::WorkflowStarted));
        logger.record_decision(DecisionRecord::new("w", 0, "a", None, Decision::Executed, None));
        logger.record_decision(DecisionRecord::new(
            "w",
            1,
            "b",
            None,
            Decision::Skipped,
            Some("no command resolved for step".to_string()),
        ));

        let reader = AuditReader::for_workspace(dir.path());
        let decisions = reader.decisions("20250101-120000").unwrap();
        assert_eq!(decisions.len(), 2);
        assert_eq!(decisions[0].workflow_name, "a");
        assert_eq!(decisions[1].decision, Decision::Skipped);
        assert_eq!(reader.events("20250101-120000").unwrap().len(), 1);
    }

    #[test]
    fn test_reused_session_keeps_runs_apart() {
        let dir = tempfile::tempdir().unwrap();
        for run in ["run1", "run2"] {
            let logger = AuditLogger::for_workspace(dir.path(), "same");
            logger.record_decision(DecisionRecord::new(run, 0, "a", None, Decision::Executed, None));
            logger.record_decision(DecisionRecord::new(run, 1, "b", None, Decision::Executed, None));
        }

        let decisions = AuditReader::for_workspace(dir.path()).decisions("same").unwrap();
        let order: Vec<_> = decisions
            .iter()
            .map(|d| format!("{}:{}:{}", d.custom_workflow, d.workflow_name, d.seq))
            .collect();
        assert_eq!(order, vec!["run1:a:0", "run1:b:1", "run2:a:2", "run2:b:3"]);
    }

    #[test]
    fn test_missing_session_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let reader = AuditReader::for_workspace(dir.path());
        assert!(reader.decisions("nope").unwrap().is_empty());
        assert!(reader.sessions().unwrap().is_empty());
    }

    #[test]
    fn test_skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let logger = AuditLogger::for_workspace(dir.path(), "s");
        logger.record_event(EventRecord::new(EventKind::WorkflowStarted));
        let mut raw = std::fs::read_to_string(logger.events_path()).unwrap();
        raw.push_str("{not json\n");
        std::fs::write(logger.events_path(), raw).unwrap();
        logger.record_event(EventRecord::new(EventKind::WorkflowCompleted));

        let events = AuditReader::for_workspace(dir.path()).events("s").unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].kind, EventKind::WorkflowCompleted);
    }

    #[test]
    fn test_lists_sessions_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        AuditLogger::for_workspace(dir.path(), "20250101-090000")
            .record_event(EventRecord::new(EventKind::WorkflowStarted));
        AuditLogger::for_workspace(dir.path(), "20250102-090000")
            .record_decision(DecisionRecord::new("w", 0, "a", None, Decision::Executed, None));

        let sessions = AuditReader::for_workspace(dir.path()).sessions().unwrap();
        assert_eq!(sessions, vec!["20250102-090000", "20250101-090000"]);
    }
}
