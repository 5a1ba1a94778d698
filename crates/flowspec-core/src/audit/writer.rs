//! AuditLogger: JSONL append-only writer for one session's audit logs.
//!
//! - One sink guard per logger; decision and event writes are serialized
//! - Each record is rendered to a full line before the file is touched
//! - Directories are created on first write
//! - The sequence resumes after the highest `seq` already in the session's files
//! - `record_*` never fails the main flow; faults go to `tracing` and a counter

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::types::{DecisionRecord, EventRecord, LogLayout};

/// Handle to a session's decision and event logs. Clones share the sink.
#[derive(Clone)]
pub struct AuditLogger {
    inner: Arc<Inner>,
}

struct Inner {
    session_id: String,
    decisions_path: PathBuf,
    events_path: PathBuf,
    /// Next sequence number, seeded on first write; held for the duration of a write
    sink: Mutex<Option<u64>>,
    failed_writes: AtomicUsize,
}

impl AuditLogger {
    /// Create a logger for `session_id` under the given layout.
    pub fn new(layout: &LogLayout, session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        Self {
            inner: Arc::new(Inner {
                decisions_path: layout.decisions_path(&session_id),
                events_path: layout.events_path(&session_id),
                session_id,
                sink: Mutex::new(None),
                failed_writes: AtomicUsize::new(0),
            }),
        }
    }

    /// Logger rooted at `<workspace_root>/.logs`.
    pub fn for_workspace(workspace_root: impl AsRef<Path>, session_id: impl Into<String>) -> Self {
        Self::new(&LogLayout::for_workspace(workspace_root), session_id)
    }

    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    pub fn decisions_path(&self) -> &Path {
        &self.inner.decisions_path
    }

    pub fn events_path(&self) -> &Path {
        &self.inner.events_path
    }

    /// Number of records that could not be written.
    pub fn failed_writes(&self) -> usize {
        self.inner.failed_writes.load(Ordering::Relaxed)
    }

    /// Append a decision record, returning any write fault.
    pub fn try_record_decision(&self, mut record: DecisionRecord) -> Result<(), AuditWriteError> {
        record.session_id = self.inner.session_id.clone();
        self.append(&self.inner.decisions_path, |seq| {
            record.seq = seq;
            serde_json::to_string(&record)
        })
    }

    /// Append an event record, returning any write fault.
    pub fn try_record_event(&self, mut record: EventRecord) -> Result<(), AuditWriteError> {
        record.session_id = self.inner.session_id.clone();
        self.append(&self.inner.events_path, |seq| {
            record.seq = seq;
            serde_json::to_string(&record)
        })
    }

    /// Append a decision record, logging faults but never failing.
    pub fn record_decision(&self, record: DecisionRecord) {
        if let Err(e) = self.try_record_decision(record) {
            self.report(&e);
        }
    }

    /// Append an event record, logging faults but never failing.
    pub fn record_event(&self, record: EventRecord) {
        if let Err(e) = self.try_record_event(record) {
            self.report(&e);
        }
    }

    fn report(&self, error: &AuditWriteError) {
        self.inner.failed_writes.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(
            session = %self.inner.session_id,
            "[AuditLogger] Failed to write audit record: {}",
            error
        );
    }

    fn append<F>(&self, path: &Path, render: F) -> Result<(), AuditWriteError>
    where
        F: FnOnce(u64) -> Result<String, serde_json::Error>,
    {
        // A poisoned guard still holds a valid counter.
        let mut next_seq = self
            .inner
            .sink
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let seq = match *next_seq {
            Some(seq) => seq,
            None => {
                let seq = resume_seq(&[self.inner.decisions_path.as_path(), self.inner.events_path.as_path()])?;
                *next_seq = Some(seq);
                seq
            }
        };

        let mut line = render(seq).map_err(|e| AuditWriteError::Serialization(e.to_string()))?;
        line.push('\n');

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AuditWriteError::Io(format!("Failed to create log dir: {}", e)))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| AuditWriteError::Io(e.to_string()))?;
        file.write_all(line.as_bytes())
            .map_err(|e| AuditWriteError::Io(e.to_string()))?;
        file.flush().map_err(|e| AuditWriteError::Io(e.to_string()))?;

        *next_seq = Some(seq + 1);
        Ok(())
    }
}

/// One past the highest `seq` recorded in `paths`; 0 for a fresh session.
fn resume_seq(paths: &[&Path]) -> Result<u64, AuditWriteError> {
    let mut next = 0;
    for path in paths {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(AuditWriteError::Io(format!("Failed to read '{}': {}", path.display(), e))),
        };
        for line in content.lines() {
            let seq = serde_json::from_str::<serde_json::Value>(line)
                .ok()
                .and_then(|v| v.get("seq").and_then(|s| s.as_u64()));
            if let Some(seq) = seq {
                next = next.max(seq + 1);
            }
        }
    }
    Ok(next)
}

/// Error type for audit writes.
#[derive(Debug, thiserror::Error)]
pub enum AuditWriteError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}
