//! Audit log: session-scoped, append-only decision and event records.
//!
//! - `DecisionRecord`: one per evaluated step: executed or skipped, and why
//! - `EventRecord`: orchestration-level trace (run start/end, step start/end)
//! - `LogLayout`: where a session's two JSONL files live
//! - `AuditLogger`: append-only writer handle, never fails the main flow
//! - `AuditReader`: read a session's records back
//!
//! Storage:
//! `<root>/decisions/session-{id}.jsonl` and `<root>/events/session-{id}.jsonl`

mod types;
mod writer;
mod reader;

pub use types::*;
pub use writer::*;
pub use reader::*;
