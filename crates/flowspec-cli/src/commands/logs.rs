//! `flowspec logs`: inspect recorded planning sessions.

use console::style;

use flowspec_core::audit::Decision;

use super::Workspace;

/// List recorded sessions, newest first.
pub async fn sessions(workspace: &Workspace) -> Result<(), String> {
    let sessions = workspace.reader().sessions().map_err(|e| e.to_string())?;
    if sessions.is_empty() {
        println!("No sessions under {}", workspace.log_dir.display());
        return Ok(());
    }
    for session in sessions {
        println!("{}", session);
    }
    Ok(())
}

/// Show a session's decisions (or events). Defaults to the newest session.
pub async fn show(workspace: &Workspace, session: Option<&str>, events: bool) -> Result<(), String> {
    let reader = workspace.reader();
    let session_id = match session {
        Some(id) => id.to_string(),
        None => reader
            .sessions()
            .map_err(|e| e.to_string())?
            .into_iter()
            .next()
            .ok_or_else(|| format!("No sessions under {}", workspace.log_dir.display()))?,
    };

    println!("Session {}", style(&session_id).bold());

    if events {
        let records = reader.events(&session_id).map_err(|e| e.to_string())?;
        for record in records {
            let payload = serde_json::Value::Object(record.payload);
            let kind = serde_json::to_value(record.kind).map_err(|e| e.to_string())?;
            println!(
                "  {:>3} {} {} {}",
                record.seq,
                record.timestamp.format("%H:%M:%S"),
                kind.as_str().unwrap_or_default(),
                payload
            );
        }
        return Ok(());
    }

    let records = reader.decisions(&session_id).map_err(|e| e.to_string())?;
    if records.is_empty() {
        println!("  (no decisions)");
    }
    for record in records {
        let marker = match record.decision {
            Decision::Executed => style("executed").green(),
            Decision::Skipped => style("skipped ").dim(),
        };
        println!(
            "  {:>3} {} {}#{} {} {}",
            record.seq,
            marker,
            record.custom_workflow,
            record.step + 1,
            record.workflow_name,
            record.reason.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
