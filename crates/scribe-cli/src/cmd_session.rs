use std::path::Path;

use scribe_bridge_claude::{CheckpointOutcome, SessionTarget};

/// `scribe report`
pub fn report(cwd: &Path, session: Option<&str>) -> anyhow::Result<()> {
    let target = SessionTarget::resolve(cwd, session);
    match target.report()? {
        CheckpointOutcome::Written(path) => {
            println!("{}", path.display());
            Ok(())
        }
        other => anyhow::bail!("{}", other.message()),
    }
}

/// `scribe status`
pub fn status(cwd: &Path, session: Option<&str>, json: bool) -> anyhow::Result<()> {
    let status = SessionTarget::resolve(cwd, session).status();
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Session: {}", status.session);
    println!("Project: {}", status.project_root);
    println!(
        "Started: {}",
        status.started_at.as_deref().unwrap_or("(not started)")
    );
    println!("Tool calls: {}", status.tool_calls);
    println!("Prompts: {}", status.prompts);
    println!(
        "Edited: {} backend, {} frontend ({} doc-relevant)",
        status.edited_backend, status.edited_frontend, status.doc_relevant_edits
    );
    println!("Errors: {}", status.errors);
    println!("Decision signals: {}", status.decisions);
    println!("Open tasks: {}", status.pending_tasks);
    match &status.gate_reason {
        None => println!("Checkpoint gate: open"),
        Some(reason) => println!("Checkpoint gate: closed ({reason})"),
    }
    println!(
        "Latest report: {}",
        status.latest_report.as_deref().unwrap_or("(none)")
    );
    Ok(())
}

/// `scribe reset`
pub fn reset(cwd: &Path, session: Option<&str>) -> anyhow::Result<()> {
    let target = SessionTarget::resolve(cwd, session);
    target.reset();
    println!("Reset session {}", target.key());
    Ok(())
}
