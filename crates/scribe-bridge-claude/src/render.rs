use std::fmt;

use scribe_core::SessionState;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::git::GitSnapshot;

/// Scribe context boundary start marker.
pub const BOUNDARY_START: &str = "<!-- scribe:start -->";

/// Scribe context boundary end marker.
pub const BOUNDARY_END: &str = "<!-- scribe:end -->";

/// Activity entries shown at the end of a report.
pub const RECENT_ACTIVITY_WINDOW: usize = 25;

/// Characters of an error message kept on its report line.
const ERROR_LINE_MAX_CHARS: usize = 300;

pub const NO_EDITS_PLACEHOLDER: &str = "No files edited this session";

/// Wrap context content with boundary markers so other plugins can find our block.
pub fn wrap_boundary(content: &str) -> String {
    format!("{BOUNDARY_START}\n{content}\n{BOUNDARY_END}")
}

/// What caused a report to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The host is about to compact the conversation.
    Compaction,
    /// The user asked for a report.
    Manual,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trigger::Compaction => "compaction",
            Trigger::Manual => "manual",
        })
    }
}

/// `<n>m` under an hour, `<h>h <m>m` from an hour on, `unknown` without a
/// (parseable) start time.
pub fn format_duration(started_at: Option<&str>, now: OffsetDateTime) -> String {
    let Some(started) = started_at.and_then(|s| OffsetDateTime::parse(s, &Rfc3339).ok()) else {
        return "unknown".to_string();
    };
    let minutes = (now - started).whole_minutes().max(0);
    if minutes < 60 {
        format!("{minutes}m")
    } else {
        format!("{}h {}m", minutes / 60, minutes % 60)
    }
}

/// Render the session-notes report. Pure: everything it needs is passed in.
pub fn render_notes(
    state: &SessionState,
    git: &GitSnapshot,
    trigger: Trigger,
    now: OffsetDateTime,
) -> String {
    let mut out = String::new();
    render_header(&mut out, state, trigger, now);
    render_git_state(&mut out, git);
    render_edited(&mut out, state);
    render_commits(&mut out, git);
    out.push_str("## Diff Summary\n\n");
    out.push_str(&format!("{}\n\n", git.diff_stat));
    render_doc_watch(&mut out, state);
    render_errors(&mut out, state);
    render_decisions(&mut out, state);
    render_slash_commands(&mut out, state);
    render_tasks(&mut out, state);
    render_activity(&mut out, state);
    format!("{}\n", out.trim_end())
}

fn render_header(out: &mut String, state: &SessionState, trigger: Trigger, now: OffsetDateTime) {
    let generated = now.format(&Rfc3339).unwrap_or_default();
    out.push_str("# Session Notes\n\n");
    out.push_str(&format!("- **Trigger:** {trigger}\n"));
    out.push_str(&format!("- **Generated:** {generated}\n"));
    out.push_str(&format!(
        "- **Duration:** {}\n",
        format_duration(state.started_at.as_deref(), now)
    ));
    out.push_str(&format!("- **Tool calls:** {}\n", state.tool_call_count));
    out.push_str(&format!(
        "- **Edited files:** {} backend, {} frontend\n\n",
        state.edited_backend.len(),
        state.edited_frontend.len()
    ));
}

fn render_git_state(out: &mut String, git: &GitSnapshot) {
    out.push_str("## Current Git State\n\n");
    out.push_str(&format!("- **Branch:** `{}`\n", git.branch));
    out.push_str(&format!("- **Working tree:** {}\n", git.status));
    for change in &git.changes {
        out.push_str(&format!("  - `{change}`\n"));
    }
    if !git.stashes.is_empty() {
        out.push_str(&format!("- **Stashes:** {}\n", git.stashes.len()));
        for stash in &git.stashes {
            out.push_str(&format!("  - {stash}\n"));
        }
    }
    out.push('\n');
}

fn render_edited(out: &mut String, state: &SessionState) {
    out.push_str("## Edited Files\n\n");
    if !state.has_edits() {
        out.push_str(NO_EDITS_PLACEHOLDER);
        out.push_str("\n\n");
        return;
    }
    for (label, files) in [
        ("Backend", &state.edited_backend),
        ("Frontend", &state.edited_frontend),
    ] {
        if files.is_empty() {
            continue;
        }
        out.push_str(&format!("### {label}\n\n"));
        for f in files {
            out.push_str(&format!("- `{f}`\n"));
        }
        out.push('\n');
    }
}

fn render_commits(out: &mut String, git: &GitSnapshot) {
    out.push_str("## Recent Commits\n\n```text\n");
    out.push_str(&git.log);
    out.push_str("\n```\n\n");
}

fn render_doc_watch(out: &mut String, state: &SessionState) {
    let grouped = state.doc_edits_by_bucket();
    if grouped.is_empty() {
        return;
    }
    out.push_str("## Documentation Watch\n\n");
    out.push_str("These edits touch documentation-relevant paths. Check the docs still match.\n\n");
    for (bucket, paths) in grouped {
        out.push_str(&format!("### `{bucket}`\n\n"));
        for p in paths {
            out.push_str(&format!("- `{p}`\n"));
        }
        out.push('\n');
    }
}

fn render_errors(out: &mut String, state: &SessionState) {
    if state.errors.is_empty() {
        return;
    }
    out.push_str("## Errors\n\n");
    for e in state.errors.iter() {
        let message = one_line(&e.message);
        out.push_str(&format!(
            "- {} **{}**: {}\n",
            e.ts,
            e.context,
            scribe_core::truncate_chars(&message, ERROR_LINE_MAX_CHARS)
        ));
    }
    out.push('\n');
}

fn render_decisions(out: &mut String, state: &SessionState) {
    if state.decisions.is_empty() {
        return;
    }
    out.push_str("## Decision Signals\n\n");
    for d in state.decisions.iter() {
        if d.pattern.is_empty() {
            out.push_str(&format!("- [{}] {}\n", d.source, d.excerpt));
        } else {
            out.push_str(&format!("- [{}] ({}) {}\n", d.source, d.pattern, d.excerpt));
        }
    }
    out.push('\n');
}

fn render_slash_commands(out: &mut String, state: &SessionState) {
    if state.slash_commands.is_empty() {
        return;
    }
    out.push_str("## Slash Commands\n\n");
    for c in &state.slash_commands {
        out.push_str(&format!("- `{c}`\n"));
    }
    out.push('\n');
}

fn render_tasks(out: &mut String, state: &SessionState) {
    if state.pending_tasks.is_empty() {
        return;
    }
    out.push_str("## Pending Tasks\n\n");
    for t in &state.pending_tasks {
        let mark = if t.is_done() { "x" } else { " " };
        match &t.priority {
            Some(p) if !p.is_empty() => {
                out.push_str(&format!("- [{mark}] {} ({p})\n", t.content))
            }
            _ => out.push_str(&format!("- [{mark}] {}\n", t.content)),
        }
    }
    out.push('\n');
}

fn render_activity(out: &mut String, state: &SessionState) {
    if state.activity.is_empty() {
        return;
    }
    out.push_str("## Recent Activity\n\n");
    for a in state.activity.last_n(RECENT_ACTIVITY_WINDOW) {
        out.push_str(&format!("- {} {}: {}\n", a.ts, a.kind, a.summary));
    }
    out.push('\n');
}

fn one_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
