use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;

use scribe_core::detect::DocWatch;
use scribe_core::slug::derive_slug;
use scribe_core::{truncate_chars, HookEvent, SessionState, SignalSource, TaskItem, ToolCall};
use scribe_notify::{DesktopNotifier, Notifier, NotifyEvent, NullNotifier};
use scribe_store::reports::{latest_report, write_report};
use scribe_store::state::session_key;
use scribe_store::{NotesConfig, Report, Store};
use time::OffsetDateTime;

use crate::git::{GitCli, GitSnapshot, GitSource};
use crate::hygiene;
use crate::parse::*;
use crate::redact::redact_secrets;
use crate::render::{self, Trigger};

/// Characters of a tool error kept in the error log.
const ERROR_MAX_CHARS: usize = 500;

/// Characters of a shell command kept in the command log.
const COMMAND_MAX_CHARS: usize = 200;

/// Characters of a prompt kept in the activity log.
const PROMPT_ACTIVITY_MAX_CHARS: usize = 100;

// ── Hook Result ──

/// Result from a hook dispatch.
///
/// - `stdout`: JSON string to print to stdout (consumed by Claude Code)
/// - `stderr`: warning message to print to stderr (shown to user, exit 1)
#[derive(Debug, Default, Clone)]
pub struct HookResult {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

impl HookResult {
    pub fn output(stdout: String) -> Self {
        Self {
            stdout: Some(stdout),
            stderr: None,
        }
    }

    pub fn warning(msg: String) -> Self {
        Self {
            stdout: None,
            stderr: Some(msg),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

// ── Replies and outcomes ──

/// What a single event asks to show the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Reply {
    #[default]
    None,
    /// Injected into the assistant's context.
    Context(String),
    /// Shown to the user.
    Message(String),
    /// Shown to the user on stderr; the hook exits non-zero.
    Warning(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyWritten,
    TooFewToolCalls { count: u64, min: u64 },
    NoEdits,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyWritten => f.write_str("already written this session"),
            SkipReason::TooFewToolCalls { count, min } => {
                write!(f, "only {count} tool calls so far (threshold {min})")
            }
            SkipReason::NoEdits => f.write_str("no files edited"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointOutcome {
    Written(PathBuf),
    Skipped(SkipReason),
    Failed(String),
}

impl CheckpointOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, CheckpointOutcome::Written(_))
    }

    pub fn message(&self) -> String {
        match self {
            CheckpointOutcome::Written(path) => {
                format!("Session notes written to {}", path.display())
            }
            CheckpointOutcome::Skipped(reason) => format!("Session notes skipped: {reason}"),
            CheckpointOutcome::Failed(err) => format!("Session notes not written: {err}"),
        }
    }
}

/// Substantial-work gate for automatic checkpoints.
pub fn gate(state: &SessionState, config: &NotesConfig) -> Result<(), SkipReason> {
    if state.report_written {
        return Err(SkipReason::AlreadyWritten);
    }
    if state.tool_call_count < config.min_tool_calls {
        return Err(SkipReason::TooFewToolCalls {
            count: state.tool_call_count,
            min: config.min_tool_calls,
        });
    }
    if !state.has_edits() {
        return Err(SkipReason::NoEdits);
    }
    Ok(())
}

// ── Dispatcher ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Active,
    Idle,
    Compacting,
    Terminated,
}

/// One handler per event kind.
pub trait SessionHooks {
    fn on_session_start(&mut self) -> Reply;
    fn on_session_resumed(&mut self) -> Reply;
    fn on_session_idle(&mut self) -> Reply;
    fn on_session_compacting(&mut self) -> Reply;
    fn on_session_end(&mut self) -> Reply;
    fn on_tool_before(&mut self, call: &ToolCall) -> Reply;
    fn on_tool_after(&mut self, call: &ToolCall) -> Reply;
    fn on_resource_edited(&mut self, path: &str) -> Reply;
    fn on_tasks_updated(&mut self, tasks: Vec<TaskItem>) -> Reply;
    fn on_prompt_submitted(&mut self, text: &str) -> Reply;
}

/// Sole owner of a session's state. Events are applied one at a time through
/// `&mut self`.
pub struct Dispatcher {
    state: SessionState,
    phase: SessionPhase,
    config: NotesConfig,
    docs: DocWatch,
    root: PathBuf,
    git: Box<dyn GitSource>,
    notifier: Box<dyn Notifier>,
}

impl Dispatcher {
    /// Dispatcher over `state` for the project at `root`, with the real git
    /// collector and the notifier `config` asks for.
    pub fn new(root: impl Into<PathBuf>, config: NotesConfig, state: SessionState) -> Self {
        let root = root.into();
        let docs = DocWatch::new(root.to_string_lossy(), config.doc_prefixes.clone());
        let git: Box<dyn GitSource> = Box::new(GitCli::new(&root, config.git_timeout));
        let notifier: Box<dyn Notifier> = if config.notify {
            Box::new(DesktopNotifier)
        } else {
            Box::new(NullNotifier)
        };
        let phase = if state.started_at.is_some() || state.tool_call_count > 0 {
            SessionPhase::Active
        } else {
            SessionPhase::Uninitialized
        };
        Self {
            state,
            phase,
            config,
            docs,
            root,
            git,
            notifier,
        }
    }

    pub fn with_git(mut self, git: Box<dyn GitSource>) -> Self {
        self.git = git;
        self
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Route one event to its handler.
    pub fn handle(&mut self, event: HookEvent) -> Reply {
        tracing::debug!(kind = event.kind(), "dispatch");
        match event {
            HookEvent::SessionStart { .. } => self.on_session_start(),
            HookEvent::SessionResumed { .. } => self.on_session_resumed(),
            HookEvent::SessionIdle { .. } => self.on_session_idle(),
            HookEvent::SessionCompacting { .. } => self.on_session_compacting(),
            HookEvent::SessionEnd { .. } => self.on_session_end(),
            HookEvent::ToolBefore(call) => self.on_tool_before(&call),
            HookEvent::ToolAfter(call) => self.on_tool_after(&call),
            HookEvent::ResourceEdited { path } => self.on_resource_edited(&path),
            HookEvent::TasksUpdated { tasks } => self.on_tasks_updated(tasks),
            HookEvent::PromptSubmitted { text } => self.on_prompt_submitted(&text),
        }
    }

    /// Apply every event from `rx` in arrival order until all senders hang up.
    pub fn drain(&mut self, rx: Receiver<HookEvent>) -> Vec<Reply> {
        rx.iter().map(|event| self.handle(event)).collect()
    }

    /// Render and persist a report. Automatic checkpoints go through [`gate`];
    /// manual ones always write.
    pub fn checkpoint(&mut self, trigger: Trigger) -> CheckpointOutcome {
        if trigger == Trigger::Compaction {
            if let Err(reason) = gate(&self.state, &self.config) {
                tracing::info!(%reason, "checkpoint skipped");
                return CheckpointOutcome::Skipped(reason);
            }
        }

        let now = OffsetDateTime::now_utc();
        let snapshot = GitSnapshot::collect(self.git.as_ref());
        let body = render::render_notes(&self.state, &snapshot, trigger, now);
        let report = Report::new(now, &derive_slug(&self.state), body);

        match write_report(&self.config.notes_dir, &report, self.config.retention) {
            Ok(outcome) => {
                self.state.report_written = true;
                tracing::info!(
                    path = %outcome.path.display(),
                    pruned = outcome.pruned.len(),
                    %trigger,
                    "session notes written"
                );
                let filename = outcome
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or(report.filename);
                self.notifier.notify(&NotifyEvent::ReportWritten {
                    project: self.project_name(),
                    filename,
                });
                CheckpointOutcome::Written(outcome.path)
            }
            Err(e) => {
                tracing::warn!(error = %e, "session notes not written");
                CheckpointOutcome::Failed(e.to_string())
            }
        }
    }

    fn activate(&mut self) {
        self.phase = SessionPhase::Active;
    }

    fn continuity_hint(&self) -> Reply {
        match latest_report(&self.config.notes_dir) {
            Some(path) => Reply::Context(format!(
                "Notes from the previous session: {}\nRead them to pick up where that session left off.",
                path.display()
            )),
            None => Reply::None,
        }
    }

    fn project_name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.root.display().to_string())
    }
}

impl SessionHooks for Dispatcher {
    fn on_session_start(&mut self) -> Reply {
        self.state.reset();
        self.activate();
        self.continuity_hint()
    }

    fn on_session_resumed(&mut self) -> Reply {
        self.activate();
        self.state.mark_started();
        self.continuity_hint()
    }

    fn on_session_idle(&mut self) -> Reply {
        self.phase = SessionPhase::Idle;
        let edits = self.state.take_unchecked_edits();
        let findings = hygiene::scan(&self.root, &edits);
        self.notifier.notify(&NotifyEvent::Idle {
            project: self.project_name(),
            tool_calls: self.state.tool_call_count,
        });
        match hygiene::format_findings(&findings) {
            Some(msg) => Reply::Message(msg),
            None => Reply::None,
        }
    }

    fn on_session_compacting(&mut self) -> Reply {
        self.phase = SessionPhase::Compacting;
        let outcome = self.checkpoint(Trigger::Compaction);
        self.phase = SessionPhase::Active;
        outcome_reply(outcome, Reply::Message)
    }

    fn on_session_end(&mut self) -> Reply {
        self.state.reset();
        self.phase = SessionPhase::Terminated;
        Reply::None
    }

    fn on_tool_before(&mut self, _call: &ToolCall) -> Reply {
        self.activate();
        self.state.mark_started();
        Reply::None
    }

    fn on_tool_after(&mut self, call: &ToolCall) -> Reply {
        self.activate();
        self.state.record_tool_call();

        let summary = redact_secrets(&call.summary());
        self.state.append_activity("tool", &summary);

        if let Some(path) = call.file_path() {
            match call.tool.as_str() {
                "Read" => self.state.record_read(&self.docs.relative(path)),
                "Write" => self.state.record_write(&self.docs.relative(path)),
                _ => {}
            }
        }

        let error = call
            .result
            .as_ref()
            .filter(|r| r.is_error())
            .and_then(|r| r.error.as_deref());
        if let Some(cmd) = call.command() {
            let cmd = redact_secrets(&truncate_chars(cmd, COMMAND_MAX_CHARS));
            self.state.append_command(&cmd, error.is_none());
        }
        if let Some(err) = error {
            let err = redact_secrets(&truncate_chars(err, ERROR_MAX_CHARS));
            self.state.append_error(&call.tool, &err);
        }

        self.state.observe_text(SignalSource::Tool, &summary);
        Reply::None
    }

    fn on_resource_edited(&mut self, path: &str) -> Reply {
        self.activate();
        self.state.record_edit(path, &self.docs);
        Reply::None
    }

    fn on_tasks_updated(&mut self, tasks: Vec<TaskItem>) -> Reply {
        self.activate();
        for task in &tasks {
            self.state
                .observe_text(SignalSource::Task, &redact_secrets(&task.content));
        }
        self.state.set_tasks(tasks);
        Reply::None
    }

    fn on_prompt_submitted(&mut self, text: &str) -> Reply {
        self.activate();
        self.state.record_prompt();
        let text = text.trim();
        if text.is_empty() {
            return Reply::None;
        }
        let first = text.split_whitespace().next().unwrap_or("");
        if first.starts_with('/') {
            self.state.record_slash_command(first);
        }

        let clean = redact_secrets(text);
        self.state.append_activity(
            "prompt",
            &truncate_chars(&clean, PROMPT_ACTIVITY_MAX_CHARS),
        );
        self.state.observe_text(SignalSource::Prompt, &clean);

        if first == self.config.trigger_command {
            let outcome = self.checkpoint(Trigger::Manual);
            return outcome_reply(outcome, Reply::Context);
        }
        Reply::None
    }
}

/// Failed writes become warnings; everything else uses `ok`.
fn outcome_reply(outcome: CheckpointOutcome, ok: fn(String) -> Reply) -> Reply {
    match outcome {
        CheckpointOutcome::Failed(_) => Reply::Warning(outcome.message()),
        _ => ok(outcome.message()),
    }
}

// ── Hook dispatch ──

/// Hooks whose output schema accepts `hookSpecificOutput.additionalContext`.
const CONTEXT_HOOKS: &[&str] = &["SessionStart", "UserPromptSubmit", "PreToolUse", "PostToolUse"];

/// Main hook entrypoint: parse stdin, apply the implied events to the
/// session's persisted state, and render the host reply.
pub fn hook_entrypoint_from_stdin(stdin: &str) -> anyhow::Result<HookResult> {
    run_hook(stdin, &Store::open_default(), |root, config| {
        Box::new(GitCli::new(root, config.git_timeout))
    })
}

pub(crate) fn run_hook<F>(stdin: &str, store: &Store, make_git: F) -> anyhow::Result<HookResult>
where
    F: FnOnce(&Path, &NotesConfig) -> Box<dyn GitSource>,
{
    if stdin.trim().is_empty() {
        return Ok(HookResult::empty());
    }
    let raw = parse_hook_stdin(stdin)?;
    let hook = get_str(&raw, "hook_event_name");
    let events = events_from_hook(&raw);
    if events.is_empty() {
        tracing::debug!(hook = %hook, "hook ignored");
        return Ok(HookResult::empty());
    }

    let root = resolve_root(&get_str(&raw, "cwd"));
    let project_id = scribe_store::project_id(&root);
    let key = session_key(session_id(&raw).as_deref());
    let config = NotesConfig::load(&root);
    let git = make_git(&root, &config);
    let state = store.load_state(&project_id, &key);

    let mut dispatcher = Dispatcher::new(&root, config, state).with_git(git);
    let replies: Vec<Reply> = events.into_iter().map(|e| dispatcher.handle(e)).collect();

    if dispatcher.phase() == SessionPhase::Terminated {
        store.remove_state(&project_id, &key);
    } else if let Err(e) = store.save_state(&project_id, &key, dispatcher.state()) {
        tracing::warn!(error = %e, "session state not saved");
    }

    render_hook_output(&hook, &replies)
}

pub(crate) fn resolve_root(cwd: &str) -> PathBuf {
    let cwd = if cwd.is_empty() {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    } else {
        PathBuf::from(cwd)
    };
    scribe_store::find_root(&cwd)
}

fn render_hook_output(hook: &str, replies: &[Reply]) -> anyhow::Result<HookResult> {
    let mut contexts: Vec<&str> = Vec::new();
    let mut messages: Vec<&str> = Vec::new();
    let mut warnings: Vec<&str> = Vec::new();
    let accepts_context = CONTEXT_HOOKS.contains(&hook);
    for reply in replies {
        match reply {
            Reply::None => {}
            Reply::Context(c) if accepts_context => contexts.push(c),
            Reply::Context(c) | Reply::Message(c) => messages.push(c),
            Reply::Warning(w) => warnings.push(w),
        }
    }
    if !warnings.is_empty() {
        // stdout is ignored on a non-zero exit, so everything goes to stderr.
        messages.extend(warnings);
        return Ok(HookResult::warning(messages.join("\n")));
    }
    if contexts.is_empty() && messages.is_empty() {
        return Ok(HookResult::empty());
    }

    let mut output = serde_json::json!({});
    if !messages.is_empty() {
        output["systemMessage"] = serde_json::Value::String(messages.join("\n"));
    }
    if !contexts.is_empty() {
        output["hookSpecificOutput"] = serde_json::json!({
            "hookEventName": hook,
            "additionalContext": render::wrap_boundary(&contexts.join("\n\n")),
        });
    }
    Ok(HookResult::output(serde_json::to_string(&output)?))
}
