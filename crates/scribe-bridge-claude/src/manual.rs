//! Out-of-hook access to a session: on-demand reports, status, reset.

use std::path::{Path, PathBuf};

use serde::Serialize;

use scribe_core::SessionState;
use scribe_store::reports::latest_report;
use scribe_store::state::session_key;
use scribe_store::{NotesConfig, Store};

use crate::dispatch::{gate, CheckpointOutcome, Dispatcher};
use crate::git::{GitCli, GitSource};
use crate::render::Trigger;

/// A resolved session: project root, store location, and state key.
#[derive(Debug, Clone)]
pub struct SessionTarget {
    store: Store,
    root: PathBuf,
    project_id: String,
    key: String,
    config: NotesConfig,
}

impl SessionTarget {
    /// Resolve against the default store. Without an explicit session id the
    /// most recently active session of the project is used.
    pub fn resolve(cwd: &Path, session: Option<&str>) -> Self {
        Self::resolve_in(Store::open_default(), cwd, session)
    }

    pub fn resolve_in(store: Store, cwd: &Path, session: Option<&str>) -> Self {
        let root = scribe_store::find_root(cwd);
        let project_id = scribe_store::project_id(&root);
        let key = match session {
            Some(id) => session_key(Some(id)),
            None => store
                .latest_session_key(&project_id)
                .unwrap_or_else(|| session_key(None)),
        };
        let config = NotesConfig::load(&root);
        Self {
            store,
            root,
            project_id,
            key,
            config,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &NotesConfig {
        &self.config
    }

    pub fn load(&self) -> SessionState {
        self.store.load_state(&self.project_id, &self.key)
    }

    /// Write a report now, regardless of the gate.
    pub fn report(&self) -> anyhow::Result<CheckpointOutcome> {
        let git = GitCli::new(&self.root, self.config.git_timeout);
        self.report_with(Box::new(git))
    }

    pub fn report_with(&self, git: Box<dyn GitSource>) -> anyhow::Result<CheckpointOutcome> {
        let mut dispatcher =
            Dispatcher::new(&self.root, self.config.clone(), self.load()).with_git(git);
        let outcome = dispatcher.checkpoint(Trigger::Manual);
        if outcome.is_written() {
            self.store
                .save_state(&self.project_id, &self.key, dispatcher.state())?;
        }
        Ok(outcome)
    }

    pub fn status(&self) -> SessionStatus {
        let state = self.load();
        let gate = gate(&state, &self.config);
        SessionStatus {
            session: self.key.clone(),
            project_root: self.root.display().to_string(),
            started_at: state.started_at.clone(),
            tool_calls: state.tool_call_count,
            prompts: state.prompts,
            edited_backend: state.edited_backend.len(),
            edited_frontend: state.edited_frontend.len(),
            doc_relevant_edits: state.doc_relevant_edits.len(),
            errors: state.errors.len(),
            decisions: state.decisions.len(),
            pending_tasks: state.pending_tasks.iter().filter(|t| !t.is_done()).count(),
            report_written: state.report_written,
            min_tool_calls: self.config.min_tool_calls,
            gate_open: gate.is_ok(),
            gate_reason: gate.err().map(|r| r.to_string()),
            notes_dir: self.config.notes_dir.display().to_string(),
            latest_report: latest_report(&self.config.notes_dir).map(|p| p.display().to_string()),
        }
    }

    /// Drop the session's state file.
    pub fn reset(&self) {
        self.store.remove_state(&self.project_id, &self.key);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub session: String,
    pub project_root: String,
    pub started_at: Option<String>,
    pub tool_calls: u64,
    pub prompts: u64,
    pub edited_backend: usize,
    pub edited_frontend: usize,
    pub doc_relevant_edits: usize,
    pub errors: usize,
    pub decisions: usize,
    pub pending_tasks: usize,
    pub report_written: bool,
    pub min_tool_calls: u64,
    pub gate_open: bool,
    pub gate_reason: Option<String>,
    pub notes_dir: String,
    pub latest_report: Option<String>,
}
