//! Per-session accumulator.
//!
//! `SessionState` is a plain owned value: every mutation takes `&mut self`, so
//! events must be applied one at a time by a single owner. There is no interior
//! locking. Mutations never fail; blank input is ignored.
//!
//! The serialized form is the cross-process state file. The first eight fields
//! (`count`, `editedBackend`, `editedFrontend`, `startedAt`, `docRelevantEdits`,
//! `errors`, `prompts`, `slashCommands`) are shared with single-shot hook
//! scripts; every field defaults so a minimal record still loads.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::detect::{detect_decision, DocWatch};
use crate::ring::RingBuffer;
use crate::types::*;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionState {
    #[serde(rename = "count")]
    pub tool_call_count: u64,
    pub edited_backend: BTreeSet<String>,
    pub edited_frontend: BTreeSet<String>,
    pub started_at: Option<String>,
    pub doc_relevant_edits: Vec<DocEdit>,
    pub errors: RingBuffer<ErrorEntry, ERROR_LOG_CAPACITY>,
    pub prompts: u64,
    pub slash_commands: Vec<String>,

    pub read_resources: BTreeSet<String>,
    pub written_resources: BTreeSet<String>,
    pub activity: RingBuffer<ActivityEntry, ACTIVITY_LOG_CAPACITY>,
    pub commands: RingBuffer<CommandEntry, COMMAND_LOG_CAPACITY>,
    pub decisions: RingBuffer<DecisionSignal, DECISION_LOG_CAPACITY>,
    pub pending_tasks: Vec<TaskItem>,
    /// Edited since the last idle hygiene scan.
    pub unchecked_edits: BTreeSet<String>,
    pub report_written: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every field with its empty default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn record_tool_call(&mut self) {
        self.tool_call_count += 1;
        self.mark_started();
    }

    /// Set `started_at` to now if it is not set yet.
    pub fn mark_started(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(crate::now_rfc3339());
        }
    }

    /// Record an edited resource: suffix classification into the backend or
    /// frontend set, plus DocWatch bucketing (first matching prefix only).
    pub fn record_edit(&mut self, path: &str, docs: &DocWatch) {
        let path = docs.relative(path);
        if path.is_empty() {
            return;
        }
        match ResourceKind::classify(&path) {
            Some(ResourceKind::Backend) => {
                self.edited_backend.insert(path.clone());
            }
            Some(ResourceKind::Frontend) => {
                self.edited_frontend.insert(path.clone());
            }
            None => {}
        }
        if let Some(bucket) = docs.classify(&path) {
            if !self.doc_relevant_edits.iter().any(|d| d.path == path) {
                self.doc_relevant_edits.push(DocEdit {
                    bucket: bucket.to_string(),
                    path: path.clone(),
                });
            }
        }
        self.unchecked_edits.insert(path);
    }

    pub fn record_read(&mut self, path: &str) {
        insert_nonblank(&mut self.read_resources, path);
    }

    pub fn record_write(&mut self, path: &str) {
        insert_nonblank(&mut self.written_resources, path);
    }

    pub fn record_prompt(&mut self) {
        self.prompts += 1;
    }

    pub fn record_slash_command(&mut self, name: &str) {
        let name = name.trim();
        if !name.is_empty() {
            self.slash_commands.push(name.to_string());
        }
    }

    pub fn append_activity(&mut self, kind: &str, summary: &str) {
        if summary.trim().is_empty() {
            return;
        }
        self.activity.push(ActivityEntry {
            ts: crate::now_rfc3339(),
            kind: kind.to_string(),
            summary: summary.trim().to_string(),
        });
    }

    pub fn append_error(&mut self, context: &str, message: &str) {
        if message.trim().is_empty() {
            return;
        }
        self.errors.push(ErrorEntry {
            ts: crate::now_rfc3339(),
            context: context.to_string(),
            message: message.trim().to_string(),
        });
    }

    pub fn append_command(&mut self, command: &str, succeeded: bool) {
        if command.trim().is_empty() {
            return;
        }
        self.commands.push(CommandEntry {
            ts: crate::now_rfc3339(),
            command: command.trim().to_string(),
            succeeded,
        });
    }

    /// Append a decision signal. An identical (source, excerpt) pair already in
    /// the log is not added twice, so re-sent task lists do not flood the log.
    pub fn append_decision(&mut self, source: SignalSource, pattern: &str, excerpt: &str) {
        if excerpt.trim().is_empty() {
            return;
        }
        if self
            .decisions
            .iter()
            .any(|d| d.source == source && d.excerpt == excerpt)
        {
            return;
        }
        self.decisions.push(DecisionSignal {
            ts: crate::now_rfc3339(),
            source,
            pattern: pattern.to_string(),
            excerpt: excerpt.to_string(),
        });
    }

    /// Run DecisionWatch over `text`; record the first hit. Returns whether a
    /// pattern matched.
    pub fn observe_text(&mut self, source: SignalSource, text: &str) -> bool {
        match detect_decision(text) {
            Some(hit) => {
                self.append_decision(source, hit.pattern, &hit.excerpt);
                true
            }
            None => false,
        }
    }

    /// Replace the pending task list wholesale.
    pub fn set_tasks(&mut self, tasks: Vec<TaskItem>) {
        self.pending_tasks = tasks
            .into_iter()
            .filter(|t| !t.content.trim().is_empty())
            .collect();
    }

    /// Drain the set of edits not yet covered by a hygiene scan.
    pub fn take_unchecked_edits(&mut self) -> Vec<String> {
        std::mem::take(&mut self.unchecked_edits)
            .into_iter()
            .collect()
    }

    pub fn edited_count(&self) -> usize {
        self.edited_backend.len() + self.edited_frontend.len()
    }

    pub fn has_edits(&self) -> bool {
        self.edited_count() > 0
    }

    /// Documentation-relevant edits grouped by bucket, buckets in first-seen order.
    pub fn doc_edits_by_bucket(&self) -> Vec<(&str, Vec<&str>)> {
        let mut grouped: Vec<(&str, Vec<&str>)> = Vec::new();
        for edit in &self.doc_relevant_edits {
            match grouped.iter().position(|(b, _)| *b == edit.bucket) {
                Some(i) => grouped[i].1.push(edit.path.as_str()),
                None => grouped.push((edit.bucket.as_str(), vec![edit.path.as_str()])),
            }
        }
        grouped
    }
}

fn insert_nonblank(set: &mut BTreeSet<String>, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        set.insert(value.to_string());
    }
}
