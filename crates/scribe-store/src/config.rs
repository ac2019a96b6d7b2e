//! Layered configuration: env var → `.scribe/config.json` → default.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use scribe_core::detect::DEFAULT_DOC_PREFIXES;

use crate::reports::DEFAULT_RETENTION;
use crate::WORKSPACE_DIR;

/// Default substantial-work threshold for checkpoint writes.
pub const DEFAULT_MIN_TOOL_CALLS: u64 = 50;

/// Prompt text that requests a report on demand.
pub const DEFAULT_TRIGGER_COMMAND: &str = "/session-notes";

/// Default per-call git timeout.
pub const DEFAULT_GIT_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, PartialEq)]
pub struct NotesConfig {
    /// Maximum number of report files kept.
    pub retention: usize,
    /// Absolute reports directory.
    pub notes_dir: PathBuf,
    pub min_tool_calls: u64,
    /// Ordered DocWatch prefixes.
    pub doc_prefixes: Vec<String>,
    pub trigger_command: String,
    pub notify: bool,
    pub git_timeout: Duration,
}

impl NotesConfig {
    /// Defaults for a project rooted at `root`.
    pub fn defaults(root: &Path) -> Self {
        Self {
            retention: DEFAULT_RETENTION,
            notes_dir: root.join(WORKSPACE_DIR).join("notes"),
            min_tool_calls: DEFAULT_MIN_TOOL_CALLS,
            doc_prefixes: DEFAULT_DOC_PREFIXES.iter().map(|p| p.to_string()).collect(),
            trigger_command: DEFAULT_TRIGGER_COMMAND.to_string(),
            notify: false,
            git_timeout: Duration::from_millis(DEFAULT_GIT_TIMEOUT_MS),
        }
    }

    /// Load from the process environment and `<root>/.scribe/config.json`.
    pub fn load(root: &Path) -> Self {
        let json = read_config_json(root);
        Self::from_sources(root, json.as_ref(), |key| std::env::var(key).ok())
    }

    /// Resolve every key from `env` first, then `json`, then the default.
    pub fn from_sources(
        root: &Path,
        json: Option<&serde_json::Value>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let mut cfg = Self::defaults(root);
        let lookup = |key: &str| json.and_then(|v| value_at(v, key));

        if let Some(n) = env("SCRIBE_NOTES_RETENTION")
            .and_then(|v| v.parse().ok())
            .or_else(|| lookup("notes.retention")?.as_u64().map(|v| v as usize))
        {
            cfg.retention = n;
        }
        if let Some(dir) = env("SCRIBE_NOTES_DIR")
            .filter(|v| !v.is_empty())
            .or_else(|| lookup("notes.dir")?.as_str().map(str::to_string))
        {
            let dir = PathBuf::from(dir);
            cfg.notes_dir = if dir.is_absolute() { dir } else { root.join(dir) };
        }
        if let Some(n) = env("SCRIBE_GATE_MIN_TOOL_CALLS")
            .and_then(|v| v.parse().ok())
            .or_else(|| lookup("gate.min_tool_calls")?.as_u64())
        {
            cfg.min_tool_calls = n;
        }
        if let Some(prefixes) = lookup("doc_watch.prefixes").and_then(|v| {
            v.as_array().map(|arr| {
                arr.iter()
                    .filter_map(|p| p.as_str())
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
        }) {
            cfg.doc_prefixes = prefixes;
        }
        if let Some(cmd) = env("SCRIBE_TRIGGER_COMMAND")
            .or_else(|| lookup("trigger.command")?.as_str().map(str::to_string))
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
        {
            cfg.trigger_command = cmd;
        }
        if let Some(on) = env("SCRIBE_NOTIFY")
            .map(|v| v != "0")
            .or_else(|| lookup("notify.enabled")?.as_bool())
        {
            cfg.notify = on;
        }
        if let Some(ms) = env("SCRIBE_GIT_TIMEOUT_MS")
            .and_then(|v| v.parse().ok())
            .or_else(|| lookup("git.timeout_ms")?.as_u64())
        {
            cfg.git_timeout = Duration::from_millis(ms);
        }
        cfg
    }
}

fn read_config_json(root: &Path) -> Option<serde_json::Value> {
    let path = root.join(WORKSPACE_DIR).join("config.json");
    let content = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&content) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config");
            None
        }
    }
}

/// Look up a dot-notation key (`"notes.retention"`) in a JSON object.
pub fn value_at<'a>(root: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
    let mut current = root;
    for part in key.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}
