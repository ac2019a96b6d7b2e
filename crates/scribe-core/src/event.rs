//! Inbound events delivered by the host runtime.

use serde_json::Value;

use crate::types::TaskItem;

/// Outcome payload attached to a finished tool invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolResult {
    pub error: Option<String>,
    pub output: Option<String>,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            error: None,
            output: Some(output.into()),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            output: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.trim().is_empty())
    }
}

/// A single tool invocation as seen by the before/after hooks.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub tool: String,
    pub args: Value,
    pub result: Option<ToolResult>,
}

/// Maximum characters of a tool argument kept in a summary.
const SUMMARY_ARG_MAX_CHARS: usize = 100;

impl ToolCall {
    pub fn new(tool: impl Into<String>, args: Value) -> Self {
        Self {
            tool: tool.into(),
            args,
            result: None,
        }
    }

    pub fn with_result(mut self, result: ToolResult) -> Self {
        self.result = Some(result);
        self
    }

    /// String argument by key, empty if missing.
    pub fn arg(&self, key: &str) -> &str {
        self.args.get(key).and_then(Value::as_str).unwrap_or("")
    }

    /// Target file of file-oriented tools.
    pub fn file_path(&self) -> Option<&str> {
        ["file_path", "notebook_path", "path"]
            .iter()
            .map(|k| self.arg(k))
            .find(|p| !p.is_empty())
    }

    /// Shell command for `Bash`-like tools.
    pub fn command(&self) -> Option<&str> {
        Some(self.arg("command")).filter(|c| !c.trim().is_empty())
    }

    pub fn is_edit(&self) -> bool {
        matches!(
            self.tool.as_str(),
            "Edit" | "Write" | "MultiEdit" | "NotebookEdit"
        )
    }

    /// One-line human summary: `"<tool>: <primary argument>"`.
    pub fn summary(&self) -> String {
        let detail = match self.tool.as_str() {
            "Bash" => self.arg("command").lines().next().unwrap_or(""),
            "Edit" | "Write" | "MultiEdit" | "Read" | "NotebookEdit" => {
                self.file_path().unwrap_or("")
            }
            "Grep" | "Glob" => self.arg("pattern"),
            "Task" => self.arg("description"),
            "WebFetch" => self.arg("url"),
            "WebSearch" => self.arg("query"),
            _ => "",
        };
        let detail = detail.trim();
        if detail.is_empty() {
            self.tool.clone()
        } else {
            format!(
                "{}: {}",
                self.tool,
                crate::truncate_chars(detail, SUMMARY_ARG_MAX_CHARS)
            )
        }
    }
}

/// Typed events, one variant per kind the host delivers.
#[derive(Debug, Clone, PartialEq)]
pub enum HookEvent {
    SessionStart { session_id: Option<String> },
    /// The host reopened an existing session (resume, or the restart after
    /// a compaction). Accumulated state carries over.
    SessionResumed { session_id: Option<String> },
    SessionIdle { session_id: Option<String> },
    SessionCompacting { session_id: Option<String> },
    SessionEnd { session_id: Option<String> },
    ToolBefore(ToolCall),
    ToolAfter(ToolCall),
    ResourceEdited { path: String },
    TasksUpdated { tasks: Vec<TaskItem> },
    PromptSubmitted { text: String },
}

impl HookEvent {
    /// Short kind name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SessionStart { .. } => "session-start",
            Self::SessionResumed { .. } => "session-resumed",
            Self::SessionIdle { .. } => "session-idle",
            Self::SessionCompacting { .. } => "session-compacting",
            Self::SessionEnd { .. } => "session-end",
            Self::ToolBefore(_) => "tool-before",
            Self::ToolAfter(_) => "tool-after",
            Self::ResourceEdited { .. } => "resource-edited",
            Self::TasksUpdated { .. } => "tasks-updated",
            Self::PromptSubmitted { .. } => "prompt-submitted",
        }
    }
}
