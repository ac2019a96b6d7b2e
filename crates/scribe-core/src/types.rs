use std::fmt;

use serde::{Deserialize, Serialize};

/// Activity log capacity.
pub const ACTIVITY_LOG_CAPACITY: usize = 100;
/// Error log capacity.
pub const ERROR_LOG_CAPACITY: usize = 20;
/// Command log capacity.
pub const COMMAND_LOG_CAPACITY: usize = 30;
/// Decision signal log capacity.
pub const DECISION_LOG_CAPACITY: usize = 20;

/// File suffixes counted as backend edits.
pub const BACKEND_SUFFIXES: &[&str] = &[
    ".go", ".rs", ".py", ".java", ".kt", ".rb", ".php", ".sql", ".proto", ".c", ".cc", ".cpp",
    ".h", ".cs",
];

/// File suffixes counted as frontend edits.
pub const FRONTEND_SUFFIXES: &[&str] = &[
    ".ts", ".tsx", ".js", ".jsx", ".mjs", ".vue", ".svelte", ".css", ".scss", ".sass", ".less",
    ".html",
];

/// Which edited-file set a resource belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Backend,
    Frontend,
}

impl ResourceKind {
    /// Classify a path by suffix. Returns `None` for files that are neither.
    pub fn classify(path: &str) -> Option<Self> {
        let lower = path.to_ascii_lowercase();
        if BACKEND_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
            Some(Self::Backend)
        } else if FRONTEND_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
            Some(Self::Frontend)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub ts: String,
    pub kind: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub ts: String,
    pub context: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEntry {
    pub ts: String,
    pub command: String,
    pub succeeded: bool,
}

/// Channel a decision signal was detected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalSource {
    Task,
    Tool,
    Prompt,
}

impl fmt::Display for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Task => "task",
            Self::Tool => "tool",
            Self::Prompt => "prompt",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionSignal {
    pub ts: String,
    pub source: SignalSource,
    /// Label of the pattern that matched.
    #[serde(default)]
    pub pattern: String,
    pub excerpt: String,
}

/// One entry of the host's task list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskItem {
    pub content: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

impl TaskItem {
    pub fn is_done(&self) -> bool {
        self.status == "completed"
    }
}

/// A documentation-relevant edit: the resource and the prefix bucket it fell into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocEdit {
    pub bucket: String,
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_backend_and_frontend() {
        assert_eq!(
            ResourceKind::classify("internal/handler/item.go"),
            Some(ResourceKind::Backend)
        );
        assert_eq!(
            ResourceKind::classify("web/src/App.TSX"),
            Some(ResourceKind::Frontend)
        );
        assert_eq!(ResourceKind::classify("README.md"), None);
    }

    #[test]
    fn signal_source_serializes_lowercase() {
        let json = serde_json::to_string(&SignalSource::Prompt).unwrap();
        assert_eq!(json, "\"prompt\"");
        assert_eq!(SignalSource::Task.to_string(), "task");
    }

    #[test]
    fn task_item_priority_is_optional() {
        let task: TaskItem =
            serde_json::from_str(r#"{"content":"Write docs","status":"pending"}"#).unwrap();
        assert!(task.priority.is_none());
        assert!(!task.is_done());
        let out = serde_json::to_string(&task).unwrap();
        assert!(!out.contains("priority"));
    }
}
