use serde_json::Value;

use scribe_core::{HookEvent, TaskItem, ToolCall, ToolResult};

// ── Hook stdin parsing ──

pub(crate) fn parse_hook_stdin(stdin: &str) -> anyhow::Result<Value> {
    let val: Value = serde_json::from_str(stdin)?;
    Ok(val)
}

/// Get a string field from JSON, trying snake_case first then camelCase.
pub(crate) fn get_str(v: &Value, snake_key: &str) -> String {
    if let Some(s) = v.get(snake_key).and_then(|x| x.as_str()) {
        return s.to_string();
    }
    let camel = snake_to_camel(snake_key);
    v.get(&camel)
        .and_then(|x| x.as_str())
        .unwrap_or("")
        .to_string()
}

/// Get any field, snake_case first then camelCase.
fn get_value<'a>(v: &'a Value, snake_key: &str) -> Option<&'a Value> {
    v.get(snake_key)
        .or_else(|| v.get(snake_to_camel(snake_key)))
        .filter(|x| !x.is_null())
}

pub(crate) fn snake_to_camel(s: &str) -> String {
    let mut result = String::new();
    let mut capitalize_next = false;
    for ch in s.chars() {
        if ch == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            result.extend(ch.to_uppercase());
            capitalize_next = false;
        } else {
            result.push(ch);
        }
    }
    result
}

pub(crate) fn session_id(raw: &Value) -> Option<String> {
    Some(get_str(raw, "session_id")).filter(|s| !s.trim().is_empty())
}

// ── Hook → events ──

/// Translate one hook payload into the events it implies, in delivery order.
/// Unknown hooks yield nothing.
pub fn events_from_hook(raw: &Value) -> Vec<HookEvent> {
    let hook = get_str(raw, "hook_event_name");
    let session_id = session_id(raw);
    match hook.as_str() {
        "SessionStart" => match get_str(raw, "source").as_str() {
            "resume" | "compact" => vec![HookEvent::SessionResumed { session_id }],
            _ => vec![HookEvent::SessionStart { session_id }],
        },
        "UserPromptSubmit" => vec![HookEvent::PromptSubmitted {
            text: get_str(raw, "prompt"),
        }],
        "PreToolUse" => vec![HookEvent::ToolBefore(tool_call(raw))],
        "PostToolUse" => {
            let call = tool_call(raw).with_result(tool_result(raw));
            let mut events = Vec::with_capacity(2);
            let follow_up = if call.is_edit() {
                call.file_path().map(|path| HookEvent::ResourceEdited {
                    path: path.to_string(),
                })
            } else if call.tool == "TodoWrite" {
                Some(HookEvent::TasksUpdated {
                    tasks: parse_todos(&call.args),
                })
            } else {
                None
            };
            events.push(HookEvent::ToolAfter(call));
            events.extend(follow_up);
            events
        }
        "PostToolUseFailure" => {
            let error = Some(get_str(raw, "error"))
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| "tool failed".to_string());
            vec![HookEvent::ToolAfter(
                tool_call(raw).with_result(ToolResult::failed(error)),
            )]
        }
        "Stop" => vec![HookEvent::SessionIdle { session_id }],
        "Notification" if is_idle_notification(raw) => {
            vec![HookEvent::SessionIdle { session_id }]
        }
        "PreCompact" => vec![HookEvent::SessionCompacting { session_id }],
        "SessionEnd" => vec![HookEvent::SessionEnd { session_id }],
        _ => Vec::new(),
    }
}

fn tool_call(raw: &Value) -> ToolCall {
    let args = get_value(raw, "tool_input")
        .cloned()
        .unwrap_or_else(|| Value::Object(Default::default()));
    ToolCall::new(get_str(raw, "tool_name"), args)
}

/// Claude Code reports tool output either as a string or as an object
/// (`stdout`/`stderr` for Bash, structured data elsewhere).
fn tool_result(raw: &Value) -> ToolResult {
    let Some(resp) = get_value(raw, "tool_response") else {
        return ToolResult::default();
    };
    if let Some(s) = resp.as_str() {
        return ToolResult::ok(s);
    }
    let is_error = resp
        .get("is_error")
        .or_else(|| resp.get("isError"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let error = resp.get("error").and_then(Value::as_str).unwrap_or("");
    if !error.trim().is_empty() {
        return ToolResult::failed(error);
    }
    if is_error {
        let stderr = resp.get("stderr").and_then(Value::as_str).unwrap_or("");
        return ToolResult::failed(if stderr.trim().is_empty() {
            "tool reported an error"
        } else {
            stderr
        });
    }
    ToolResult {
        error: None,
        output: resp
            .get("stdout")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

fn parse_todos(args: &Value) -> Vec<TaskItem> {
    args.get("todos")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value::<TaskItem>(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

fn is_idle_notification(raw: &Value) -> bool {
    if get_str(raw, "notification_type") == "idle_prompt" {
        return true;
    }
    get_str(raw, "message")
        .to_ascii_lowercase()
        .contains("waiting for your input")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snake_to_camel_converts_correctly() {
        assert_eq!(snake_to_camel("hook_event_name"), "hookEventName");
        assert_eq!(snake_to_camel("session_id"), "sessionId");
        assert_eq!(snake_to_camel("tool_input"), "toolInput");
        assert_eq!(snake_to_camel("cwd"), "cwd");
    }

    #[test]
    fn get_str_accepts_both_cases() {
        assert_eq!(get_str(&json!({"session_id": "a"}), "session_id"), "a");
        assert_eq!(get_str(&json!({"sessionId": "b"}), "session_id"), "b");
        assert_eq!(get_str(&json!({}), "session_id"), "");
    }

    #[test]
    fn lifecycle_hooks_map_one_to_one() {
        let cases = [
            ("SessionStart", "session-start"),
            ("Stop", "session-idle"),
            ("PreCompact", "session-compacting"),
            ("SessionEnd", "session-end"),
        ];
        for (hook, kind) in cases {
            let events = events_from_hook(&json!({"hook_event_name": hook, "session_id": "s1"}));
            assert_eq!(events.len(), 1, "{hook}");
            assert_eq!(events[0].kind(), kind);
        }
    }

    #[test]
    fn session_start_source_decides_reset() {
        for source in ["startup", "clear"] {
            let events = events_from_hook(&json!({
                "hook_event_name": "SessionStart", "session_id": "s1", "source": source
            }));
            assert_eq!(events[0].kind(), "session-start", "{source}");
        }
        for source in ["resume", "compact"] {
            let events = events_from_hook(&json!({
                "hook_event_name": "SessionStart", "session_id": "s1", "source": source
            }));
            assert_eq!(
                events,
                vec![HookEvent::SessionResumed {
                    session_id: Some("s1".into())
                }],
                "{source}"
            );
        }
    }

    #[test]
    fn session_id_blank_is_none() {
        let events = events_from_hook(&json!({"hook_event_name": "SessionEnd", "session_id": ""}));
        assert_eq!(events, vec![HookEvent::SessionEnd { session_id: None }]);
    }

    #[test]
    fn prompt_submit_carries_text() {
        let events = events_from_hook(&json!({
            "hookEventName": "UserPromptSubmit",
            "prompt": "/session-notes"
        }));
        assert_eq!(
            events,
            vec![HookEvent::PromptSubmitted {
                text: "/session-notes".into()
            }]
        );
    }

    #[test]
    fn post_tool_use_edit_adds_resource_event() {
        let events = events_from_hook(&json!({
            "hook_event_name": "PostToolUse",
            "tool_name": "Edit",
            "tool_input": {"file_path": "/repo/src/a.rs", "old_string": "x", "new_string": "y"},
            "tool_response": {"filePath": "/repo/src/a.rs", "success": true}
        }));
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind(), "tool-after");
        assert_eq!(
            events[1],
            HookEvent::ResourceEdited {
                path: "/repo/src/a.rs".into()
            }
        );
    }

    #[test]
    fn post_tool_use_todo_write_adds_tasks() {
        let events = events_from_hook(&json!({
            "hook_event_name": "PostToolUse",
            "tool_name": "TodoWrite",
            "tool_input": {"todos": [
                {"content": "ship export", "status": "pending", "activeForm": "Shipping"},
                {"content": "write docs", "status": "completed", "priority": "low"},
                {"bogus": true}
            ]}
        }));
        let HookEvent::TasksUpdated { tasks } = &events[1] else {
            panic!("expected tasks, got {events:?}");
        };
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].priority.as_deref(), Some("low"));
    }

    #[test]
    fn post_tool_use_bash_output() {
        let events = events_from_hook(&json!({
            "hook_event_name": "PostToolUse",
            "tool_name": "Bash",
            "tool_input": {"command": "ls"},
            "tool_response": {"stdout": "a\nb", "stderr": "", "interrupted": false}
        }));
        let HookEvent::ToolAfter(call) = &events[0] else {
            panic!("expected tool-after");
        };
        assert_eq!(call.command(), Some("ls"));
        let result = call.result.as_ref().unwrap();
        assert!(!result.is_error());
        assert_eq!(result.output.as_deref(), Some("a\nb"));
    }

    #[test]
    fn post_tool_use_error_flag() {
        let events = events_from_hook(&json!({
            "hook_event_name": "PostToolUse",
            "tool_name": "Bash",
            "tool_input": {"command": "false"},
            "tool_response": {"is_error": true, "stderr": "boom"}
        }));
        let HookEvent::ToolAfter(call) = &events[0] else {
            panic!("expected tool-after");
        };
        assert_eq!(call.result.as_ref().unwrap().error.as_deref(), Some("boom"));
    }

    #[test]
    fn post_tool_use_failure_is_error() {
        let events = events_from_hook(&json!({
            "hook_event_name": "PostToolUseFailure",
            "tool_name": "Bash",
            "tool_input": {"command": "cargo build"},
            "error": "exit code 101"
        }));
        let HookEvent::ToolAfter(call) = &events[0] else {
            panic!("expected tool-after");
        };
        assert!(call.result.as_ref().unwrap().is_error());
    }

    #[test]
    fn notification_idle_only() {
        let idle = json!({"hook_event_name": "Notification", "message": "Claude is waiting for your input"});
        assert_eq!(events_from_hook(&idle).len(), 1);
        let perm = json!({"hook_event_name": "Notification", "message": "Claude needs your permission to use Bash"});
        assert!(events_from_hook(&perm).is_empty());
    }

    #[test]
    fn unknown_hook_yields_nothing() {
        assert!(events_from_hook(&json!({"hook_event_name": "SubagentStop"})).is_empty());
        assert!(events_from_hook(&json!({})).is_empty());
    }
}
