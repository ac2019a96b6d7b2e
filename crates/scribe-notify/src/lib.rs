use std::process::{Command, Stdio};

// ── Notification Events ──

/// Session events worth a desktop alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyEvent {
    /// The assistant stopped and is waiting for input.
    Idle {
        project: String,
        tool_calls: u64,
    },
    /// A checkpoint wrote a session-notes report.
    ReportWritten { project: String, filename: String },
}

impl NotifyEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            NotifyEvent::Idle { .. } => "idle",
            NotifyEvent::ReportWritten { .. } => "report_written",
        }
    }

    /// `(title, body)` shown in the alert.
    pub fn format(&self) -> (String, String) {
        match self {
            NotifyEvent::Idle {
                project,
                tool_calls,
            } => (
                format!("Waiting for input: {project}"),
                format!("Session idle after {tool_calls} tool calls"),
            ),
            NotifyEvent::ReportWritten { project, filename } => (
                format!("Session notes: {project}"),
                format!("Wrote {filename}"),
            ),
        }
    }
}

// ── Notifiers ──

/// Delivery seam for alerts. Implementations must not block and must not fail
/// the caller.
pub trait Notifier {
    fn notify(&self, event: &NotifyEvent);
}

/// Discards every alert.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: &NotifyEvent) {}
}

/// Spawns the platform notification tool and never waits for it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, event: &NotifyEvent) {
        let (title, body) = event.format();
        if let Err(e) = spawn_alert(&title, &body) {
            tracing::debug!(event = event.event_name(), error = %e, "desktop alert not sent");
        }
    }
}

fn spawn_alert(title: &str, body: &str) -> anyhow::Result<()> {
    let mut cmd = alert_command(title, body)?;
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(())
}

#[cfg(target_os = "macos")]
fn alert_command(title: &str, body: &str) -> anyhow::Result<Command> {
    let script = format!(
        "display notification \"{}\" with title \"{}\"",
        applescript_escape(body),
        applescript_escape(title)
    );
    let mut cmd = Command::new("osascript");
    cmd.arg("-e").arg(script);
    Ok(cmd)
}

#[cfg(all(unix, not(target_os = "macos")))]
fn alert_command(title: &str, body: &str) -> anyhow::Result<Command> {
    let mut cmd = Command::new("notify-send");
    cmd.arg("--app-name=scribe").arg(title).arg(body);
    Ok(cmd)
}

#[cfg(not(unix))]
fn alert_command(_title: &str, _body: &str) -> anyhow::Result<Command> {
    anyhow::bail!("desktop alerts are not supported on this platform")
}

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn applescript_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recording(RefCell<Vec<NotifyEvent>>);

    impl Notifier for Recording {
        fn notify(&self, event: &NotifyEvent) {
            self.0.borrow_mut().push(event.clone());
        }
    }

    #[test]
    fn event_names() {
        let idle = NotifyEvent::Idle {
            project: "p".into(),
            tool_calls: 3,
        };
        assert_eq!(idle.event_name(), "idle");
        let written = NotifyEvent::ReportWritten {
            project: "p".into(),
            filename: "f.md".into(),
        };
        assert_eq!(written.event_name(), "report_written");
    }

    #[test]
    fn format_idle() {
        let (title, body) = NotifyEvent::Idle {
            project: "shop".into(),
            tool_calls: 12,
        }
        .format();
        assert_eq!(title, "Waiting for input: shop");
        assert!(body.contains("12 tool calls"));
    }

    #[test]
    fn format_report_written() {
        let (_, body) = NotifyEvent::ReportWritten {
            project: "shop".into(),
            filename: "REPORT_20260101-000000_x.md".into(),
        }
        .format();
        assert_eq!(body, "Wrote REPORT_20260101-000000_x.md");
    }

    #[test]
    fn applescript_escape_quotes() {
        assert_eq!(applescript_escape(r#"say "hi" \ bye"#), r#"say \"hi\" \\ bye"#);
    }

    #[test]
    fn null_notifier_is_silent() {
        NullNotifier.notify(&NotifyEvent::Idle {
            project: "p".into(),
            tool_calls: 0,
        });
    }

    #[test]
    fn notifier_trait_object_records() {
        let rec = Recording::default();
        {
            let n: &dyn Notifier = &rec;
            n.notify(&NotifyEvent::Idle {
                project: "p".into(),
                tool_calls: 1,
            });
        }
        assert_eq!(rec.0.borrow().len(), 1);
    }
}
