pub mod detect;
pub mod event;
pub mod ring;
pub mod session;
pub mod slug;
pub mod types;

pub use event::{HookEvent, ToolCall, ToolResult};
pub use ring::RingBuffer;
pub use session::SessionState;
pub use types::*;

/// Current UTC time as an RFC 3339 string (the timestamp format used in all logs).
pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

/// Truncate to at most `max_chars` characters, appending `…` when cut.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some(_) => {
            let keep: String = s.chars().take(max_chars.saturating_sub(1)).collect();
            format!("{keep}\u{2026}")
        }
    }
}
