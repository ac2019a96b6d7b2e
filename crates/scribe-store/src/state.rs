//! Session-scoped state files.
//!
//! One JSON file per session key at
//! `<store>/projects/<project_id>/state/session.<key>.json`.

use std::fs;
use std::path::PathBuf;

use scribe_core::SessionState;

use crate::{Store, StoreError};

/// Key used for state files: the session id (sanitized), or today's UTC date
/// when the host did not supply one.
pub fn session_key(session_id: Option<&str>) -> String {
    let cleaned: String = session_id
        .unwrap_or("")
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if cleaned.is_empty() {
        date_key()
    } else {
        cleaned
    }
}

fn date_key() -> String {
    let today = time::OffsetDateTime::now_utc().date();
    format!(
        "{:04}-{:02}-{:02}",
        today.year(),
        today.month() as u8,
        today.day()
    )
}

impl Store {
    pub fn state_path(&self, project_id: &str, key: &str) -> PathBuf {
        self.state_dir(project_id).join(format!("session.{key}.json"))
    }

    /// Load a session's state. Missing or unreadable files yield a fresh state.
    pub fn load_state(&self, project_id: &str, key: &str) -> SessionState {
        let path = self.state_path(project_id, key);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return SessionState::default(),
        };
        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "discarding corrupt state file");
                SessionState::default()
            }
        }
    }

    pub fn save_state(
        &self,
        project_id: &str,
        key: &str,
        state: &SessionState,
    ) -> Result<(), StoreError> {
        let path = self.state_path(project_id, key);
        let json = serde_json::to_vec_pretty(state)?;
        crate::write_atomic(&path, &json).map_err(|source| StoreError::Write { path, source })
    }

    /// Delete a session's state file. Missing files are not an error.
    pub fn remove_state(&self, project_id: &str, key: &str) {
        let _ = fs::remove_file(self.state_path(project_id, key));
    }

    /// Key of the most recently modified state file for a project.
    pub fn latest_session_key(&self, project_id: &str) -> Option<String> {
        let entries = fs::read_dir(self.state_dir(project_id)).ok()?;
        let mut best: Option<(std::time::SystemTime, String)> = None;
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(key) = name
                .strip_prefix("session.")
                .and_then(|s| s.strip_suffix(".json"))
            else {
                continue;
            };
            if key.is_empty() {
                continue;
            }
            let Ok(mtime) = entry.metadata().and_then(|m| m.modified()) else {
                continue;
            };
            if best.as_ref().map_or(true, |(t, _)| mtime > *t) {
                best = Some((mtime, key.to_string()));
            }
        }
        best.map(|(_, key)| key)
    }
}
