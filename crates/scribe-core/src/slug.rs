//! Session name derivation for report filenames.

use std::collections::BTreeSet;

use crate::session::SessionState;
use crate::types::TaskItem;

/// Maximum slug length in characters.
pub const SLUG_MAX_CHARS: usize = 50;

/// Slug used when nothing meaningful can be derived.
pub const FALLBACK_SLUG: &str = "session";

const MAX_PARTS: usize = 3;

/// Generic directory names that say nothing about what the session worked on.
const STRUCTURAL_SEGMENTS: &[&str] = &[
    "src", "lib", "app", "internal", "pkg", "cmd", "handler", "handlers", "components", "pages",
    "api", "services", "service", "utils", "util", "models", "model", "web", "frontend",
    "backend", "server", "client", "crates", "packages", "tests", "test", "docs", "public",
    "static", "routes", "core", "common", "shared", "views", "controllers",
];

/// Filler words skipped when naming a session from a task description.
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "into", "that", "this", "then", "than", "when", "where",
    "which", "should", "would", "could", "make", "need", "needs", "some", "all", "are", "was",
    "were", "has", "have", "our", "its", "via", "not", "but", "also", "each", "per",
];

/// Derive the slug for a session: from edited files, else from the first
/// pending task, else [`FALLBACK_SLUG`].
pub fn derive_slug(state: &SessionState) -> String {
    derive_slug_from(
        &state.edited_backend,
        &state.edited_frontend,
        &state.pending_tasks,
    )
}

pub fn derive_slug_from(
    backend: &BTreeSet<String>,
    frontend: &BTreeSet<String>,
    tasks: &[TaskItem],
) -> String {
    let mut parts: Vec<String> = Vec::new();
    for path in backend.iter().chain(frontend.iter()) {
        if parts.len() >= MAX_PARTS {
            break;
        }
        if let Some(name) = meaningful_segment(path) {
            if !parts.contains(&name) {
                parts.push(name);
            }
        }
    }

    if parts.is_empty() {
        if let Some(task) = tasks.first() {
            parts = task_words(&task.content);
        }
    }

    let slug = sanitize(&parts.join("-"));
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// First path segment that is not structural noise, with its type suffix removed.
/// Absolute paths (edits outside the project root) use the file name, since
/// their leading segments are home or volume directories.
fn meaningful_segment(path: &str) -> Option<String> {
    let normalized = path.replace('\\', "/");
    let (absolute, normalized) = match normalized.split_once(':') {
        // drive letter
        Some((drive, rest)) if drive.len() == 1 => (true, rest.to_string()),
        _ => (normalized.starts_with('/'), normalized),
    };
    let mut segments = normalized
        .split('/')
        .map(str::trim)
        .filter(|seg| !seg.is_empty() && *seg != "." && *seg != "..");
    let segment = if absolute {
        segments.next_back()
    } else {
        segments.find(|seg| !STRUCTURAL_SEGMENTS.contains(&seg.to_ascii_lowercase().as_str()))
    };
    segment.map(strip_suffix).filter(|name| !name.is_empty())
}

fn strip_suffix(segment: &str) -> String {
    match segment.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => segment.trim_start_matches('.').to_string(),
    }
}

fn task_words(content: &str) -> Vec<String> {
    content
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() > 2 && !STOPWORDS.contains(&w.as_str()))
        .take(MAX_PARTS)
        .collect()
}

/// Lowercase, map anything outside `[a-z0-9-]` to `-`, collapse runs, trim
/// dashes, cap at [`SLUG_MAX_CHARS`].
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.to_lowercase().chars() {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            '-'
        };
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    let trimmed: String = out.trim_matches('-').chars().take(SLUG_MAX_CHARS).collect();
    trimmed.trim_end_matches('-').to_string()
}
