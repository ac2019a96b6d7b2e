//! Stateless classifiers: DocWatch (path prefixes) and DecisionWatch (regex).
//!
//! Both walk an ordered list and stop at the first hit.

use std::sync::LazyLock;

use regex::Regex;

// ── DocWatch ──

/// Prefixes flagged as documentation-relevant when no config overrides them.
pub const DEFAULT_DOC_PREFIXES: &[&str] = &[
    "docs/",
    "api/",
    "migrations/",
    "internal/handler/",
    "internal/model/",
    "openapi",
    "README",
];

/// Prefix classifier for documentation-relevant edits.
#[derive(Debug, Clone)]
pub struct DocWatch {
    root: String,
    prefixes: Vec<String>,
}

impl DocWatch {
    /// `root` is stripped from incoming paths before matching.
    pub fn new(root: impl Into<String>, prefixes: Vec<String>) -> Self {
        Self {
            root: normalize_separators(&root.into()),
            prefixes,
        }
    }

    pub fn with_defaults(root: impl Into<String>) -> Self {
        Self::new(
            root,
            DEFAULT_DOC_PREFIXES.iter().map(|p| p.to_string()).collect(),
        )
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Express `path` relative to the project root with forward slashes.
    /// Paths outside the root are returned normalized but otherwise unchanged.
    pub fn relative(&self, path: &str) -> String {
        let normalized = normalize_separators(path);
        let root = self.root.trim_end_matches('/');
        let stripped = if !root.is_empty() {
            normalized
                .strip_prefix(root)
                .filter(|rest| rest.is_empty() || rest.starts_with('/'))
                .unwrap_or(&normalized)
        } else {
            &normalized
        };
        let stripped = stripped.trim_start_matches('/');
        stripped
            .strip_prefix("./")
            .unwrap_or(stripped)
            .to_string()
    }

    /// First configured prefix the (root-relative) path starts with.
    pub fn classify(&self, path: &str) -> Option<&str> {
        let rel = self.relative(path);
        if rel.is_empty() {
            return None;
        }
        self.prefixes
            .iter()
            .find(|prefix| !prefix.is_empty() && rel.starts_with(prefix.as_str()))
            .map(String::as_str)
    }
}

fn normalize_separators(path: &str) -> String {
    path.trim().replace('\\', "/")
}

// ── DecisionWatch ──

/// Texts shorter than this (after trimming) are never scanned.
pub const DECISION_MIN_CHARS: usize = 10;

/// Maximum excerpt length stored for a decision signal.
pub const DECISION_EXCERPT_MAX_CHARS: usize = 160;

/// Ordered decision-language patterns; the first match wins.
static DECISION_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"(?i)\bdecided\s+(to|on|against)\b").unwrap(), "decided"),
        (Regex::new(r"(?i)\bdefer(red|ring|s)?\b").unwrap(), "deferred"),
        (Regex::new(r"(?i)\bpromot(e|ed|es|ing)\b").unwrap(), "promoted"),
        (Regex::new(r"(?i)\binstead\s+of\b").unwrap(), "instead-of"),
        (Regex::new(r"(?i)\bout\s+of\s+scope\b").unwrap(), "out-of-scope"),
        (Regex::new(r"(?i)\bphase\s*\d+\b").unwrap(), "phase"),
        (Regex::new(r"(?i)\bpostpon(e|ed|ing)\b").unwrap(), "postponed"),
        (
            Regex::new(r"(?i)\b(going\s+with|chose|opted\s+(for|to))\b").unwrap(),
            "chose",
        ),
        (
            Regex::new(r"(?i)\bwon'?t\s+(do|fix|implement|support)\b").unwrap(),
            "wont",
        ),
        (Regex::new(r"(?i)\btrade-?offs?\b").unwrap(), "trade-off"),
    ]
});

/// A decision-language hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionMatch {
    pub pattern: &'static str,
    pub excerpt: String,
}

/// Scan `text` for decision language. Returns the first matching pattern only.
pub fn detect_decision(text: &str) -> Option<DecisionMatch> {
    let trimmed = text.trim();
    if trimmed.chars().count() < DECISION_MIN_CHARS {
        return None;
    }
    DECISION_PATTERNS
        .iter()
        .find(|(re, _)| re.is_match(trimmed))
        .map(|(_, label)| DecisionMatch {
            pattern: *label,
            excerpt: excerpt(trimmed),
        })
}

fn excerpt(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    crate::truncate_chars(&collapsed, DECISION_EXCERPT_MAX_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watch(prefixes: &[&str]) -> DocWatch {
        DocWatch::new(
            "/repo",
            prefixes.iter().map(|p| p.to_string()).collect(),
        )
    }

    #[test]
    fn doc_watch_strips_root() {
        let w = watch(&["docs/"]);
        assert_eq!(w.relative("/repo/docs/a.md"), "docs/a.md");
        assert_eq!(w.relative("./docs/a.md"), "docs/a.md");
        assert_eq!(w.relative("docs/a.md"), "docs/a.md");
        assert_eq!(w.classify("/repo/docs/a.md"), Some("docs/"));
    }

    #[test]
    fn doc_watch_does_not_strip_sibling_root() {
        let w = watch(&["docs/"]);
        assert_eq!(w.relative("/repository/docs/a.md"), "repository/docs/a.md");
        assert_eq!(w.classify("/repository/docs/a.md"), None);
    }

    #[test]
    fn doc_watch_first_prefix_wins() {
        let w = watch(&["internal/", "internal/handler/"]);
        assert_eq!(
            w.classify("/repo/internal/handler/item.go"),
            Some("internal/")
        );
        let w = watch(&["internal/handler/", "internal/"]);
        assert_eq!(
            w.classify("/repo/internal/handler/item.go"),
            Some("internal/handler/")
        );
    }

    #[test]
    fn doc_watch_windows_separators() {
        let w = DocWatch::new(r"C:\repo", vec!["docs/".into()]);
        assert_eq!(w.classify(r"C:\repo\docs\guide.md"), Some("docs/"));
    }

    #[test]
    fn doc_watch_no_match() {
        let w = DocWatch::with_defaults("/repo");
        assert_eq!(w.classify("/repo/src/main.rs"), None);
        assert_eq!(w.classify(""), None);
    }

    #[test]
    fn decision_ignores_short_text() {
        assert!(detect_decision("defer it").is_none());
        assert!(detect_decision("   phase 2   ").is_none());
    }

    #[test]
    fn decision_first_pattern_wins() {
        let m = detect_decision("we decided to defer the export feature to phase 2").unwrap();
        assert_eq!(m.pattern, "decided");
        let m = detect_decision("the export feature is deferred to phase 2").unwrap();
        assert_eq!(m.pattern, "deferred");
    }

    #[test]
    fn decision_patterns_cover_common_language() {
        for (text, label) in [
            ("promoted the cache to a shared module", "promoted"),
            ("use a channel instead of a mutex here", "instead-of"),
            ("billing export is out of scope for now", "out-of-scope"),
            ("this lands in Phase 3 of the rollout", "phase"),
            ("we postponed the migration until Friday", "postponed"),
            ("going with sqlite for the local index", "chose"),
            ("we won't implement retries in the client", "wont"),
            ("the trade-off is extra memory per session", "trade-off"),
        ] {
            let m = detect_decision(text).unwrap_or_else(|| panic!("no match: {text}"));
            assert_eq!(m.pattern, label, "{text}");
        }
    }

    #[test]
    fn decision_no_match_on_plain_text() {
        assert!(detect_decision("fix the failing unit test in parser").is_none());
    }

    #[test]
    fn decision_excerpt_collapsed_and_truncated() {
        let long = format!("we decided to   rewrite\nthe {}", "x".repeat(400));
        let m = detect_decision(&long).unwrap();
        assert!(m.excerpt.chars().count() <= DECISION_EXCERPT_MAX_CHARS);
        assert!(m.excerpt.starts_with("we decided to rewrite the"));
    }
}
