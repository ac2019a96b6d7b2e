//! Idle-time scan of freshly edited files for leftover debug output and
//! unresolved merge conflicts. Findings are shown to the user, never stored.

use std::fmt;
use std::fs;
use std::path::Path;

/// Files larger than this are skipped.
pub const MAX_SCAN_BYTES: u64 = 512 * 1024;

/// Findings reported per scan.
pub const MAX_FINDINGS: usize = 10;

/// Substring markers that apply to every file.
const MARKERS: &[&str] = &[
    "console.log(",
    "debugger;",
    "dbg!(",
    "fmt.Println(",
    "<<<<<<< ",
    ">>>>>>> ",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub path: String,
    pub line: usize,
    pub marker: &'static str,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.path, self.line, self.marker.trim())
    }
}

/// Scan `paths` (relative to `root`, or absolute) in order, stopping at
/// [`MAX_FINDINGS`]. Unreadable, missing, or oversized files are skipped.
pub fn scan(root: &Path, paths: &[String]) -> Vec<Finding> {
    let mut findings = Vec::new();
    for rel in paths {
        if findings.len() >= MAX_FINDINGS {
            break;
        }
        let full = root.join(rel);
        let Ok(meta) = fs::metadata(&full) else {
            continue;
        };
        if !meta.is_file() || meta.len() > MAX_SCAN_BYTES {
            continue;
        }
        let Ok(content) = fs::read_to_string(&full) else {
            continue;
        };
        let is_python = rel.ends_with(".py");
        for (idx, line) in content.lines().enumerate() {
            if findings.len() >= MAX_FINDINGS {
                break;
            }
            if let Some(marker) = line_marker(line, is_python) {
                findings.push(Finding {
                    path: rel.clone(),
                    line: idx + 1,
                    marker,
                });
            }
        }
    }
    findings
}

fn line_marker(line: &str, is_python: bool) -> Option<&'static str> {
    if let Some(m) = MARKERS.iter().find(|m| line.contains(**m)) {
        return Some(*m);
    }
    if is_python && line.starts_with("print(") {
        return Some("print(");
    }
    None
}

/// User-facing message for a non-empty scan.
pub fn format_findings(findings: &[Finding]) -> Option<String> {
    if findings.is_empty() {
        return None;
    }
    let mut out = String::from("Leftover debug output or conflict markers in edited files:\n");
    for f in findings {
        out.push_str(&format!("- {f}\n"));
    }
    Some(out.trim_end().to_string())
}
