//! Best-effort git state for the report.
//!
//! Every query may fail (no git, not a repo, timeout); [`GitSnapshot::collect`]
//! maps each failure to a fixed fallback string so rendering never fails.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use wait_timeout::ChildExt;

/// Commits shown in the report.
pub const LOG_LIMIT: usize = 10;

/// Porcelain status lines kept in the snapshot.
const STATUS_LINE_LIMIT: usize = 20;

/// Bytes read from each git pipe.
const MAX_OUTPUT_BYTES: usize = 256 * 1024;

pub const FALLBACK_BRANCH: &str = "(unknown)";
pub const FALLBACK_STATUS_CLEAN: &str = "(clean)";
pub const FALLBACK_STATUS_ERROR: &str = "(git unavailable)";
pub const FALLBACK_LOG: &str = "(no commits)";
pub const FALLBACK_DIFF: &str = "(no changes)";

#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("cannot spawn git: {0}")]
    Spawn(#[source] io::Error),
    #[error("git {args} timed out after {timeout_ms}ms")]
    Timeout { args: String, timeout_ms: u128 },
    #[error("git {args} failed ({status}): {stderr}")]
    Failed {
        args: String,
        status: String,
        stderr: String,
    },
    #[error("git io error: {0}")]
    Io(#[from] io::Error),
}

/// Read-only queries against a working tree.
pub trait GitSource {
    fn branch(&self) -> Result<String, GitError>;
    /// `git status --porcelain` output.
    fn status(&self) -> Result<String, GitError>;
    /// One line per commit, newest first.
    fn log(&self, n: usize) -> Result<String, GitError>;
    fn diff_stat(&self) -> Result<String, GitError>;
    fn stash_list(&self) -> Result<String, GitError>;
}

/// Shells out to the `git` binary with a per-call timeout.
#[derive(Debug, Clone)]
pub struct GitCli {
    cwd: PathBuf,
    timeout: Duration,
}

impl GitCli {
    pub fn new(cwd: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            cwd: cwd.into(),
            timeout,
        }
    }

    fn run(&self, args: &[&str]) -> Result<String, GitError> {
        run_git(&self.cwd, args, self.timeout)
    }
}

impl GitSource for GitCli {
    fn branch(&self) -> Result<String, GitError> {
        self.run(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    fn status(&self) -> Result<String, GitError> {
        self.run(&["status", "--porcelain"])
    }

    fn log(&self, n: usize) -> Result<String, GitError> {
        let n = format!("-n{n}");
        self.run(&["log", "--oneline", "--no-decorate", &n])
    }

    fn diff_stat(&self) -> Result<String, GitError> {
        self.run(&["diff", "--stat", "HEAD"])
    }

    fn stash_list(&self) -> Result<String, GitError> {
        self.run(&["stash", "list"])
    }
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || pipe.map(drain_capped).unwrap_or_default())
}

/// Read `pipe` to EOF, keeping the first `MAX_OUTPUT_BYTES`. The rest is
/// discarded so the child never stalls on a full pipe.
fn drain_capped<R: Read>(mut pipe: R) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        match pipe.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                let room = MAX_OUTPUT_BYTES.saturating_sub(buf.len());
                buf.extend_from_slice(&chunk[..n.min(room)]);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
    buf
}

/// Run `git <args>` in `cwd`; kill it if it outlives `timeout`.
fn run_git(cwd: &Path, args: &[&str], timeout: Duration) -> Result<String, GitError> {
    let mut child = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(GitError::Spawn)?;

    // Drain both pipes while waiting so a chatty child cannot block on a full pipe.
    let stdout = spawn_reader(child.stdout.take());
    let stderr = spawn_reader(child.stderr.take());

    let status = match child.wait_timeout(timeout)? {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(GitError::Timeout {
                args: args.join(" "),
                timeout_ms: timeout.as_millis(),
            });
        }
    };

    let out = stdout.join().unwrap_or_default();
    let err = stderr.join().unwrap_or_default();
    if !status.success() {
        return Err(GitError::Failed {
            args: args.join(" "),
            status: status.to_string(),
            stderr: String::from_utf8_lossy(&err).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&out).trim_end().to_string())
}

// ── Snapshot ──

/// Git state at checkpoint time, with fallbacks already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitSnapshot {
    pub branch: String,
    /// Summary line, e.g. `3 uncommitted files`, or a fallback.
    pub status: String,
    /// Porcelain lines behind the summary (capped).
    pub changes: Vec<String>,
    pub log: String,
    pub diff_stat: String,
    pub stashes: Vec<String>,
}

impl GitSnapshot {
    pub fn collect(git: &dyn GitSource) -> Self {
        let branch = ok_or_note(git.branch(), "branch")
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| FALLBACK_BRANCH.to_string());

        let (status, changes) = match git.status() {
            Ok(out) if out.trim().is_empty() => (FALLBACK_STATUS_CLEAN.to_string(), Vec::new()),
            Ok(out) => {
                let lines: Vec<&str> = out.lines().filter(|l| !l.trim().is_empty()).collect();
                let summary = match lines.len() {
                    1 => "1 uncommitted file".to_string(),
                    n => format!("{n} uncommitted files"),
                };
                let changes = lines
                    .iter()
                    .take(STATUS_LINE_LIMIT)
                    .map(|l| l.to_string())
                    .collect();
                (summary, changes)
            }
            Err(e) => {
                tracing::debug!(error = %e, "git status unavailable");
                (FALLBACK_STATUS_ERROR.to_string(), Vec::new())
            }
        };

        let log = ok_or_note(git.log(LOG_LIMIT), "log")
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_LOG.to_string());

        let diff_stat = ok_or_note(git.diff_stat(), "diff")
            .and_then(|d| d.lines().last().map(|l| l.trim().to_string()))
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| FALLBACK_DIFF.to_string());

        let stashes = ok_or_note(git.stash_list(), "stash")
            .map(|s| {
                s.lines()
                    .filter(|l| !l.trim().is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            branch,
            status,
            changes,
            log,
            diff_stat,
            stashes,
        }
    }
}

fn ok_or_note(result: Result<String, GitError>, what: &str) -> Option<String> {
    match result {
        Ok(s) => Some(s.trim().to_string()),
        Err(e) => {
            tracing::debug!(query = what, error = %e, "git query failed, using fallback");
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Canned git answers; `None` means the query fails.
    #[derive(Default, Clone)]
    pub(crate) struct StubGit {
        pub branch: Option<String>,
        pub status: Option<String>,
        pub log: Option<String>,
        pub diff: Option<String>,
        pub stash: Option<String>,
    }

    impl StubGit {
        pub(crate) fn repo() -> Self {
            Self {
                branch: Some("feat/items".into()),
                status: Some(" M internal/handler/item.go\n?? notes.txt".into()),
                log: Some("abc1234 add item handler\ndef5678 init".into()),
                diff: Some(
                    " internal/handler/item.go | 10 +++++++---\n 1 file changed, 7 insertions(+), 3 deletions(-)"
                        .into(),
                ),
                stash: Some(String::new()),
            }
        }

        fn answer(v: &Option<String>) -> Result<String, GitError> {
            v.clone().ok_or_else(|| GitError::Failed {
                args: "stub".into(),
                status: "exit status: 128".into(),
                stderr: "not a git repository".into(),
            })
        }
    }

    impl GitSource for StubGit {
        fn branch(&self) -> Result<String, GitError> {
            Self::answer(&self.branch)
        }
        fn status(&self) -> Result<String, GitError> {
            Self::answer(&self.status)
        }
        fn log(&self, _n: usize) -> Result<String, GitError> {
            Self::answer(&self.log)
        }
        fn diff_stat(&self) -> Result<String, GitError> {
            Self::answer(&self.diff)
        }
        fn stash_list(&self) -> Result<String, GitError> {
            Self::answer(&self.stash)
        }
    }

    #[test]
    fn snapshot_from_healthy_repo() {
        let snap = GitSnapshot::collect(&StubGit::repo());
        assert_eq!(snap.branch, "feat/items");
        assert_eq!(snap.status, "2 uncommitted files");
        assert_eq!(snap.changes.len(), 2);
        assert!(snap.log.starts_with("abc1234"));
        assert_eq!(snap.diff_stat, "1 file changed, 7 insertions(+), 3 deletions(-)");
        assert!(snap.stashes.is_empty());
    }

    #[test]
    fn snapshot_all_fallbacks_when_git_fails() {
        let snap = GitSnapshot::collect(&StubGit::default());
        assert_eq!(snap.branch, FALLBACK_BRANCH);
        assert_eq!(snap.status, FALLBACK_STATUS_ERROR);
        assert_eq!(snap.log, FALLBACK_LOG);
        assert_eq!(snap.diff_stat, FALLBACK_DIFF);
        assert!(snap.stashes.is_empty());
    }

    #[test]
    fn snapshot_empty_outputs_use_fallbacks() {
        let git = StubGit {
            branch: Some(String::new()),
            status: Some("  \n".into()),
            log: Some(String::new()),
            diff: Some(String::new()),
            stash: Some("stash@{0}: WIP on main: abc wip\n".into()),
        };
        let snap = GitSnapshot::collect(&git);
        assert_eq!(snap.branch, FALLBACK_BRANCH);
        assert_eq!(snap.status, FALLBACK_STATUS_CLEAN);
        assert_eq!(snap.log, FALLBACK_LOG);
        assert_eq!(snap.diff_stat, FALLBACK_DIFF);
        assert_eq!(snap.stashes.len(), 1);
    }

    #[test]
    fn git_cli_outside_repo_falls_back() {
        let tmp = tempfile::tempdir().unwrap();
        let git = GitCli::new(tmp.path(), Duration::from_secs(5));
        let snap = GitSnapshot::collect(&git);
        // Either git is missing or the dir is not a repository.
        assert_eq!(snap.log, FALLBACK_LOG);
        assert_eq!(snap.diff_stat, FALLBACK_DIFF);
    }

    #[test]
    fn reader_caps_output_but_consumes_everything() {
        let data = vec![b'x'; MAX_OUTPUT_BYTES * 2 + 17];
        let mut cursor = io::Cursor::new(data);
        let kept = drain_capped(&mut cursor);
        assert_eq!(kept.len(), MAX_OUTPUT_BYTES);
        assert_eq!(cursor.position() as usize, MAX_OUTPUT_BYTES * 2 + 17);
    }

    #[test]
    fn git_cli_missing_dir_is_an_error() {
        let git = GitCli::new("/nonexistent/scribe/dir", Duration::from_secs(1));
        assert!(git.branch().is_err());
    }
}
