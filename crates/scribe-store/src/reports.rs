//! Report persistence and retention.
//!
//! Files are named `REPORT_<YYYYMMDD-HHMMSS>_<slug>.md`, so lexicographic order
//! of file names is chronological order. Rotation deletes from the front of
//! that order. A second report in the same second with the same slug gets a
//! `_2`, `_3`, ... suffix, which still sorts after the first.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;

/// Default number of report files kept.
pub const DEFAULT_RETENTION: usize = 10;

pub const REPORT_PREFIX: &str = "REPORT_";
pub const REPORT_EXT: &str = "md";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cannot create reports dir {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot list {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot serialize session state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A rendered report and its target file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub filename: String,
    pub body: String,
}

impl Report {
    pub fn new(at: OffsetDateTime, slug: &str, body: String) -> Self {
        Self {
            filename: report_filename(at, slug),
            body,
        }
    }
}

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub path: PathBuf,
    /// Files deleted by rotation.
    pub pruned: Vec<PathBuf>,
}

/// `REPORT_<YYYYMMDD-HHMMSS>_<slug>.md` (UTC).
pub fn report_filename(at: OffsetDateTime, slug: &str) -> String {
    let at = at.to_offset(time::UtcOffset::UTC);
    format!(
        "{REPORT_PREFIX}{:04}{:02}{:02}-{:02}{:02}{:02}_{slug}.{REPORT_EXT}",
        at.year(),
        at.month() as u8,
        at.day(),
        at.hour(),
        at.minute(),
        at.second()
    )
}

pub fn is_report_file(name: &str) -> bool {
    name.starts_with(REPORT_PREFIX)
        && Path::new(name).extension().and_then(|e| e.to_str()) == Some(REPORT_EXT)
}

/// Report files in `dir`, sorted by file name ascending (oldest first).
/// A missing directory yields an empty list.
pub fn list_reports(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::List {
                path: dir.to_path_buf(),
                source,
            })
        }
    };
    let mut reports: Vec<PathBuf> = entries
        .flatten()
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|e| is_report_file(&e.file_name().to_string_lossy()))
        .map(|e| e.path())
        .collect();
    reports.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(reports)
}

/// Newest report in `dir`, if any.
pub fn latest_report(dir: &Path) -> Option<PathBuf> {
    list_reports(dir).ok()?.pop()
}

/// Write `report` into `dir`, then prune down to `retention` files.
///
/// Directory creation and the write itself are fatal to this call; pruning is
/// not: a rotation failure is logged and the write still succeeds. A
/// `retention` of 0 is treated as 1 so the new report always survives.
pub fn write_report(
    dir: &Path,
    report: &Report,
    retention: usize,
) -> Result<WriteOutcome, StoreError> {
    fs::create_dir_all(dir).map_err(|source| StoreError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = unused_path(dir, &report.filename);
    crate::write_atomic(&path, report.body.as_bytes()).map_err(|source| StoreError::Write {
        path: path.clone(),
        source,
    })?;

    let pruned = match rotate(dir, retention) {
        Ok(pruned) => pruned,
        Err(e) => {
            tracing::warn!(error = %e, "report rotation failed");
            Vec::new()
        }
    };
    Ok(WriteOutcome { path, pruned })
}

fn unused_path(dir: &Path, filename: &str) -> PathBuf {
    let path = dir.join(filename);
    if !path.exists() {
        return path;
    }
    let stem = filename
        .strip_suffix(&format!(".{REPORT_EXT}"))
        .unwrap_or(filename);
    (2..)
        .map(|n| dir.join(format!("{stem}_{n}.{REPORT_EXT}")))
        .find(|p| !p.exists())
        .unwrap_or(path)
}

/// Delete the oldest reports so that at most `retention` remain.
/// Individual delete failures are logged and skipped.
pub fn rotate(dir: &Path, retention: usize) -> Result<Vec<PathBuf>, StoreError> {
    let retention = retention.max(1);
    let reports = list_reports(dir)?;
    if reports.len() <= retention {
        return Ok(Vec::new());
    }
    let excess = reports.len() - retention;
    let mut pruned = Vec::with_capacity(excess);
    for old in reports.into_iter().take(excess) {
        match fs::remove_file(&old) {
            Ok(()) => pruned.push(old),
            Err(e) => tracing::warn!(path = %old.display(), error = %e, "cannot prune report"),
        }
    }
    Ok(pruned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn seed(dir: &Path, count: usize) -> Vec<String> {
        fs::create_dir_all(dir).unwrap();
        (0..count)
            .map(|i| {
                let name = format!("REPORT_202401{:02}-090000_old.md", i + 1);
                fs::write(dir.join(&name), format!("report {i}")).unwrap();
                name
            })
            .collect()
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn filename_is_sortable() {
        let a = report_filename(datetime!(2026-01-02 03:04:05 UTC), "auth");
        let b = report_filename(datetime!(2026-01-10 00:00:00 UTC), "auth");
        assert_eq!(a, "REPORT_20260102-030405_auth.md");
        assert!(a < b);
    }

    #[test]
    fn filename_normalizes_to_utc() {
        let at = datetime!(2026-01-02 03:04:05 +02:00);
        assert_eq!(report_filename(at, "x"), "REPORT_20260102-010405_x.md");
    }

    #[test]
    fn report_file_detection() {
        assert!(is_report_file("REPORT_20260102-030405_auth.md"));
        assert!(!is_report_file("REPORT_20260102-030405_auth.txt"));
        assert!(!is_report_file("notes.md"));
    }

    #[test]
    fn write_creates_dir_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a").join("notes");
        let report = Report::new(datetime!(2026-03-01 12:00:00 UTC), "s", "# hi\n".into());
        let out = write_report(&dir, &report, DEFAULT_RETENTION).unwrap();
        assert_eq!(fs::read_to_string(&out.path).unwrap(), "# hi\n");
        assert!(out.pruned.is_empty());
    }

    #[test]
    fn same_second_reports_do_not_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let at = datetime!(2026-03-01 12:00:00 UTC);
        let first = write_report(tmp.path(), &Report::new(at, "s", "one".into()), 10).unwrap();
        let second = write_report(tmp.path(), &Report::new(at, "s", "two".into()), 10).unwrap();
        assert_ne!(first.path, second.path);
        assert_eq!(
            names(&list_reports(tmp.path()).unwrap()),
            vec!["REPORT_20260301-120000_s.md", "REPORT_20260301-120000_s_2.md"]
        );
        assert_eq!(latest_report(tmp.path()).unwrap(), second.path);
        assert_eq!(fs::read_to_string(&first.path).unwrap(), "one");
    }

    #[test]
    fn write_keeps_shell_metacharacters_verbatim() {
        let tmp = tempfile::tempdir().unwrap();
        let body = "EOF\n$(rm -rf /) `whoami` 'quote' \"dq\"\nEOF\n".to_string();
        let report = Report::new(datetime!(2026-03-01 12:00:00 UTC), "s", body.clone());
        let out = write_report(tmp.path(), &report, DEFAULT_RETENTION).unwrap();
        assert_eq!(fs::read_to_string(&out.path).unwrap(), body);
    }

    #[test]
    fn rotation_prunes_two_oldest_of_twelve() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        let seeded = seed(dir, 11);
        let report = Report::new(datetime!(2026-10-18 08:00:00 UTC), "new", "new".into());
        let out = write_report(dir, &report, 10).unwrap();

        assert_eq!(names(&out.pruned), seeded[..2].to_vec());
        let remaining = names(&list_reports(dir).unwrap());
        assert_eq!(remaining.len(), 10);
        assert_eq!(remaining.last().unwrap(), &report.filename);
        assert_eq!(remaining[0], seeded[2]);
    }

    #[test]
    fn rotation_ignores_unrelated_files() {
        let tmp = tempfile::tempdir().unwrap();
        seed(tmp.path(), 3);
        fs::write(tmp.path().join("README.md"), "keep").unwrap();
        let pruned = rotate(tmp.path(), 1).unwrap();
        assert_eq!(pruned.len(), 2);
        assert!(tmp.path().join("README.md").exists());
    }

    #[test]
    fn rotation_zero_retention_keeps_newest() {
        let tmp = tempfile::tempdir().unwrap();
        let seeded = seed(tmp.path(), 3);
        rotate(tmp.path(), 0).unwrap();
        assert_eq!(names(&list_reports(tmp.path()).unwrap()), vec![seeded[2].clone()]);
    }

    #[test]
    fn list_missing_dir_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(list_reports(&tmp.path().join("nope")).unwrap().is_empty());
        assert!(latest_report(&tmp.path().join("nope")).is_none());
    }

    #[test]
    fn latest_report_is_last_by_name() {
        let tmp = tempfile::tempdir().unwrap();
        let seeded = seed(tmp.path(), 4);
        let latest = latest_report(tmp.path()).unwrap();
        assert_eq!(latest.file_name().unwrap().to_string_lossy(), seeded[3]);
    }

    #[test]
    fn write_into_file_path_fails_without_panic() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let report = Report::new(datetime!(2026-03-01 12:00:00 UTC), "s", "x".into());
        let err = write_report(&blocker.join("notes"), &report, 10).unwrap_err();
        assert!(matches!(err, StoreError::CreateDir { .. }));
    }
}
