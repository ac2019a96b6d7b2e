pub mod config;
pub mod reports;
pub mod state;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub use config::NotesConfig;
pub use reports::{Report, StoreError, WriteOutcome};

/// Env var overriding the per-user store root.
pub const STORE_DIR_ENV: &str = "SCRIBE_STORE_DIR";

/// Workspace marker directory (config and default notes location).
pub const WORKSPACE_DIR: &str = ".scribe";

/// Compute a deterministic project ID from a repo root or cwd path.
/// project_id = blake3(normalize_path(input)) → hex string (first 32 chars).
pub fn project_id(repo_root_or_cwd: &Path) -> String {
    let normalized = normalize_path(repo_root_or_cwd);
    let hash = blake3::hash(normalized.as_bytes());
    hash.to_hex()[..32].to_string()
}

/// Normalize a path: canonicalize, lowercase on Windows, forward slashes.
fn normalize_path(p: &Path) -> String {
    let abs = p
        .canonicalize()
        .unwrap_or_else(|_| p.to_path_buf())
        .to_string_lossy()
        .to_string();
    #[cfg(windows)]
    let abs = abs.to_lowercase();
    abs.replace('\\', "/")
}

/// Walk up from `cwd` to the nearest directory holding `.scribe/` or `.git`.
/// Falls back to `cwd` itself.
pub fn find_root(cwd: &Path) -> PathBuf {
    let mut dir = Some(cwd);
    while let Some(d) = dir {
        if d.join(WORKSPACE_DIR).is_dir() || d.join(".git").exists() {
            return d.to_path_buf();
        }
        dir = d.parent();
    }
    cwd.to_path_buf()
}

/// Per-user store holding session state files, laid out as
/// `<root>/projects/<project_id>/state/`.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `$SCRIBE_STORE_DIR`, else the platform data dir (`~/.local/share/scribe`,
    /// `%APPDATA%\scribe`), else `~/.scribe`.
    pub fn open_default() -> Self {
        if let Some(dir) = std::env::var_os(STORE_DIR_ENV).filter(|v| !v.is_empty()) {
            return Self::at(PathBuf::from(dir));
        }
        let root = if let Some(data_dir) = dirs::data_dir() {
            data_dir.join("scribe")
        } else if let Some(home) = dirs::home_dir() {
            home.join(".scribe")
        } else {
            PathBuf::from(".scribe-store")
        };
        Self::at(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `root/projects/<project_id>/`
    pub fn project_dir(&self, project_id: &str) -> PathBuf {
        self.root.join("projects").join(project_id)
    }

    pub fn state_dir(&self, project_id: &str) -> PathBuf {
        self.project_dir(project_id).join("state")
    }
}

/// Atomic write: write to temp file in same dir, then rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("no parent dir for {}", path.display()),
        )
    })?;
    fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path)?;
    Ok(())
}
