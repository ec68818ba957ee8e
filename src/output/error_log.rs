use chrono::Local;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Append-only log of per-URL failures, one timestamped line each
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `[YYYY-mm-dd HH:MM:SS] message`
    pub fn append(&self, message: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(
            file,
            "[{}] {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            message
        )
    }

    /// Appends a line, reporting a failed write through tracing only
    pub fn record(&self, message: &str) {
        if let Err(e) = self.append(message) {
            tracing::warn!("Could not write to {}: {}", self.path.display(), e);
        }
    }
}
