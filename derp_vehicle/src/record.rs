//! Record folder creation.
//!
//! Every recording session gets its own folder under the configured data
//! directory, named `<UTC %Y%m%d-%H%M%S>-<hostname>`.

use chrono::{DateTime, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Hostname used when the system one cannot be read.
const FALLBACK_HOSTNAME: &str = "localhost";

/// Creates per-session record folders under a data directory.
#[derive(Debug, Clone)]
pub struct RecordFolders {
    data_dir: PathBuf,
    hostname: String,
}

impl RecordFolders {
    /// Record folders under `data_dir`, tagged with the system hostname.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let hostname = nix::unistd::gethostname()
            .ok()
            .and_then(|name| name.into_string().ok())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| FALLBACK_HOSTNAME.to_string());
        Self::with_hostname(data_dir, &hostname)
    }

    /// Record folders tagged with an explicit hostname.
    pub fn with_hostname(data_dir: impl Into<PathBuf>, hostname: &str) -> Self {
        Self {
            data_dir: data_dir.into(),
            hostname: hostname.to_string(),
        }
    }

    /// Root all folders are created in.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Folder name for a session started at `at`.
    pub fn folder_name(&self, at: DateTime<Utc>) -> String {
        format!("{}-{}", at.format("%Y%m%d-%H%M%S"), self.hostname)
    }

    /// Create the folder for a session starting now.
    pub fn create(&self) -> io::Result<PathBuf> {
        let path = self.data_dir.join(self.folder_name(Utc::now()));
        fs::create_dir_all(&path)?;
        info!("Created record folder {:?}", path);
        Ok(path)
    }
}
