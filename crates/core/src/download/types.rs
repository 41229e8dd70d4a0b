//! Types describing a download and its files.

use serde::{Deserialize, Serialize};

/// Progress value at which a download counts as complete.
pub const COMPLETE_PERCENT: f64 = 100.0;

/// A single file belonging to a download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadFile {
    /// Path relative to the download's source directory, `/` separated.
    pub relative_path: String,
    /// File size in bytes.
    pub size_bytes: u64,
}

impl DownloadFile {
    pub fn new(relative_path: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            relative_path: relative_path.into(),
            size_bytes,
        }
    }
}

/// A download reported by the torrent client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Download {
    /// Torrent client identifier.
    pub id: i64,
    /// Human readable torrent name.
    pub name: String,
    /// Directory the torrent saved its files into.
    pub source_directory: String,
    /// Download progress (0.0 - 100.0).
    pub progress_percent: f64,
    /// Files in client enumeration order.
    pub files: Vec<DownloadFile>,
}

impl Download {
    /// Whether every byte of the download has been fetched.
    pub fn is_complete(&self) -> bool {
        self.progress_percent >= COMPLETE_PERCENT
    }

    /// Absolute path of one of this download's files.
    pub fn file_path(&self, file: &DownloadFile) -> String {
        join_source_path(&self.source_directory, &file.relative_path)
    }
}

/// Joins a source directory and a relative path with a single `/`.
pub fn join_source_path(source_directory: &str, relative_path: &str) -> String {
    format!("{}/{}", source_directory, relative_path)
}
