//! Error types for the cleanup module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a cleanup run.
#[derive(Debug, Error)]
pub enum CleanupError {
    /// A listed file could not be deleted.
    #[error("Failed to remove file: {path}")]
    RemoveFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A directory could not be removed for a reason other than still holding entries.
    #[error("Failed to remove directory: {path}")]
    RemoveDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CleanupError {
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::RemoveFile { path, .. } | Self::RemoveDirectory { path, .. } => path,
        }
    }
}
