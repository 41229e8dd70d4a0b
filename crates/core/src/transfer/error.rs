//! Error types for the transfer module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while transferring files.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The destination never became reachable.
    #[error("Transfer destination {destination} unreachable after {attempts} attempts")]
    ConnectionExhausted { destination: String, attempts: u32 },

    /// Source file not found.
    #[error("Source file not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Destination path would escape the remote root.
    #[error("Invalid destination path: {path}")]
    InvalidDestination { path: String },

    /// Failed to create a destination directory.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to copy file.
    #[error("Failed to copy file from {from} to {to}")]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Checksum verification failed.
    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// An SSH or SFTP operation failed.
    #[error("SFTP {operation} failed for {path}")]
    Sftp {
        operation: &'static str,
        path: String,
        #[source]
        source: ssh2::Error,
    },

    /// A blocking transfer task panicked or was cancelled.
    #[error("Transfer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransferError {
    /// Creates a copy failed error.
    pub fn copy_failed(from: PathBuf, to: PathBuf, source: std::io::Error) -> Self {
        Self::CopyFailed { from, to, source }
    }

    pub(crate) fn sftp(operation: &'static str, path: impl Into<String>, source: ssh2::Error) -> Self {
        Self::Sftp {
            operation,
            path: path.into(),
            source,
        }
    }
}
