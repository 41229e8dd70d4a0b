//! Error types for the processor module.

use thiserror::Error;

use crate::cleanup::CleanupError;
use crate::torrent_client::TorrentClientError;
use crate::transfer::TransferError;

/// Errors that abort a post-processing cycle.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// Listing downloads failed.
    #[error("torrent client error: {0}")]
    TorrentClient(#[from] TorrentClientError),

    /// The transfer destination could not be reached.
    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// Local data could not be removed.
    #[error("cleanup error: {0}")]
    Cleanup(#[from] CleanupError),

    /// No flow with the given name is scheduled.
    #[error("flow not configured: {0}")]
    FlowNotConfigured(String),
}
