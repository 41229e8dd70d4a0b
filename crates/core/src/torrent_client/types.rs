//! Types for torrent client operations.

use async_trait::async_trait;
use thiserror::Error;

use crate::download::Download;

/// Errors that can occur during torrent client operations.
#[derive(Debug, Error)]
pub enum TorrentClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Trait for torrent client backends.
#[async_trait]
pub trait TorrentClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// List every download the client knows about, complete or not.
    async fn list_downloads(&self) -> Result<Vec<Download>, TorrentClientError>;

    /// Forget a download. Local data is left on disk.
    async fn remove_download(&self, id: i64) -> Result<(), TorrentClientError>;

    /// List the downloads that have reached 100%.
    async fn completed_downloads(&self) -> Result<Vec<Download>, TorrentClientError> {
        let downloads = self.list_downloads().await?;
        Ok(downloads.into_iter().filter(|d| d.is_complete()).collect())
    }
}
