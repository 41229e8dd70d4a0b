//! Mock torrent client for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::download::Download;
use crate::torrent_client::{TorrentClient, TorrentClientError};

/// Mock implementation of the TorrentClient trait.
///
/// Provides controllable behavior for testing:
/// - Serve a configurable list of downloads
/// - Record which downloads were removed
/// - Simulate failures
///
/// # Example
///
/// ```rust,ignore
/// let client = MockTorrentClient::new();
/// client.add_download(fixtures::download(1, "/downloads/movies", &[("a.mkv", 10)])).await;
///
/// processor.run_cycle().await?;
/// assert_eq!(client.removed_ids().await, vec![1]);
/// ```
#[derive(Debug, Default)]
pub struct MockTorrentClient {
    /// Downloads currently known to the client.
    downloads: Arc<RwLock<Vec<Download>>>,
    /// Ids passed to remove_download, in call order.
    removed: Arc<RwLock<Vec<i64>>>,
    /// If set, the next list operation will fail with this error.
    next_list_error: Arc<RwLock<Option<TorrentClientError>>>,
    /// Whether remove_download fails.
    fail_removals: Arc<RwLock<bool>>,
}

impl MockTorrentClient {
    /// Create a new mock torrent client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock client serving the given downloads.
    pub fn with_downloads(downloads: Vec<Download>) -> Self {
        Self {
            downloads: Arc::new(RwLock::new(downloads)),
            ..Self::default()
        }
    }

    /// Add a download to the client.
    pub async fn add_download(&self, download: Download) {
        self.downloads.write().await.push(download);
    }

    /// Set the progress of a download (0.0 - 100.0).
    pub async fn set_progress(&self, id: i64, progress_percent: f64) {
        let mut downloads = self.downloads.write().await;
        if let Some(download) = downloads.iter_mut().find(|d| d.id == id) {
            download.progress_percent = progress_percent;
        }
    }

    /// Ids of downloads removed so far.
    pub async fn removed_ids(&self) -> Vec<i64> {
        self.removed.read().await.clone()
    }

    /// Number of downloads still known to the client.
    pub async fn download_count(&self) -> usize {
        self.downloads.read().await.len()
    }

    /// Configure the next list operation to fail with the given error.
    pub async fn set_next_list_error(&self, error: TorrentClientError) {
        *self.next_list_error.write().await = Some(error);
    }

    /// Make every remove_download call fail.
    pub async fn set_fail_removals(&self, fail: bool) {
        *self.fail_removals.write().await = fail;
    }
}

#[async_trait]
impl TorrentClient for MockTorrentClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_downloads(&self) -> Result<Vec<Download>, TorrentClientError> {
        if let Some(err) = self.next_list_error.write().await.take() {
            return Err(err);
        }
        Ok(self.downloads.read().await.clone())
    }

    async fn remove_download(&self, id: i64) -> Result<(), TorrentClientError> {
        self.removed.write().await.push(id);

        if *self.fail_removals.read().await {
            return Err(TorrentClientError::ApiError("mock removal failure".to_string()));
        }

        // Unknown ids are accepted, like Transmission does
        self.downloads.write().await.retain(|d| d.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_list_and_remove() {
        let client = MockTorrentClient::with_downloads(vec![
            fixtures::download(1, "/d", &[("a.mkv", 1)]),
            fixtures::download(2, "/d", &[("b.mkv", 1)]),
        ]);

        assert_eq!(client.list_downloads().await.unwrap().len(), 2);
        client.remove_download(1).await.unwrap();
        assert_eq!(client.download_count().await, 1);
        assert_eq!(client.removed_ids().await, vec![1]);

        client.remove_download(1).await.unwrap();
        assert_eq!(client.download_count().await, 1);
        assert_eq!(client.removed_ids().await, vec![1, 1]);
    }

    #[tokio::test]
    async fn test_next_list_error_is_consumed() {
        let client = MockTorrentClient::new();
        client.set_next_list_error(TorrentClientError::Timeout).await;

        assert!(client.list_downloads().await.is_err());
        assert!(client.list_downloads().await.is_ok());
    }

    #[tokio::test]
    async fn test_set_progress() {
        let client = MockTorrentClient::with_downloads(vec![fixtures::download(5, "/d", &[])]);
        client.set_progress(5, 40.0).await;
        assert!(client.completed_downloads().await.unwrap().is_empty());
    }
}
