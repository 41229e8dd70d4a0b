//! Mock transfer sink for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::mapping::MappingRule;
use crate::transfer::{TransferError, TransferSession, TransferSink, TransferredFile};

/// Shared state between the sink and the sessions it opens.
#[derive(Debug, Default)]
struct MockTransferState {
    /// Rules transferred successfully, in call order.
    transferred: Vec<MappingRule>,
    /// Number of successful connects.
    connections: usize,
    /// Whether connect fails as if the destination never came up.
    unreachable: bool,
    /// Source paths whose transfer fails.
    failing_sources: HashSet<String>,
}

/// Mock implementation of the TransferSink trait.
///
/// Records every rule instead of copying anything.
///
/// # Example
///
/// ```rust,ignore
/// let transfer = MockTransfer::new();
/// transfer.fail_source("/downloads/movies/a.mkv").await;
///
/// processor.run_cycle().await?;
/// assert_eq!(transfer.transferred().await.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockTransfer {
    state: Arc<RwLock<MockTransferState>>,
}

impl MockTransfer {
    /// Create a new mock transfer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules transferred successfully so far.
    pub async fn transferred(&self) -> Vec<MappingRule> {
        self.state.read().await.transferred.clone()
    }

    /// Destination paths transferred so far.
    pub async fn destinations(&self) -> Vec<String> {
        self.state
            .read()
            .await
            .transferred
            .iter()
            .map(|r| r.destination_path.clone())
            .collect()
    }

    /// Number of sessions opened.
    pub async fn connection_count(&self) -> usize {
        self.state.read().await.connections
    }

    /// Make connect fail with `ConnectionExhausted`.
    pub async fn set_unreachable(&self, unreachable: bool) {
        self.state.write().await.unreachable = unreachable;
    }

    /// Make the transfer of one source path fail.
    pub async fn fail_source(&self, source_path: impl Into<String>) {
        self.state
            .write()
            .await
            .failing_sources
            .insert(source_path.into());
    }
}

#[async_trait]
impl TransferSink for MockTransfer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn connect(&self) -> Result<Box<dyn TransferSession>, TransferError> {
        let mut state = self.state.write().await;
        if state.unreachable {
            return Err(TransferError::ConnectionExhausted {
                destination: "/mock/remote".to_string(),
                attempts: 1,
            });
        }
        state.connections += 1;
        Ok(Box::new(MockSession {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockSession {
    state: Arc<RwLock<MockTransferState>>,
}

#[async_trait]
impl TransferSession for MockSession {
    async fn transfer(&mut self, rule: &MappingRule) -> Result<TransferredFile, TransferError> {
        let source = rule.source_path();
        let mut state = self.state.write().await;
        if state.failing_sources.contains(&source) {
            return Err(TransferError::SourceNotFound {
                path: PathBuf::from(source),
            });
        }
        state.transferred.push(rule.clone());

        Ok(TransferredFile {
            source: PathBuf::from(source),
            destination: PathBuf::from("/mock/remote").join(&rule.destination_path),
            size_bytes: 0,
            checksum: None,
        })
    }
}
