//! Trait definitions for the transfer module.

use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;

use crate::mapping::MappingRule;

use super::error::TransferError;

/// A file that reached its destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferredFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub size_bytes: u64,
    /// SHA-256 of the copied data, when verification is enabled.
    pub checksum: Option<String>,
}

/// Destination that files can be transferred to.
#[async_trait]
pub trait TransferSink: Send + Sync {
    /// Returns the name of this transfer implementation.
    fn name(&self) -> &str;

    /// Waits for the destination to become reachable and opens a session.
    ///
    /// Returns [`TransferError::ConnectionExhausted`] once the configured
    /// number of attempts is used up.
    async fn connect(&self) -> Result<Box<dyn TransferSession>, TransferError>;
}

/// An open connection to the destination, used for the duration of a cycle.
#[async_trait]
pub trait TransferSession: Send {
    /// Copies one file, creating the destination's parent directories first.
    async fn transfer(&mut self, rule: &MappingRule) -> Result<TransferredFile, TransferError>;
}
