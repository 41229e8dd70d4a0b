//! File system transfer implementation.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::{self, File};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::mapping::MappingRule;

use super::config::TransferConfig;
use super::error::TransferError;
use super::support::{connect_with_retry, partial_path, record_outcome, relative_destination};
use super::traits::{TransferSession, TransferSink, TransferredFile};

/// Transfers files into a directory tree on a mounted share.
pub struct FsTransfer {
    config: TransferConfig,
}

impl FsTransfer {
    pub fn new(config: TransferConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }
}

#[async_trait]
impl TransferSink for FsTransfer {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn connect(&self) -> Result<Box<dyn TransferSession>, TransferError> {
        let root = &self.config.remote_root;
        connect_with_retry(
            &root.display().to_string(),
            self.config.connect_attempts,
            Duration::from_millis(self.config.connect_delay_ms),
            move || async move {
                let meta = fs::metadata(root).await?;
                if meta.is_dir() {
                    Ok(())
                } else {
                    Err(TransferError::Io(std::io::Error::other("not a directory")))
                }
            },
        )
        .await?;

        info!(?root, "transfer session opened");
        Ok(Box::new(FsSession {
            config: self.config.clone(),
        }))
    }
}

/// SHA-256 of a file, read in chunks of `buffer_size`.
async fn digest_file(path: &Path, buffer_size: usize) -> std::io::Result<String> {
    let mut reader = BufReader::with_capacity(buffer_size, File::open(path).await?);
    let mut hasher = Sha256::new();
    loop {
        let chunk = reader.fill_buf().await?;
        if chunk.is_empty() {
            break;
        }
        hasher.update(chunk);
        let read = chunk.len();
        reader.consume(read);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Session over a reachable remote root.
struct FsSession {
    config: TransferConfig,
}

impl FsSession {
    /// Copies `source` into `partial`, returning the number of bytes written.
    async fn write_partial(&self, source: &Path, partial: &Path) -> Result<u64, TransferError> {
        let source_file = File::open(source).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TransferError::SourceNotFound {
                    path: source.to_path_buf(),
                }
            } else {
                TransferError::Io(e)
            }
        })?;
        let copy_failed =
            |e: std::io::Error| TransferError::copy_failed(source.to_path_buf(), partial.to_path_buf(), e);

        let mut writer = File::create(partial).await.map_err(copy_failed)?;
        let mut reader = BufReader::with_capacity(self.config.buffer_size, source_file);
        let size = tokio::io::copy_buf(&mut reader, &mut writer)
            .await
            .map_err(copy_failed)?;
        writer.sync_all().await.map_err(copy_failed)?;
        Ok(size)
    }

    /// Compares the digests of `source` and `partial`.
    async fn verify(&self, source: &Path, partial: &Path) -> Result<String, TransferError> {
        let expected = digest_file(source, self.config.buffer_size).await?;
        let actual = digest_file(partial, self.config.buffer_size).await?;
        if actual != expected {
            return Err(TransferError::ChecksumMismatch {
                path: partial.to_path_buf(),
                expected,
                actual,
            });
        }
        Ok(actual)
    }

    async fn transfer_inner(&self, rule: &MappingRule) -> Result<TransferredFile, TransferError> {
        let source = PathBuf::from(rule.source_path());
        let destination = self
            .config
            .remote_root
            .join(relative_destination(&rule.destination_path)?);

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| TransferError::DirectoryCreationFailed {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let partial = partial_path(&destination);
        let written = match self.write_partial(&source, &partial).await {
            Ok(size) if self.config.verify_checksums => self
                .verify(&source, &partial)
                .await
                .map(|checksum| (size, Some(checksum))),
            Ok(size) => Ok((size, None)),
            Err(e) => Err(e),
        };
        let (size_bytes, checksum) = match written {
            Ok(written) => written,
            Err(e) => {
                let _ = fs::remove_file(&partial).await;
                return Err(e);
            }
        };

        fs::rename(&partial, &destination).await.map_err(|e| {
            TransferError::copy_failed(partial.clone(), destination.clone(), e)
        })?;

        Ok(TransferredFile {
            source,
            destination,
            size_bytes,
            checksum,
        })
    }
}

#[async_trait]
impl TransferSession for FsSession {
    async fn transfer(&mut self, rule: &MappingRule) -> Result<TransferredFile, TransferError> {
        record_outcome(self.transfer_inner(rule).await)
    }
}
