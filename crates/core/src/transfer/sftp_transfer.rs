//! SFTP transfer implementation.
//!
//! `ssh2` is blocking, so every SSH operation runs on the blocking pool.

use async_trait::async_trait;
use ssh2::{Session, Sftp};
use std::io::BufReader;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::spawn_blocking;
use tracing::info;

use crate::mapping::MappingRule;

use super::config::SftpConfig;
use super::error::TransferError;
use super::support::{connect_with_retry, partial_path, record_outcome, relative_destination};
use super::traits::{TransferSession, TransferSink, TransferredFile};

/// Transfers files to a remote directory over SFTP, authenticating with a
/// private key.
pub struct SftpTransfer {
    config: SftpConfig,
}

impl SftpTransfer {
    pub fn new(config: SftpConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SftpConfig {
        &self.config
    }
}

#[async_trait]
impl TransferSink for SftpTransfer {
    fn name(&self) -> &str {
        "sftp"
    }

    async fn connect(&self) -> Result<Box<dyn TransferSession>, TransferError> {
        let target = self.config.target();
        let config = &self.config;
        let connection = connect_with_retry(
            &target,
            config.connect_attempts,
            Duration::from_millis(config.connect_delay_ms),
            move || {
                let config = config.clone();
                async move { spawn_blocking(move || SftpConnection::open(&config)).await? }
            },
        )
        .await?;

        info!(%target, remote_dir = %config.remote_dir, "transfer session opened");
        Ok(Box::new(SftpSession {
            connection: Arc::new(Mutex::new(connection)),
            remote_dir: PathBuf::from(&config.remote_dir),
            buffer_size: config.buffer_size,
        }))
    }
}

/// An authenticated SSH session with its SFTP channel.
struct SftpConnection {
    sftp: Sftp,
    _session: Session,
}

impl SftpConnection {
    fn open(config: &SftpConfig) -> Result<Self, TransferError> {
        let target = config.target();
        let timeout = Duration::from_secs(config.timeout_secs);

        let address = (config.host.as_str(), config.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::NotFound, format!("no address for {target}"))
            })?;
        let tcp = TcpStream::connect_timeout(&address, timeout)?;

        let mut session = Session::new().map_err(|e| TransferError::sftp("session", &target, e))?;
        session.set_timeout(u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX));
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| TransferError::sftp("handshake", &target, e))?;
        session
            .userauth_pubkey_file(&config.username, None, &config.key_path, None)
            .map_err(|e| TransferError::sftp("authenticate", &target, e))?;

        let sftp = session
            .sftp()
            .map_err(|e| TransferError::sftp("subsystem", &target, e))?;
        let remote_dir = Path::new(&config.remote_dir);
        let stat = sftp
            .stat(remote_dir)
            .map_err(|e| TransferError::sftp("stat", &config.remote_dir, e))?;
        if !stat.is_dir() {
            return Err(TransferError::Io(std::io::Error::other(format!(
                "{} is not a directory",
                config.remote_dir
            ))));
        }

        Ok(Self {
            sftp,
            _session: session,
        })
    }

    /// Creates each missing directory of `relative` below `root`.
    fn create_dirs(&self, root: &Path, relative: &Path) -> Result<(), TransferError> {
        let mut dir = root.to_path_buf();
        for component in relative.components() {
            if let Component::Normal(name) = component {
                dir.push(name);
                if self.sftp.stat(&dir).is_err() {
                    self.sftp
                        .mkdir(&dir, 0o755)
                        .map_err(|e| TransferError::sftp("mkdir", dir.display().to_string(), e))?;
                }
            }
        }
        Ok(())
    }

    fn write_partial(
        &self,
        source: &Path,
        partial: &Path,
        buffer_size: usize,
    ) -> Result<u64, TransferError> {
        let local = std::fs::File::open(source).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TransferError::SourceNotFound {
                    path: source.to_path_buf(),
                }
            } else {
                TransferError::Io(e)
            }
        })?;

        let mut remote = self
            .sftp
            .create(partial)
            .map_err(|e| TransferError::sftp("create", partial.display().to_string(), e))?;
        let size = std::io::copy(&mut BufReader::with_capacity(buffer_size, local), &mut remote)
            .map_err(|e| TransferError::copy_failed(source.to_path_buf(), partial.to_path_buf(), e))?;
        remote
            .close()
            .map_err(|e| TransferError::sftp("close", partial.display().to_string(), e))?;
        Ok(size)
    }

    /// Uploads `source` through a `.partial` file and renames it into place.
    fn upload(
        &self,
        source: &Path,
        root: &Path,
        relative: &Path,
        buffer_size: usize,
    ) -> Result<TransferredFile, TransferError> {
        if let Some(parent) = relative.parent() {
            self.create_dirs(root, parent)?;
        }

        let destination = root.join(relative);
        let partial = partial_path(&destination);
        let size_bytes = match self.write_partial(source, &partial, buffer_size) {
            Ok(size) => size,
            Err(e) => {
                let _ = self.sftp.unlink(&partial);
                return Err(e);
            }
        };

        // SFTP v3 servers refuse to rename over an existing file
        let _ = self.sftp.unlink(&destination);
        self.sftp
            .rename(&partial, &destination, None)
            .map_err(|e| TransferError::sftp("rename", destination.display().to_string(), e))?;

        Ok(TransferredFile {
            source: source.to_path_buf(),
            destination,
            size_bytes,
            checksum: None,
        })
    }
}

/// Session over one SSH connection.
struct SftpSession {
    connection: Arc<Mutex<SftpConnection>>,
    remote_dir: PathBuf,
    buffer_size: usize,
}

impl SftpSession {
    async fn transfer_inner(&self, rule: &MappingRule) -> Result<TransferredFile, TransferError> {
        let source = PathBuf::from(rule.source_path());
        let relative = relative_destination(&rule.destination_path)?.to_path_buf();
        let connection = Arc::clone(&self.connection);
        let root = self.remote_dir.clone();
        let buffer_size = self.buffer_size;

        spawn_blocking(move || {
            let connection = connection
                .lock()
                .map_err(|_| TransferError::Io(std::io::Error::other("SFTP connection poisoned")))?;
            connection.upload(&source, &root, &relative, buffer_size)
        })
        .await?
    }
}

#[async_trait]
impl TransferSession for SftpSession {
    async fn transfer(&mut self, rule: &MappingRule) -> Result<TransferredFile, TransferError> {
        record_outcome(self.transfer_inner(rule).await)
    }
}
