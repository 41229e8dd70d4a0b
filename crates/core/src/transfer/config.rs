//! Configuration for the transfer module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the file system transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Directory that destination paths are resolved against.
    pub remote_root: PathBuf,

    /// How many times to check for the remote root before giving up.
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,

    /// Delay between connection attempts in milliseconds.
    #[serde(default = "default_connect_delay_ms")]
    pub connect_delay_ms: u64,

    /// Whether to re-read each copied file and compare SHA-256 digests.
    #[serde(default)]
    pub verify_checksums: bool,

    /// Buffer size for file copies in bytes.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_connect_attempts() -> u32 {
    30
}

fn default_connect_delay_ms() -> u64 {
    1000
}

fn default_buffer_size() -> usize {
    1024 * 1024 // 1 MB
}

impl TransferConfig {
    /// Config with default retry and buffer settings for the given root.
    pub fn new(remote_root: impl Into<PathBuf>) -> Self {
        Self {
            remote_root: remote_root.into(),
            connect_attempts: default_connect_attempts(),
            connect_delay_ms: default_connect_delay_ms(),
            verify_checksums: false,
            buffer_size: default_buffer_size(),
        }
    }

    pub fn with_connect_attempts(mut self, attempts: u32) -> Self {
        self.connect_attempts = attempts;
        self
    }

    pub fn with_connect_delay_ms(mut self, delay_ms: u64) -> Self {
        self.connect_delay_ms = delay_ms;
        self
    }

    pub fn with_verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }
}

/// Configuration for the SFTP transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SftpConfig {
    /// Host name or address of the media server.
    #[serde(alias = "url")]
    pub host: String,

    #[serde(default = "default_sftp_port")]
    pub port: u16,

    pub username: String,

    /// Private key used for public key authentication.
    pub key_path: PathBuf,

    /// Remote directory that destination paths are resolved against.
    pub remote_dir: String,

    /// How many times to try connecting before giving up.
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,

    /// Delay between connection attempts in milliseconds.
    #[serde(default = "default_connect_delay_ms")]
    pub connect_delay_ms: u64,

    /// Timeout for each blocking SSH operation in seconds.
    #[serde(default = "default_sftp_timeout_secs")]
    pub timeout_secs: u64,

    /// Buffer size for uploads in bytes.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_sftp_port() -> u16 {
    22
}

fn default_sftp_timeout_secs() -> u64 {
    30
}

impl SftpConfig {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        key_path: impl Into<PathBuf>,
        remote_dir: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: default_sftp_port(),
            username: username.into(),
            key_path: key_path.into(),
            remote_dir: remote_dir.into(),
            connect_attempts: default_connect_attempts(),
            connect_delay_ms: default_connect_delay_ms(),
            timeout_secs: default_sftp_timeout_secs(),
            buffer_size: default_buffer_size(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_connect_attempts(mut self, attempts: u32) -> Self {
        self.connect_attempts = attempts;
        self
    }

    pub fn with_connect_delay_ms(mut self, delay_ms: u64) -> Self {
        self.connect_delay_ms = delay_ms;
        self
    }

    /// `user@host:port`, used in logs and errors.
    pub fn target(&self) -> String {
        format!("{}@{}:{}", self.username, self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_toml() {
        let config: TransferConfig = toml::from_str(r#"remote_root = "/mnt/htpc""#).unwrap();
        assert_eq!(config.remote_root, PathBuf::from("/mnt/htpc"));
        assert_eq!(config.connect_attempts, 30);
        assert_eq!(config.connect_delay_ms, 1000);
        assert!(!config.verify_checksums);
        assert_eq!(config.buffer_size, 1024 * 1024);
    }

    #[test]
    fn test_builder() {
        let config = TransferConfig::new("/mnt")
            .with_connect_attempts(2)
            .with_connect_delay_ms(5)
            .with_verify_checksums(true);
        assert_eq!(config.connect_attempts, 2);
        assert_eq!(config.connect_delay_ms, 5);
        assert!(config.verify_checksums);
    }

    #[test]
    fn test_sftp_defaults_from_toml() {
        let config: SftpConfig = toml::from_str(
            r#"
url = "htpc.local"
username = "plex"
key_path = "/home/plex/.ssh/id_ed25519"
remote_dir = "/srv/media"
"#,
        )
        .unwrap();
        assert_eq!(config.host, "htpc.local");
        assert_eq!(config.port, 22);
        assert_eq!(config.connect_attempts, 30);
        assert_eq!(config.connect_delay_ms, 1000);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.target(), "plex@htpc.local:22");
    }
}
