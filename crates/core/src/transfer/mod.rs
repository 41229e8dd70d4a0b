//! Transfer of mapped files to the media server.
//!
//! A [`TransferSink`] opens one [`TransferSession`] per cycle; the session
//! copies each [`MappingRule`](crate::mapping::MappingRule) to its
//! destination, creating remote parent directories as needed.
//!
//! [`FsTransfer`] writes below a configured remote root, typically the media
//! server's share mounted on the local machine. [`SftpTransfer`] uploads to a
//! remote directory over SSH. Both retry connecting for a bounded number of
//! attempts before giving up.

mod config;
mod error;
mod fs_transfer;
mod sftp_transfer;
mod support;
mod traits;

pub use config::{SftpConfig, TransferConfig};
pub use error::TransferError;
pub use fs_transfer::FsTransfer;
pub use sftp_transfer::SftpTransfer;
pub use traits::{TransferSession, TransferSink, TransferredFile};
