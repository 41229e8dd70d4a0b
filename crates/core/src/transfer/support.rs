//! Pieces shared by the transfer implementations.

use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::metrics;

use super::error::TransferError;
use super::traits::TransferredFile;

/// Suffix of the temporary file a copy is written to before being renamed.
const PARTIAL_SUFFIX: &str = ".partial";

/// Runs `attempt` until it succeeds, at most `attempts` times with `delay`
/// between tries.
pub(crate) async fn connect_with_retry<T, F, Fut>(
    destination: &str,
    attempts: u32,
    delay: Duration,
    mut attempt: F,
) -> Result<T, TransferError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransferError>>,
{
    for n in 1..=attempts {
        match attempt().await {
            Ok(connection) => {
                metrics::CONNECTION_ATTEMPTS
                    .with_label_values(&["connected"])
                    .inc();
                debug!(destination, attempt = n, "transfer destination reachable");
                return Ok(connection);
            }
            Err(e) => {
                metrics::CONNECTION_ATTEMPTS
                    .with_label_values(&["unavailable"])
                    .inc();
                debug!(destination, attempt = n, error = %e, "transfer destination unreachable");
            }
        }

        if n < attempts {
            tokio::time::sleep(delay).await;
        }
    }

    warn!(destination, attempts, "giving up on transfer destination");
    Err(TransferError::ConnectionExhausted {
        destination: destination.to_string(),
        attempts,
    })
}

/// Checks that a destination stays below the remote root.
pub(crate) fn relative_destination(destination: &str) -> Result<&Path, TransferError> {
    let relative = Path::new(destination);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if destination.is_empty() || escapes {
        return Err(TransferError::InvalidDestination {
            path: destination.to_string(),
        });
    }
    Ok(relative)
}

pub(crate) fn partial_path(destination: &Path) -> PathBuf {
    let mut partial = destination.as_os_str().to_os_string();
    partial.push(PARTIAL_SUFFIX);
    PathBuf::from(partial)
}

/// Records the outcome of one file transfer.
pub(crate) fn record_outcome(
    result: Result<TransferredFile, TransferError>,
) -> Result<TransferredFile, TransferError> {
    match result {
        Ok(file) => {
            metrics::FILES_TRANSFERRED.inc();
            metrics::BYTES_TRANSFERRED.inc_by(file.size_bytes);
            debug!(
                source = ?file.source,
                destination = ?file.destination,
                bytes = file.size_bytes,
                "file transferred"
            );
            Ok(file)
        }
        Err(e) => {
            metrics::TRANSFER_FAILURES.inc();
            Err(e)
        }
    }
}
