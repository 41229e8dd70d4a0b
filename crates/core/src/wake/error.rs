//! Error types for the wake module.

use thiserror::Error;

/// Errors that can occur while sending a wake signal.
#[derive(Debug, Error)]
pub enum WakeError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Wake request failed: {0}")]
    RequestFailed(String),

    #[error("Wake request rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Request timeout")]
    Timeout,
}
