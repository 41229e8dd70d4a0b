//! Flow configuration.

use serde::{Deserialize, Serialize};

/// Configuration shared by every flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Torrent client download directory that marks a download as belonging
    /// to this flow.
    pub download_dir_tag: String,
}

impl FlowConfig {
    pub fn new(download_dir_tag: impl Into<String>) -> Self {
        Self {
            download_dir_tag: download_dir_tag.into(),
        }
    }
}
