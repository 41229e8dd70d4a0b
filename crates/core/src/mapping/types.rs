//! Mapping rule type.

use serde::{Deserialize, Serialize};

use crate::download::join_source_path;

/// Instruction to copy one local file to a remote-relative destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    /// Directory of the download the file belongs to.
    pub source_directory: String,
    /// Path of the file relative to `source_directory`.
    pub relative_path: String,
    /// Destination path relative to the remote root.
    pub destination_path: String,
}

impl MappingRule {
    pub fn new(
        source_directory: impl Into<String>,
        relative_path: impl Into<String>,
        destination_path: impl Into<String>,
    ) -> Self {
        Self {
            source_directory: source_directory.into(),
            relative_path: relative_path.into(),
            destination_path: destination_path.into(),
        }
    }

    /// Local path of the file to transfer.
    pub fn source_path(&self) -> String {
        join_source_path(&self.source_directory, &self.relative_path)
    }

    /// Directory part of the destination, empty when the file lands at the root.
    pub fn destination_dir(&self) -> &str {
        self.destination_path
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_path() {
        let rule = MappingRule::new("/downloads", "dir/video.mkv", "movies/dir/video.mkv");
        assert_eq!(rule.source_path(), "/downloads/dir/video.mkv");
    }

    #[test]
    fn test_destination_dir() {
        let rule = MappingRule::new("/downloads", "dir/video.mkv", "movies/dir/video.mkv");
        assert_eq!(rule.destination_dir(), "movies/dir");

        let top_level = MappingRule::new("/downloads", "video.mkv", "video.mkv");
        assert_eq!(top_level.destination_dir(), "");
    }
}
