//! Depth-first directory cleanup.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};

use crate::download::{join_source_path, Download};
use crate::mapping::parent_dir;
use crate::metrics;

use super::error::CleanupError;

/// Outcome of a cleanup run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Files deleted.
    pub files_removed: usize,
    /// Directories that were empty and got removed.
    pub directories_removed: usize,
    /// Directories left in place because they still hold entries.
    pub directories_kept: usize,
}

impl CleanupReport {
    /// Add the counts of another run to this one.
    pub fn absorb(&mut self, other: &CleanupReport) {
        self.files_removed += other.files_removed;
        self.directories_removed += other.directories_removed;
        self.directories_kept += other.directories_kept;
    }
}

/// Deletes downloaded files and the directories they leave empty.
#[derive(Debug, Clone, Default)]
pub struct DirectoryCleanupEngine;

impl DirectoryCleanupEngine {
    pub fn new() -> Self {
        Self
    }

    /// Remove every file of every download, then their emptied directories.
    ///
    /// Must only be called once the files have been transferred.
    pub async fn cleanup(&self, downloads: &[Download]) -> Result<CleanupReport, CleanupError> {
        let mut report = CleanupReport {
            files_removed: self.remove_files(downloads).await?,
            ..Default::default()
        };

        for dir in list_unique_directories_depth_first(downloads) {
            match fs::remove_dir(&dir).await {
                Ok(()) => {
                    debug!(?dir, "removed empty directory");
                    report.directories_removed += 1;
                }
                Err(e) if is_not_empty(&e) => {
                    debug!(?dir, "directory still has entries, keeping it");
                    report.directories_kept += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(?dir, "directory already gone");
                }
                Err(e) => {
                    return Err(CleanupError::RemoveDirectory {
                        path: dir,
                        source: e,
                    })
                }
            }
        }

        metrics::DIRECTORIES_REMOVED.inc_by(report.directories_removed as u64);
        info!(
            downloads = downloads.len(),
            files_removed = report.files_removed,
            directories_removed = report.directories_removed,
            directories_kept = report.directories_kept,
            "cleanup complete"
        );

        Ok(report)
    }

    /// Delete each listed file. Files that are already gone are skipped.
    async fn remove_files(&self, downloads: &[Download]) -> Result<usize, CleanupError> {
        let mut removed = 0;
        for download in downloads {
            for file in &download.files {
                let path = PathBuf::from(download.file_path(file));
                match fs::remove_file(&path).await {
                    Ok(()) => removed += 1,
                    Err(e) if e.kind() == ErrorKind::NotFound => {
                        debug!(download_id = download.id, ?path, "file already gone");
                    }
                    Err(e) => return Err(CleanupError::RemoveFile { path, source: e }),
                }
            }
        }
        Ok(removed)
    }
}

/// Every directory containing a listed file, below each download's source
/// directory, ordered so that children come before their parents.
///
/// `a/b/c.txt` in `/src` contributes `/src/a/b` and `/src/a`; the source
/// directory itself is never included.
pub fn list_unique_directories_depth_first(downloads: &[Download]) -> Vec<PathBuf> {
    let mut dirs = BTreeSet::new();
    for download in downloads {
        for file in &download.files {
            for prefix in path_traversals(parent_dir(&file.relative_path)) {
                dirs.insert(join_source_path(&download.source_directory, &prefix));
            }
        }
    }
    // Descending lexical order puts every path before any of its prefixes
    dirs.into_iter().rev().map(PathBuf::from).collect()
}

/// All leading sub-paths of a directory: `a/b` yields `a` and `a/b`.
fn path_traversals(dir: &str) -> Vec<String> {
    let parts: Vec<&str> = dir.split('/').filter(|p| !p.is_empty()).collect();
    (1..=parts.len()).map(|n| parts[..n].join("/")).collect()
}

/// Whether a `remove_dir` failure means the directory still has entries.
fn is_not_empty(e: &std::io::Error) -> bool {
    // ENOTEMPTY is 39 on Linux and 66 on macOS/BSD
    e.kind() == ErrorKind::DirectoryNotEmpty || matches!(e.raw_os_error(), Some(39) | Some(66))
}
