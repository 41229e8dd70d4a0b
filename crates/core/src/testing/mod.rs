//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the collaborator traits,
//! allowing processor cycles to be tested without a torrent client, a media
//! server or a home automation hub.
//!
//! # Example
//!
//! ```rust,ignore
//! use plexpost_core::testing::{fixtures, MockTorrentClient, MockTransfer, MockWake};
//!
//! let client = MockTorrentClient::with_downloads(vec![
//!     fixtures::download(1, "/downloads/movies", &[("Movie/movie.mkv", 1000)]),
//! ]);
//! let transfer = MockTransfer::new();
//! let wake = MockWake::new();
//! ```

mod mock_torrent_client;
mod mock_transfer;
mod mock_wake;

pub use mock_torrent_client::MockTorrentClient;
pub use mock_transfer::MockTransfer;
pub use mock_wake::MockWake;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::download::{Download, DownloadFile};

    /// Create a completed download with the given `(relative_path, size)` files.
    pub fn download(id: i64, source_directory: &str, files: &[(&str, u64)]) -> Download {
        Download {
            id,
            name: format!("Torrent {}", id),
            source_directory: source_directory.to_string(),
            progress_percent: 100.0,
            files: files
                .iter()
                .map(|(path, size)| DownloadFile::new(*path, *size))
                .collect(),
        }
    }

    /// Create a download that is still in progress.
    pub fn partial_download(id: i64, source_directory: &str, files: &[(&str, u64)]) -> Download {
        Download {
            progress_percent: 42.0,
            ..download(id, source_directory, files)
        }
    }

    /// A movie release with a feature, a sample, two English subtitles and an nfo.
    pub fn movie_release(id: i64, source_directory: &str) -> Download {
        download(
            id,
            source_directory,
            &[
                ("Movie.2019.1080p/Movie.2019.1080p.mkv", 4_000_000),
                ("Movie.2019.1080p/Sample/sample.mkv", 40_000),
                ("Movie.2019.1080p/Subs/English (SDH).srt", 60),
                ("Movie.2019.1080p/Subs/English.srt", 50),
                ("Movie.2019.1080p/Movie.2019.1080p.nfo", 2),
            ],
        )
    }
}
