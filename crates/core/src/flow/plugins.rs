//! Flow plugin implementations.

use serde::{Deserialize, Serialize};

use crate::download::Download;
use crate::mapping::{map_single_video_with_subtitles, MappingRule};

use super::config::FlowConfig;

/// Destination root for uncategorised downloads.
pub const DOWNLOADS_ROOT: &str = "downloads/";
/// Destination root for movies.
pub const MOVIES_ROOT: &str = "movies/";
/// Destination root for shows.
pub const TV_ROOT: &str = "tv/";

/// Identifies a flow in configuration, logs and the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    Default,
    Movies,
    Tv,
}

impl FlowKind {
    pub const ALL: [FlowKind; 3] = [FlowKind::Default, FlowKind::Movies, FlowKind::Tv];

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowKind::Default => "default",
            FlowKind::Movies => "movies",
            FlowKind::Tv => "tv",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

/// Catch-all flow: every file of the download is forwarded as is.
#[derive(Debug, Clone)]
pub struct DefaultFlow {
    download_dir_tag: String,
}

impl DefaultFlow {
    pub fn new(config: FlowConfig) -> Self {
        Self {
            download_dir_tag: config.download_dir_tag,
        }
    }

    pub fn filter(&self, download: &Download) -> bool {
        download.source_directory == self.download_dir_tag
    }

    pub fn map_files(&self, download: &Download) -> Vec<MappingRule> {
        download
            .files
            .iter()
            .map(|f| {
                MappingRule::new(
                    download.source_directory.clone(),
                    f.relative_path.clone(),
                    format!("{}{}", DOWNLOADS_ROOT, f.relative_path),
                )
            })
            .collect()
    }
}

/// Single feature video with subtitles, placed below `movies/`.
#[derive(Debug, Clone)]
pub struct MovieFlow {
    download_dir_tag: String,
}

impl MovieFlow {
    pub fn new(config: FlowConfig) -> Self {
        Self {
            download_dir_tag: config.download_dir_tag,
        }
    }

    pub fn filter(&self, download: &Download) -> bool {
        download.source_directory == self.download_dir_tag
    }

    pub fn map_files(&self, download: &Download) -> Vec<MappingRule> {
        map_single_video_with_subtitles(download, MOVIES_ROOT)
    }
}

/// Episodes saved under `<tag>/<show>/<season>`, placed below `tv/<show>/<season>/`.
#[derive(Debug, Clone)]
pub struct ShowFlow {
    download_dir_tag: String,
}

impl ShowFlow {
    pub fn new(config: FlowConfig) -> Self {
        Self {
            download_dir_tag: config.download_dir_tag,
        }
    }

    pub fn filter(&self, download: &Download) -> bool {
        download.source_directory.starts_with(&self.download_dir_tag)
    }

    pub fn map_files(&self, download: &Download) -> Vec<MappingRule> {
        let (show_name, season) = parse_show_and_season(&download.source_directory);
        let destination_root = format!("{}{}/{}/", TV_ROOT, show_name, season);
        map_single_video_with_subtitles(download, &destination_root)
    }
}

/// Second-to-last and last `/` segments of a download directory.
///
/// Missing segments come back empty.
fn parse_show_and_season(source_directory: &str) -> (&str, &str) {
    let mut segments = source_directory.rsplit('/');
    let season = segments.next().unwrap_or("");
    let show_name = segments.next().unwrap_or("");
    (show_name, season)
}

/// A configured flow.
#[derive(Debug, Clone)]
pub enum FlowPlugin {
    Default(DefaultFlow),
    Movie(MovieFlow),
    Show(ShowFlow),
}

impl FlowPlugin {
    pub fn new(kind: FlowKind, config: FlowConfig) -> Self {
        match kind {
            FlowKind::Default => FlowPlugin::Default(DefaultFlow::new(config)),
            FlowKind::Movies => FlowPlugin::Movie(MovieFlow::new(config)),
            FlowKind::Tv => FlowPlugin::Show(ShowFlow::new(config)),
        }
    }

    pub fn kind(&self) -> FlowKind {
        match self {
            FlowPlugin::Default(_) => FlowKind::Default,
            FlowPlugin::Movie(_) => FlowKind::Movies,
            FlowPlugin::Show(_) => FlowKind::Tv,
        }
    }

    /// Whether this flow owns the download.
    pub fn filter(&self, download: &Download) -> bool {
        match self {
            FlowPlugin::Default(flow) => flow.filter(download),
            FlowPlugin::Movie(flow) => flow.filter(download),
            FlowPlugin::Show(flow) => flow.filter(download),
        }
    }

    /// Source to destination rules for an owned download.
    pub fn map_files(&self, download: &Download) -> Vec<MappingRule> {
        match self {
            FlowPlugin::Default(flow) => flow.map_files(download),
            FlowPlugin::Movie(flow) => flow.map_files(download),
            FlowPlugin::Show(flow) => flow.map_files(download),
        }
    }

    /// Human readable content label, used for reporting only.
    pub fn category(&self) -> &'static str {
        match self {
            FlowPlugin::Default(_) => "uncategorised download",
            FlowPlugin::Movie(_) => "movie",
            FlowPlugin::Show(_) => "show",
        }
    }

    pub fn download_dir_tag(&self) -> &str {
        match self {
            FlowPlugin::Default(flow) => &flow.download_dir_tag,
            FlowPlugin::Movie(flow) => &flow.download_dir_tag,
            FlowPlugin::Show(flow) => &flow.download_dir_tag,
        }
    }
}
