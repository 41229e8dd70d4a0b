//! Main video selection and subtitle sidecar placement.
//!
//! Media servers only pick up subtitles that sit next to the video file.
//! Releases often ship subtitles in a `Subs/` folder instead, so a copy of the
//! most suitable subtitle(s) is placed beside the main video in addition to
//! forwarding every subtitle to its mirrored path.

use tracing::debug;

use crate::download::{Download, DownloadFile};

use super::classify::{extension, file_name, is_subtitle, is_video, parent_dir};
use super::subtitle::{best_subtitle, SubtitleCandidate};
use super::types::MappingRule;

/// Largest video file of the download; ties go to the first enumerated.
pub fn select_main_video(files: &[DownloadFile]) -> Option<&DownloadFile> {
    files
        .iter()
        .filter(|f| is_video(&f.relative_path))
        .fold(None, |best: Option<&DownloadFile>, file| match best {
            Some(current) if current.size_bytes >= file.size_bytes => Some(current),
            _ => Some(file),
        })
}

/// Map a single-feature download (a movie or an episode) below `destination_root`.
///
/// Produces, in order: the main video, every subtitle at its mirrored path,
/// then any sidecar copies. Files that are neither video nor subtitle are
/// dropped. `destination_root` is expected to end with `/`.
pub fn map_single_video_with_subtitles(
    download: &Download,
    destination_root: &str,
) -> Vec<MappingRule> {
    let source = download.source_directory.as_str();
    let subtitles: Vec<SubtitleCandidate<'_>> = download
        .files
        .iter()
        .filter(|f| is_subtitle(&f.relative_path))
        .map(|f| SubtitleCandidate::new(source, f))
        .collect();

    let mut rules = Vec::new();
    let main_video = select_main_video(&download.files);

    if let Some(video) = main_video {
        rules.push(forward(source, &video.relative_path, destination_root));
    }

    rules.extend(
        subtitles
            .iter()
            .map(|s| forward(source, s.relative_path(), destination_root)),
    );

    if let Some(video) = main_video {
        let video_dir = parent_dir(&video.relative_path);
        let sidecars = resolve_sidecars(&subtitles, video_dir);
        debug!(
            download_id = download.id,
            video = %video.relative_path,
            sidecars = sidecars.len(),
            "resolved subtitle sidecars"
        );
        rules.extend(
            sidecars
                .into_iter()
                .map(|s| sidecar(source, s.relative_path(), video_dir, destination_root)),
        );
    }

    rules
}

/// Pick the subtitles that must additionally be copied into `video_dir`.
fn resolve_sidecars<'a>(
    subtitles: &[SubtitleCandidate<'a>],
    video_dir: &str,
) -> Vec<SubtitleCandidate<'a>> {
    if subtitles
        .iter()
        .any(|s| parent_dir(s.relative_path()) == video_dir)
    {
        return Vec::new();
    }

    let is_vobsub_part = |s: &SubtitleCandidate<'_>| {
        let ext = extension(s.relative_path());
        ext == "idx" || ext == "sub"
    };
    let has_idx = subtitles.iter().any(|s| extension(s.relative_path()) == "idx");
    let has_sub = subtitles.iter().any(|s| extension(s.relative_path()) == "sub");

    if has_idx && has_sub {
        return subtitles.iter().copied().filter(is_vobsub_part).collect();
    }

    best_subtitle(subtitles).into_iter().collect()
}

fn forward(source_directory: &str, relative_path: &str, destination_root: &str) -> MappingRule {
    MappingRule::new(
        source_directory,
        relative_path,
        format!("{}{}", destination_root, relative_path),
    )
}

fn sidecar(
    source_directory: &str,
    relative_path: &str,
    video_dir: &str,
    destination_root: &str,
) -> MappingRule {
    let name = file_name(relative_path);
    let destination = if video_dir.is_empty() {
        format!("{}{}", destination_root, name)
    } else {
        format!("{}{}/{}", destination_root, video_dir, name)
    };
    MappingRule::new(source_directory, relative_path, destination)
}
